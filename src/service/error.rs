use thiserror::Error;
use uuid::Uuid;

use crate::{db::pendingdb::PendingStoreError, error::HttpError, error::ErrorMessage};

/// Failures of the OTP registration flow.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("An account with this email already exists")]
    EmailInUse,

    #[error("This username is already taken")]
    UsernameInUse,

    #[error("No pending registration for this email. Please register again")]
    NoPendingRegistration,

    #[error("Verification code has expired. Please register again")]
    OtpExpired,

    #[error("Invalid verification code")]
    InvalidOtp,

    #[error("Too many invalid codes. Please register again")]
    TooManyAttempts,

    #[error("Pending registration store error: {0}")]
    Store(#[from] PendingStoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Hashing(ErrorMessage),
}

impl From<RegistrationError> for HttpError {
    fn from(error: RegistrationError) -> Self {
        match error {
            RegistrationError::EmailInUse | RegistrationError::UsernameInUse => {
                HttpError::unique_constraint_violation(error.to_string())
            }
            RegistrationError::NoPendingRegistration => HttpError::not_found(error.to_string()),
            RegistrationError::TooManyAttempts => HttpError::too_many_requests(error.to_string()),
            RegistrationError::OtpExpired | RegistrationError::InvalidOtp => {
                HttpError::bad_request(error.to_string())
            }
            RegistrationError::Hashing(ref message) => match message {
                ErrorMessage::ExceededMaxPasswordLength(_) | ErrorMessage::EmptyPassword => {
                    HttpError::bad_request(error.to_string())
                }
                _ => HttpError::server_error(error.to_string()),
            },
            RegistrationError::Database(e) => HttpError::database(e),
            RegistrationError::Store(e) => {
                tracing::error!("Pending store failure: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }
}

/// Failures of the payment intent and webhook pipeline.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Gig {0} not found")]
    GigNotFound(Uuid),

    #[error("You cannot buy your own gig")]
    OwnGigPurchase,

    #[error("{0} is not configured")]
    GatewayNotConfigured(&'static str),

    #[error("{0}")]
    Gateway(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::GigNotFound(_) => HttpError::not_found(error.to_string()),
            ServiceError::OwnGigPurchase | ServiceError::MalformedPayload(_) => {
                HttpError::bad_request(error.to_string())
            }
            ServiceError::InvalidSignature => HttpError::unauthorized(error.to_string()),
            ServiceError::GatewayNotConfigured(_) | ServiceError::Gateway(_) => {
                HttpError::server_error(error.to_string())
            }
            ServiceError::Database(e) => HttpError::database(e),
        }
    }
}
