// service/registration_service.rs
//! Email-verified signup: register, verify the emailed code, or resend it.
use std::sync::Arc;

use chrono::Utc;

use super::{
    error::RegistrationError,
    notification_service::{EmailJob, Outbox},
};
use crate::{
    db::{
        pendingdb::PendingRegistrationStore,
        userdb::{UserExt, USERNAME_CONSTRAINT},
    },
    dtos::userdtos::RegisterUserDto,
    error::{is_unique_violation, unique_violation_constraint},
    models::{
        registrationmodel::{AccountCategory, NewUser, PendingRegistration, MAX_OTP_ATTEMPTS},
        usermodel::User,
    },
    utils::{
        otp_generator::{generate_otp, generate_salt, hash_otp, otp_matches, OTP_TTL_MINUTES},
        password,
    },
};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn otp_deadline_ms() -> i64 {
    Utc::now().timestamp_millis() + OTP_TTL_MINUTES * 60 * 1000
}

#[derive(Clone)]
pub struct RegistrationService {
    users: Arc<dyn UserExt + Send + Sync>,
    pending: Arc<dyn PendingRegistrationStore>,
    outbox: Arc<dyn Outbox>,
}

impl RegistrationService {
    pub fn new(
        users: Arc<dyn UserExt + Send + Sync>,
        pending: Arc<dyn PendingRegistrationStore>,
        outbox: Arc<dyn Outbox>,
    ) -> Self {
        Self {
            users,
            pending,
            outbox,
        }
    }

    /// Stores the signup as pending and emails a fresh code. A repeated
    /// submission for the same email replaces the earlier one.
    pub async fn register(&self, body: RegisterUserDto) -> Result<(), RegistrationError> {
        let email = normalize_email(&body.email);

        if self.users.get_user(None, None, Some(&email)).await?.is_some() {
            return Err(RegistrationError::EmailInUse);
        }
        if self
            .users
            .get_user(None, Some(body.username.trim()), None)
            .await?
            .is_some()
        {
            return Err(RegistrationError::UsernameInUse);
        }

        let hashed_password =
            password::hash(body.password.as_str()).map_err(RegistrationError::Hashing)?;

        let otp = generate_otp();
        let otp_salt = generate_salt();

        let entry = PendingRegistration {
            username: body.username.trim().to_string(),
            email: email.clone(),
            hashed_password,
            role: body.role,
            tier: body.tier,
            is_seller: body.is_seller,
            country: body.country,
            phone: body.phone,
            organization: body.organization,
            next_of_kin: body.next_of_kin,
            hashed_otp: hash_otp(&otp, &otp_salt),
            otp_salt,
            otp_expires: otp_deadline_ms(),
            failed_attempts: 0,
        };

        self.pending.put(&entry).await?;

        self.outbox.enqueue(EmailJob::Otp {
            email: email.clone(),
            username: entry.username.clone(),
            otp,
        });

        tracing::info!("Pending registration stored for {}", email);
        Ok(())
    }

    /// Checks the code and, on success, creates the verified user.
    pub async fn verify(&self, email: &str, otp: &str) -> Result<User, RegistrationError> {
        let email = normalize_email(email);

        let entry = self
            .pending
            .get(&email)
            .await?
            .ok_or(RegistrationError::NoPendingRegistration)?;

        if entry.is_expired(Utc::now().timestamp_millis()) {
            self.pending.remove(&email).await?;
            tracing::warn!("Expired verification code used for {}", email);
            return Err(RegistrationError::OtpExpired);
        }

        if !otp_matches(otp, &entry.otp_salt, &entry.hashed_otp) {
            let mut entry = entry;
            if entry.record_failed_attempt() {
                self.pending.remove(&email).await?;
                tracing::warn!("Attempt budget spent for {}, pending signup dropped", email);
                return Err(RegistrationError::TooManyAttempts);
            }
            self.pending.put(&entry).await?;
            tracing::warn!(
                "Invalid verification code for {} ({} of {})",
                email,
                entry.failed_attempts,
                MAX_OTP_ATTEMPTS
            );
            return Err(RegistrationError::InvalidOtp);
        }

        let user = match self.users.save_user(NewUser::from(entry)).await {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                self.pending.remove(&email).await?;
                return Err(match unique_violation_constraint(&e) {
                    Some(USERNAME_CONSTRAINT) => RegistrationError::UsernameInUse,
                    _ => RegistrationError::EmailInUse,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self.pending.remove(&email).await {
            tracing::error!("User {} created but pending entry not removed: {}", user.id, e);
        }

        self.outbox.enqueue(EmailJob::Welcome {
            email: user.email.clone(),
            username: user.username.clone(),
            category: AccountCategory::of(&user),
        });

        tracing::info!("User {} verified and created", user.id);
        Ok(user)
    }

    /// Issues a new code for a pending signup. Only the code fields change.
    pub async fn resend(&self, email: &str) -> Result<(), RegistrationError> {
        let email = normalize_email(email);

        let mut entry = self
            .pending
            .get(&email)
            .await?
            .ok_or(RegistrationError::NoPendingRegistration)?;

        let otp = generate_otp();
        entry.otp_salt = generate_salt();
        entry.hashed_otp = hash_otp(&otp, &entry.otp_salt);
        entry.otp_expires = otp_deadline_ms();
        entry.failed_attempts = 0;

        self.pending.put(&entry).await?;

        self.outbox.enqueue(EmailJob::Otp {
            email: email.clone(),
            username: entry.username.clone(),
            otp,
        });

        tracing::info!("Verification code re-issued for {}", email);
        Ok(())
    }
}
