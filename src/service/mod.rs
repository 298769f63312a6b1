pub mod checkout_service;
pub mod error;
pub mod notification_service;
pub mod payment_provider;
pub mod registration_service;
