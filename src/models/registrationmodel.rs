// models/registrationmodel.rs
use serde::{Deserialize, Serialize};

use super::usermodel::{AccountRole, AccountTier, NextOfKin, OrganizationProfile, User};

/// Wrong codes allowed per issued OTP before the signup is discarded.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

/// An unverified signup waiting for its OTP. Never written to PostgreSQL.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PendingRegistration {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub role: Option<AccountRole>,
    pub tier: Option<AccountTier>,
    pub is_seller: bool,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<OrganizationProfile>,
    pub next_of_kin: Option<NextOfKin>,
    pub hashed_otp: String,
    pub otp_salt: String,
    /// Epoch milliseconds.
    pub otp_expires: i64,
    /// Wrong codes submitted against the current OTP.
    #[serde(default)]
    pub failed_attempts: u32,
}

impl PendingRegistration {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.otp_expires
    }

    /// Counts a wrong code; true once the attempt budget is spent.
    pub fn record_failed_attempt(&mut self) -> bool {
        self.failed_attempts += 1;
        self.failed_attempts >= MAX_OTP_ATTEMPTS
    }
}

/// Data handed to the user store once an OTP checks out.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub is_seller: bool,
    pub role: Option<AccountRole>,
    pub tier: Option<AccountTier>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<OrganizationProfile>,
    pub next_of_kin: Option<NextOfKin>,
}

impl From<PendingRegistration> for NewUser {
    fn from(pending: PendingRegistration) -> Self {
        // Tier only applies to remote workers.
        let tier = match pending.role {
            Some(AccountRole::RemoteWorker) => Some(pending.tier.unwrap_or(AccountTier::Free)),
            _ => None,
        };

        NewUser {
            username: pending.username,
            email: pending.email,
            hashed_password: pending.hashed_password,
            is_seller: pending.is_seller,
            role: pending.role,
            tier,
            country: pending.country,
            phone: pending.phone,
            organization: pending.organization,
            next_of_kin: pending.next_of_kin,
        }
    }
}

/// Account category used to pick welcome-email content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCategory {
    Organization,
    RemoteWorker(AccountTier),
    Admin,
    Seller,
    General,
}

impl AccountCategory {
    pub fn of(user: &User) -> Self {
        match user.role {
            Some(AccountRole::Organization) => AccountCategory::Organization,
            Some(AccountRole::RemoteWorker) => {
                AccountCategory::RemoteWorker(user.tier.unwrap_or(AccountTier::Free))
            }
            None if user.is_admin => AccountCategory::Admin,
            None if user.is_seller => AccountCategory::Seller,
            None => AccountCategory::General,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(role: Option<AccountRole>, tier: Option<AccountTier>) -> PendingRegistration {
        PendingRegistration {
            username: "ada".to_string(),
            email: "ada@x.com".to_string(),
            hashed_password: "hash".to_string(),
            role,
            tier,
            is_seller: false,
            country: None,
            phone: None,
            organization: None,
            next_of_kin: None,
            hashed_otp: "h".to_string(),
            otp_salt: "s".to_string(),
            otp_expires: 1_000,
            failed_attempts: 0,
        }
    }

    #[test]
    fn test_tier_dropped_for_non_remote_workers() {
        let user: NewUser = pending(Some(AccountRole::Organization), Some(AccountTier::Vip)).into();
        assert_eq!(user.tier, None);

        let user: NewUser = pending(None, Some(AccountTier::Vip)).into();
        assert_eq!(user.tier, None);
    }

    #[test]
    fn test_remote_worker_defaults_to_free_tier() {
        let user: NewUser = pending(Some(AccountRole::RemoteWorker), None).into();
        assert_eq!(user.tier, Some(AccountTier::Free));

        let user: NewUser = pending(Some(AccountRole::RemoteWorker), Some(AccountTier::Vip)).into();
        assert_eq!(user.tier, Some(AccountTier::Vip));
    }

    #[test]
    fn test_attempt_budget() {
        let mut entry = pending(None, None);
        for _ in 1..MAX_OTP_ATTEMPTS {
            assert!(!entry.record_failed_attempt());
        }
        assert!(entry.record_failed_attempt());
    }

    #[test]
    fn test_entries_stored_before_attempt_counting_still_load() {
        let mut json = serde_json::to_value(pending(None, None)).unwrap();
        json.as_object_mut().unwrap().remove("failed_attempts");
        let entry: PendingRegistration = serde_json::from_value(json).unwrap();
        assert_eq!(entry.failed_attempts, 0);
    }

    #[test]
    fn test_expiry_is_strictly_after_deadline() {
        let entry = pending(None, None);
        assert!(!entry.is_expired(1_000));
        assert!(entry.is_expired(1_001));
    }
}
