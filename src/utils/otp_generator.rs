// utils/otp_generator.rs
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Lifetime of an issued registration code.
pub const OTP_TTL_MINUTES: i64 = 10;

pub fn generate_otp() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(0..1_000_000))
}

pub fn generate_salt() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

pub fn hash_otp(otp: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(otp.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time check of a submitted code against the stored salted hash.
pub fn otp_matches(candidate: &str, salt: &str, stored_hash: &str) -> bool {
    let candidate_hash = hash_otp(candidate, salt);
    candidate_hash.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_is_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_otp_matches_only_same_code_and_salt() {
        let salt = generate_salt();
        let stored = hash_otp("123456", &salt);
        assert!(otp_matches("123456", &salt, &stored));
        assert!(otp_matches(" 123456 ", &salt, &stored));
        assert!(!otp_matches("123457", &salt, &stored));
        assert!(!otp_matches("123456", &generate_salt(), &stored));
    }

    #[test]
    fn test_hash_never_contains_plain_code() {
        let stored = hash_otp("424242", "salt");
        assert!(!stored.contains("424242"));
        assert_eq!(stored.len(), 64);
    }
}
