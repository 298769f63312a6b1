//3
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::usermodel::{
    AccountRole, AccountTier, NextOfKin, OrganizationProfile, User, VipSubscription,
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[validate(schema(function = "validate_registration_role"))]
pub struct RegisterUserDto {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    pub username: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,

    pub role: Option<AccountRole>,
    pub tier: Option<AccountTier>,
    #[serde(default)]
    pub is_seller: bool,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<OrganizationProfile>,
    pub next_of_kin: Option<NextOfKin>,
}

fn validate_registration_role(dto: &RegisterUserDto) -> Result<(), ValidationError> {
    if dto.role == Some(AccountRole::Organization) {
        let has_name = dto
            .organization
            .as_ref()
            .map(|org| !org.name.trim().is_empty())
            .unwrap_or(false);
        if !has_name {
            let mut err = ValidationError::new("organization_required");
            err.message = Some("Organization name is required for organization accounts".into());
            return Err(err);
        }
    }

    if dto.tier.is_some() && dto.role != Some(AccountRole::RemoteWorker) {
        let mut err = ValidationError::new("tier_requires_remote_worker");
        err.message = Some("Tier only applies to remote_worker accounts".into());
        return Err(err);
    }

    Ok(())
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpDto {
    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct ResendOtpDto {
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProfileDto {
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(url(message = "Image must be a URL"))]
    pub img: Option<String>,
    #[validate(length(min = 5, max = 50))]
    pub phone: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub country: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_seller: bool,
    pub is_admin: bool,
    pub is_verified: bool,
    pub role: Option<String>,
    pub tier: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub img: Option<String>,
    pub description: Option<String>,
    pub organization: Option<OrganizationProfile>,
    pub next_of_kin: Option<NextOfKin>,
    pub vip_subscription: Option<VipSubscription>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            is_seller: user.is_seller,
            is_admin: user.is_admin,
            is_verified: user.is_verified,
            role: user.role.map(|r| r.to_str().to_string()),
            tier: user.tier.map(|t| t.to_str().to_string()),
            country: user.country.clone(),
            phone: user.phone.clone(),
            img: user.img.clone(),
            description: user.description.clone(),
            organization: user.organization.as_ref().map(|o| o.0.clone()),
            next_of_kin: user.next_of_kin.as_ref().map(|n| n.0.clone()),
            vip_subscription: user.vip_subscription.as_ref().map(|v| v.0.clone()),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

/// What other users may see about an account.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUserDto {
    pub id: String,
    pub username: String,
    pub img: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub is_seller: bool,
    pub role: Option<String>,
    pub organization_name: Option<String>,
}

impl PublicUserDto {
    pub fn from_user(user: &User) -> Self {
        PublicUserDto {
            id: user.id.to_string(),
            username: user.username.clone(),
            img: user.img.clone(),
            description: user.description.clone(),
            country: user.country.clone(),
            is_seller: user.is_seller,
            role: user.role.map(|r| r.to_str().to_string()),
            organization_name: user.organization.as_ref().map(|o| o.0.name.clone()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub status: String,
    pub users: Vec<FilterUserDto>,
    pub results: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> RegisterUserDto {
        RegisterUserDto {
            username: "ada".to_string(),
            email: "a@x.com".to_string(),
            password: "password1".to_string(),
            password_confirm: "password1".to_string(),
            role: None,
            tier: None,
            is_seller: false,
            country: None,
            phone: None,
            organization: None,
            next_of_kin: None,
        }
    }

    #[test]
    fn test_plain_registration_is_valid() {
        assert!(dto().validate().is_ok());
    }

    #[test]
    fn test_password_mismatch_is_rejected() {
        let mut body = dto();
        body.password_confirm = "different".to_string();
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_organization_requires_profile() {
        let mut body = dto();
        body.role = Some(AccountRole::Organization);
        assert!(body.validate().is_err());

        body.organization = Some(OrganizationProfile {
            name: "Acme Ltd".to_string(),
            ..Default::default()
        });
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_tier_requires_remote_worker() {
        let mut body = dto();
        body.tier = Some(AccountTier::Vip);
        assert!(body.validate().is_err());

        body.role = Some(AccountRole::RemoteWorker);
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_register_dto_parses_camel_case_confirm() {
        let json = r#"{
            "username": "ada",
            "email": "a@x.com",
            "password": "password1",
            "passwordConfirm": "password1",
            "role": "remote_worker",
            "tier": "vip"
        }"#;
        let body: RegisterUserDto = serde_json::from_str(json).unwrap();
        assert_eq!(body.role, Some(AccountRole::RemoteWorker));
        assert_eq!(body.tier, Some(AccountTier::Vip));
        assert!(!body.is_seller);
    }
}
