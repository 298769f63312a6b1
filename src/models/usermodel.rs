//1
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "account_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Organization,
    RemoteWorker,
}

impl AccountRole {
    pub fn to_str(&self) -> &str {
        match self {
            AccountRole::Organization => "organization",
            AccountRole::RemoteWorker => "remote_worker",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "account_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountTier {
    Free,
    Vip,
}

impl AccountTier {
    pub fn to_str(&self) -> &str {
        match self {
            AccountTier::Free => "free",
            AccountTier::Vip => "vip",
        }
    }
}

/// Capabilities checked by `role_check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Seller,
    Admin,
    Organization,
    RemoteWorker,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct SocialLinks {
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct OrganizationProfile {
    pub name: String,
    pub registration_number: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub social_links: SocialLinks,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct NextOfKin {
    pub name: String,
    pub relationship: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LastCharge {
    pub amount: f64,
    pub currency: String,
    pub charged_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct VipSubscription {
    pub active: bool,
    pub gateway: Option<String>,
    pub payment_reference: Option<String>,
    pub last_charge: Option<LastCharge>,
    #[serde(skip_serializing)]
    pub card_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: uuid::Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub is_seller: bool,
    pub is_admin: bool,
    pub is_verified: bool,
    pub role: Option<AccountRole>,
    pub tier: Option<AccountTier>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub img: Option<String>,
    pub description: Option<String>,
    pub organization: Option<Json<OrganizationProfile>>,
    pub next_of_kin: Option<Json<NextOfKin>>,
    pub vip_subscription: Option<Json<VipSubscription>>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has(&self, permission: Permission) -> bool {
        match permission {
            Permission::Seller => self.is_seller,
            Permission::Admin => self.is_admin,
            Permission::Organization => self.role == Some(AccountRole::Organization),
            Permission::RemoteWorker => self.role == Some(AccountRole::RemoteWorker),
        }
    }
}

/// Columns selected for every `User` query.
pub const USER_COLUMNS: &str = r#"
    id, username, email, password,
    is_seller, is_admin, is_verified,
    role, tier, country, phone, img, description,
    organization, next_of_kin, vip_subscription,
    created_at, updated_at
"#;
