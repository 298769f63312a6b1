// models/ordermodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_gateway", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentGateway {
    Paystack,
    Flutterwave,
}

impl PaymentGateway {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentGateway::Paystack => "paystack",
            PaymentGateway::Flutterwave => "flutterwave",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Order {
    pub id: Uuid,
    pub gig_id: Uuid,
    pub title: String,
    pub img: Option<String>,
    pub price: f64,
    pub currency: String,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub gateway: PaymentGateway,
    pub payment_intent: String,
    pub is_completed: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// A successful charge reported by a gateway, ready to become an order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedCharge {
    pub gateway: PaymentGateway,
    pub reference: String,
    pub gig_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub amount: f64,
    pub currency: String,
}

pub const ORDER_COLUMNS: &str = r#"
    id, gig_id, title, img, price, currency, buyer_id, seller_id,
    gateway, payment_intent, is_completed, created_at, updated_at
"#;
