// dtos/orderdtos.rs
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CompleteOrderDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5 stars"))]
    pub star: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentIntentResponseDto {
    pub status: String,
    pub payment_url: String,
    pub reference: String,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SellerDashboardDto {
    pub gig_count: i64,
    pub total_sales: i64,
    pub gross_revenue: f64,
    pub monthly_revenue: f64,
    pub monthly_platform_fee: f64,
    pub monthly_earnings: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AdminDashboardDto {
    pub user_count: i64,
    pub seller_count: i64,
    pub gig_count: i64,
    pub order_count: i64,
    pub monthly_revenue: f64,
    pub monthly_earnings: f64,
}
