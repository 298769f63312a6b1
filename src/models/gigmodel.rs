// models/gigmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Gig {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    /// USD.
    pub price: f64,
    pub cover: String,
    pub images: Vec<String>,
    pub short_title: String,
    pub short_desc: String,
    pub delivery_time: i32,
    pub revision_number: i32,
    pub features: Vec<String>,
    pub sales: i32,
    pub sales_revenue: f64,
    pub total_stars: i32,
    pub star_number: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Gig {
    pub fn average_rating(&self) -> Option<f64> {
        if self.star_number == 0 {
            None
        } else {
            Some(self.total_stars as f64 / self.star_number as f64)
        }
    }
}

pub const GIG_COLUMNS: &str = r#"
    id, user_id, title, description, category, price, cover, images,
    short_title, short_desc, delivery_time, revision_number, features,
    sales, sales_revenue, total_stars, star_number, created_at, updated_at
"#;
