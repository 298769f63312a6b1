// dtos/gigdtos.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::gigmodel::Gig;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGigDto {
    #[validate(length(min = 5, max = 255, message = "Title must be 5 to 255 characters"))]
    pub title: String,

    #[validate(length(min = 20, message = "Description must be at least 20 characters"))]
    pub description: String,

    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,

    #[validate(range(min = 1.0, message = "Price must be at least 1 USD"))]
    pub price: f64,

    #[validate(url(message = "Cover must be a URL"))]
    pub cover: String,

    #[serde(default)]
    pub images: Vec<String>,

    #[validate(length(min = 1, max = 255))]
    pub short_title: String,

    #[validate(length(min = 1, max = 500))]
    pub short_desc: String,

    #[validate(range(min = 1, max = 365, message = "Delivery time is in days (1 to 365)"))]
    pub delivery_time: i32,

    #[validate(range(min = 0, max = 100))]
    pub revision_number: i32,

    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GigSort {
    #[default]
    CreatedAt,
    Sales,
    Price,
}

#[derive(Debug, Clone, Deserialize, Validate, Default)]
pub struct GigQueryDto {
    pub user_id: Option<Uuid>,
    pub cat: Option<String>,
    #[validate(range(min = 0.0))]
    pub min: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max: Option<f64>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: GigSort,
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GigDto {
    #[serde(flatten)]
    pub gig: Gig,
    pub average_rating: Option<f64>,
}

impl GigDto {
    pub fn from_gig(gig: Gig) -> Self {
        let average_rating = gig.average_rating();
        GigDto {
            gig,
            average_rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gig_dto() -> CreateGigDto {
        CreateGigDto {
            title: "I will design your logo".to_string(),
            description: "Professional logo design with three concepts.".to_string(),
            category: "design".to_string(),
            price: 25.0,
            cover: "https://cdn.example.com/cover.png".to_string(),
            images: vec![],
            short_title: "Logo design".to_string(),
            short_desc: "Three concepts, two revisions".to_string(),
            delivery_time: 3,
            revision_number: 2,
            features: vec!["source files".to_string()],
        }
    }

    #[test]
    fn test_valid_gig() {
        assert!(gig_dto().validate().is_ok());
    }

    #[test]
    fn test_rejects_free_gig_and_bad_cover() {
        let mut body = gig_dto();
        body.price = 0.0;
        assert!(body.validate().is_err());

        let mut body = gig_dto();
        body.cover = "not a url".to_string();
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_query_defaults() {
        let query: GigQueryDto = serde_json::from_str("{}").unwrap();
        assert_eq!(query.sort, GigSort::CreatedAt);
        assert!(query.validate().is_ok());
    }
}
