// db/fixtures.rs
//! Seed helpers for the `#[sqlx::test]` cases. Each test gets a fresh
//! database with the migrations applied.
use uuid::Uuid;

use super::{db::DBClient, gigdb::GigExt, userdb::UserExt};
use crate::{
    dtos::gigdtos::CreateGigDto,
    models::{gigmodel::Gig, registrationmodel::NewUser, usermodel::User},
};

pub fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@gighub.test", username),
        hashed_password: "$argon2id$placeholder".to_string(),
        is_seller: true,
        role: None,
        tier: None,
        country: Some("Nigeria".to_string()),
        phone: None,
        organization: None,
        next_of_kin: None,
    }
}

pub async fn seed_user(db: &DBClient, username: &str) -> User {
    db.save_user(new_user(username)).await.unwrap()
}

pub fn gig_body(title: &str, category: &str, price: f64) -> CreateGigDto {
    CreateGigDto {
        title: title.to_string(),
        description: format!("{} for small businesses", title),
        category: category.to_string(),
        price,
        cover: "https://cdn.gighub.test/cover.png".to_string(),
        images: vec!["https://cdn.gighub.test/1.png".to_string()],
        short_title: title.to_string(),
        short_desc: "Fast turnaround".to_string(),
        delivery_time: 3,
        revision_number: 2,
        features: vec!["Source files".to_string()],
    }
}

pub async fn seed_gig(db: &DBClient, owner: Uuid, title: &str, category: &str, price: f64) -> Gig {
    db.create_gig(owner, gig_body(title, category, price))
        .await
        .unwrap()
}
