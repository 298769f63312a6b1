pub mod auth;
pub mod chat;
pub mod gigs;
pub mod jobs;
pub mod orders;
pub mod users;
