pub mod auth;
pub mod group;
pub mod ride;
pub mod user;
