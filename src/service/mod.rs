pub mod auth;
pub mod catch_up;
pub mod crypto;
pub mod group;
pub mod identity;
pub mod log;
pub mod oauth_state;
pub mod recurrence;
pub mod ride;
pub mod user;
