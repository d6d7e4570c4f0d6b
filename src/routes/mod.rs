pub mod auth;
pub mod group;
pub mod menu;
pub mod user;
