pub mod auth;
pub mod blog;
pub mod cache;
pub mod contributions;
pub mod database;
pub mod github;
pub mod repos;
