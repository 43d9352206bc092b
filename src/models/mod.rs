pub mod blog;
pub mod contributions;
pub mod fetch;
pub mod github;
