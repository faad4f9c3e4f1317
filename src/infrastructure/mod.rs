pub mod logging;
pub mod schema;
pub mod user_repository;
