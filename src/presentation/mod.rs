pub mod app_module;
pub mod handlers;
