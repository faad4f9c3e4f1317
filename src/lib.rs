pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod usecase;
