use crate::domain::{
    error::RepositoryError,
    models::user::{NewUser, User},
};
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository {
    /// `Ok(false)` when no user has this exact username.
    async fn exists_by_username(&self, username: &str) -> Result<bool, RepositoryError>;
    /// `Ok(false)` when no user has this exact nickname.
    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool, RepositoryError>;
    async fn save(&self, user: NewUser) -> Result<User, RepositoryError>;
}
