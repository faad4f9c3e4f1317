use crate::domain::{
    error::{DomainError, RepositoryError},
    models::user::{NewUser, User},
    repositories::user_repository::UserRepository,
};

pub struct RegisterUserUsecase<U: UserRepository> {
    user_repository: U,
}

impl<U: UserRepository> RegisterUserUsecase<U> {
    pub fn new(user_repository: U) -> Self {
        Self { user_repository }
    }

    /// Register a new user.
    ///
    /// The username is checked before the nickname, so a request colliding on
    /// both always reports `DuplicateUsername`.
    pub async fn register(
        &self,
        username: String,
        nickname: String,
        password: String,
    ) -> Result<User, DomainError>
    where
        U: Send + Sync,
    {
        if self.user_repository.exists_by_username(&username).await? {
            tracing::info!(%username, "registration rejected: username taken");
            return Err(DomainError::DuplicateUsername);
        }
        if self.user_repository.exists_by_nickname(&nickname).await? {
            tracing::info!(%nickname, "registration rejected: nickname taken");
            return Err(DomainError::DuplicateNickname);
        }

        // password is stored as given
        let new_user = NewUser::new(username, nickname, password);

        // a concurrent registration may win between the checks and the insert;
        // the unique index then names the column that collided
        let user = self
            .user_repository
            .save(new_user)
            .await
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation { column, message } => {
                    match column.as_deref() {
                        Some("username") => DomainError::DuplicateUsername,
                        Some("nickname") => DomainError::DuplicateNickname,
                        _ => RepositoryError::ConstraintViolation { column, message }.into(),
                    }
                }
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id(), username = user.username(), "user registered");
        Ok(user)
    }
}
