use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("username already exists")]
    DuplicateUsername,

    #[error("nickname already exists")]
    DuplicateNickname,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The database rejected a write on a unique constraint.
    /// `column` is the collided column when the driver message names it.
    #[error("Constraint violation: {message}")]
    ConstraintViolation {
        column: Option<String>,
        message: String,
    },

    #[error("Database error: {0}")]
    DatabaseError(String),
}
