use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, SqlErr,
};

use crate::domain::{
    error::RepositoryError,
    models::user::{NewUser, User, UserId},
    repositories::user_repository::UserRepository,
};
use entity::users;

/// Columns carrying a unique constraint on `users`.
const UNIQUE_COLUMNS: [&str; 2] = ["username", "nickname"];

/// User store on top of any sea-orm connection.
///
/// Production code binds it to the pool (`DatabaseConnection`); tests bind it
/// to an open `DatabaseTransaction` so every query runs inside that transaction.
pub struct SeaOrmUserRepository<C = DatabaseConnection> {
    db: Arc<C>,
}

impl<C> Clone for SeaOrmUserRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl<C: ConnectionTrait> SeaOrmUserRepository<C> {
    pub fn new(db: C) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Bind to a connection that is shared with other holders.
    pub fn from_shared(db: Arc<C>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl<C> UserRepository for SeaOrmUserRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn exists_by_username(&self, username: &str) -> Result<bool, RepositoryError> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(self.db.as_ref())
            .await
            .map_err(into_repository_error)?;
        Ok(count > 0)
    }

    async fn exists_by_nickname(&self, nickname: &str) -> Result<bool, RepositoryError> {
        let count = users::Entity::find()
            .filter(users::Column::Nickname.eq(nickname))
            .count(self.db.as_ref())
            .await
            .map_err(into_repository_error)?;
        Ok(count > 0)
    }

    async fn save(&self, user: NewUser) -> Result<User, RepositoryError> {
        let db = self.db.as_ref();

        let model = match user.id() {
            None => {
                let user_model = users::ActiveModel {
                    id: NotSet,
                    username: Set(user.username().to_string()),
                    nickname: Set(user.nickname().to_string()),
                    password: Set(user.password().to_string()),
                };
                user_model.insert(db).await
            }
            Some(id) => {
                let existing = users::Entity::find_by_id(id.as_i32())
                    .one(db)
                    .await
                    .map_err(into_repository_error)?;

                let user_model = users::ActiveModel {
                    id: Set(id.as_i32()),
                    username: Set(user.username().to_string()),
                    nickname: Set(user.nickname().to_string()),
                    password: Set(user.password().to_string()),
                };
                // upsert by identity
                if existing.is_some() {
                    user_model.update(db).await
                } else {
                    user_model.insert(db).await
                }
            }
        }
        .map_err(into_repository_error)?;

        Ok(User::reconstruct(
            UserId::new(model.id),
            model.username,
            model.nickname,
            model.password,
        ))
    }
}

fn into_repository_error(err: DbErr) -> RepositoryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => RepositoryError::ConstraintViolation {
            column: collided_column(&message).map(|column| column.to_string()),
            message,
        },
        _ => RepositoryError::DatabaseError(err.to_string()),
    }
}

/// Read the collided column out of a driver's unique-violation message.
///
/// MySQL:      `Duplicate entry 'bob' for key 'users.username'`
/// SQLite:     `UNIQUE constraint failed: users.username`
/// PostgreSQL: `duplicate key value violates unique constraint "users_username_key"`
///
/// Only the part naming the key is inspected, since MySQL echoes the
/// offending value before it.
fn collided_column(message: &str) -> Option<&'static str> {
    let key_part = ["for key", "failed:", "constraint \""]
        .iter()
        .find_map(|marker| message.rfind(marker).map(|at| &message[at..]))
        .unwrap_or(message);

    UNIQUE_COLUMNS
        .into_iter()
        .find(|column| key_part.contains(column))
}
