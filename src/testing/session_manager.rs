//! Transaction-per-test isolation over one shared database connection.
//!
//! ```ignore
//! let mut manager = SessionManager::from_env();
//! manager.initialize().await?;
//!
//! // per test case
//! manager.start().await?;
//! let module = AppModule::new(manager.connection()?.clone());
//! let app = manager.inject_repositories(module)?.into_router();
//! // ... drive `app`, then drop it ...
//! manager.end().await?;
//! ```

use std::sync::Arc;

use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait,
};
use thiserror::Error;

use crate::{
    domain::repositories::user_repository::UserRepository,
    infrastructure::{schema::sync_schema, user_repository::SeaOrmUserRepository},
    presentation::app_module::AppModule,
};

pub const DEFAULT_TEST_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session manager is not initialized")]
    NotInitialized,

    #[error("No active transaction: call start() first")]
    NoActiveTransaction,

    #[error("A transaction is already active: call end() first")]
    AlreadyStarted,

    /// Rollback needs sole ownership of the transaction.
    #[error("Transaction is still held by {0} bound store(s)")]
    SessionInUse(usize),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Idle,
    InTransaction,
}

/// User store bound to the manager's open transaction.
pub type SessionUserRepository = SeaOrmUserRepository<DatabaseTransaction>;

/// Hands every test its own transaction on a single physical connection and
/// rolls it back afterwards, so nothing a test writes outlives it.
///
/// Not meant to be shared by tests running concurrently: `start` and `end`
/// must alternate.
pub struct SessionManager {
    url: String,
    db: Option<DatabaseConnection>,
    session: Option<Arc<DatabaseTransaction>>,
}

impl SessionManager {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            db: None,
            session: None,
        }
    }

    /// Use `TEST_DATABASE_URL`, falling back to an in-memory SQLite database.
    pub fn from_env() -> Self {
        let url = dotenvy::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string());
        Self::new(url)
    }

    pub fn state(&self) -> SessionState {
        match (&self.db, &self.session) {
            (None, _) => SessionState::Uninitialized,
            (Some(_), None) => SessionState::Idle,
            (Some(_), Some(_)) => SessionState::InTransaction,
        }
    }

    /// Open the physical connection and make sure the schema exists.
    /// Calling it again is a no-op.
    pub async fn initialize(&mut self) -> Result<&mut Self, SessionError> {
        if self.db.is_none() {
            self.db = Some(self.connect().await?);
        }
        Ok(self)
    }

    /// Begin a fresh transaction on the shared connection.
    pub async fn start(&mut self) -> Result<&mut Self, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyStarted);
        }

        let db = match self.db.take() {
            Some(db) => db,
            None => self.connect().await?,
        };
        let txn = db.begin().await;
        self.db = Some(db);

        self.session = Some(Arc::new(txn?));
        tracing::debug!("test transaction started");
        Ok(self)
    }

    /// Roll back the active transaction and release it. The connection stays
    /// open for the next `start`.
    ///
    /// Every store or router bound through this manager must be dropped
    /// first; otherwise this fails with `SessionInUse` and the transaction
    /// stays active.
    pub async fn end(&mut self) -> Result<&mut Self, SessionError> {
        let session = self
            .session
            .take()
            .ok_or(SessionError::NoActiveTransaction)?;

        match Arc::try_unwrap(session) {
            Ok(txn) => {
                txn.rollback().await?;
                tracing::debug!("test transaction rolled back");
                Ok(self)
            }
            Err(session) => {
                let holders = Arc::strong_count(&session) - 1;
                self.session = Some(session);
                Err(SessionError::SessionInUse(holders))
            }
        }
    }

    /// The pooled connection. Only use it outside a transaction: the pool
    /// holds a single connection, which `start` lends to the transaction.
    pub fn connection(&self) -> Result<&DatabaseConnection, SessionError> {
        self.db.as_ref().ok_or(SessionError::NotInitialized)
    }

    /// User store whose every query runs inside the active transaction.
    pub fn user_repository(&self) -> Result<SessionUserRepository, SessionError> {
        let session = self
            .session
            .as_ref()
            .ok_or(SessionError::NoActiveTransaction)?;
        Ok(SeaOrmUserRepository::from_shared(Arc::clone(session)))
    }

    /// Override every managed store of `module` with one bound to the active
    /// transaction.
    pub fn inject_repositories<U>(
        &self,
        module: AppModule<U>,
    ) -> Result<AppModule<SessionUserRepository>, SessionError>
    where
        U: UserRepository + Send + Sync + 'static + Clone,
    {
        Ok(module.override_user_repository(self.user_repository()?))
    }

    /// Roll back anything still open and close the connection.
    pub async fn close(mut self) -> Result<(), SessionError> {
        if self.session.is_some() {
            self.end().await?;
        }
        if let Some(db) = self.db.take() {
            db.close().await?;
        }
        Ok(())
    }

    async fn connect(&self) -> Result<DatabaseConnection, SessionError> {
        let mut opt = ConnectOptions::new(self.url.clone());
        opt.max_connections(1).min_connections(1).sqlx_logging(true);

        let db = Database::connect(opt).await?;
        sync_schema(&db).await?;
        tracing::debug!(url = %self.url, "test connection opened");
        Ok(db)
    }
}
