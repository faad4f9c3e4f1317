use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;

use crate::{
    domain::repositories::user_repository::UserRepository,
    infrastructure::user_repository::SeaOrmUserRepository,
    presentation::handlers::user_handler::create_user_router,
    usecase::register_user_usecase::RegisterUserUsecase,
};

/// Wiring root of the application.
///
/// Owns the stores every route depends on. A store can be swapped out before
/// the router is built, which is how tests point the whole application at a
/// single open transaction.
pub struct AppModule<U> {
    user_repository: U,
}

impl AppModule<SeaOrmUserRepository> {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repository: SeaOrmUserRepository::new(db),
        }
    }
}

impl<U> AppModule<U>
where
    U: UserRepository + Send + Sync + 'static + Clone,
{
    /// Replace the user store, keeping the rest of the wiring.
    pub fn override_user_repository<V>(self, user_repository: V) -> AppModule<V>
    where
        V: UserRepository + Send + Sync + 'static + Clone,
    {
        AppModule { user_repository }
    }

    pub fn user_repository(&self) -> &U {
        &self.user_repository
    }

    pub fn into_router(self) -> Router {
        let register_user_usecase = RegisterUserUsecase::new(self.user_repository);

        Router::new()
            .merge(create_user_router(register_user_usecase))
            .layer(TraceLayer::new_for_http())
    }
}
