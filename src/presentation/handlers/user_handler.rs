use std::sync::Arc;

use crate::{
    domain::{error::DomainError, models::user::User, repositories::user_repository::UserRepository},
    usecase::register_user_usecase::RegisterUserUsecase,
};
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize};

// Request

/// json for register request
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub nickname: String,
    pub username: String,
    pub password: String,
}

// Response

/// json for a created user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub nickname: String,
    pub password: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id().as_i32(),
            username: user.username().to_string(),
            nickname: user.nickname().to_string(),
            password: user.password().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/* Router Function and Handler Function */

// User Router

/// function return Router object
/// Suppose to be merged into the application router
pub fn create_user_router<U: UserRepository + Send + Sync + 'static + Clone>(
    register_service: RegisterUserUsecase<U>,
) -> Router {
    let state = AppState {
        register_service: Arc::new(register_service),
    };

    Router::new()
        .route("/user", post(register::<U>))
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState<U: UserRepository> {
    pub register_service: Arc<RegisterUserUsecase<U>>,
}

// handler function

/// handler function for register
async fn register<U: UserRepository + Send + Sync>(
    State(state): State<AppState<U>>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    match state
        .register_service
        .register(payload.username, payload.nickname, payload.password)
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(UserResponse::from(user))).into_response(),
        Err(e @ (DomainError::DuplicateUsername | DomainError::DuplicateNickname)) => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "registration failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal server error")),
            )
                .into_response()
        }
    }
}
