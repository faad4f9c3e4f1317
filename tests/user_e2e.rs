use std::future::Future;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use rstest::*;
use tower::ServiceExt;
use uuid::Uuid;

use user_api::{
    domain::{models::user::NewUser, repositories::user_repository::UserRepository},
    presentation::{
        app_module::AppModule,
        handlers::user_handler::{ErrorResponse, RegisterRequest, UserResponse},
    },
    testing::session_manager::{SessionManager, SessionState, SessionUserRepository},
};

/// One manager for the whole run: the connection is opened once and every
/// case below borrows it through its own transaction.
#[fixture]
async fn manager() -> SessionManager {
    let mut manager = SessionManager::from_env();
    manager.initialize().await.unwrap();
    manager
}

/// Run `case` inside a fresh transaction and roll it back afterwards.
///
/// The case receives the application wired to the transaction and a store on
/// the same transaction for seeding and assertions. Both are dropped before
/// the rollback.
async fn in_transaction<F, Fut>(manager: &mut SessionManager, case: F)
where
    F: FnOnce(Router, SessionUserRepository) -> Fut,
    Fut: Future<Output = ()>,
{
    manager.start().await.unwrap();
    {
        let module = AppModule::new(manager.connection().unwrap().clone());
        let module = manager.inject_repositories(module).unwrap();
        let user_factory = module.user_repository().clone();
        case(module.into_router(), user_factory).await;
    }
    manager.end().await.unwrap();
    assert_eq!(manager.state(), SessionState::Idle);
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

fn register_request(username: &str, nickname: &str) -> RegisterRequest {
    RegisterRequest {
        nickname: nickname.to_string(),
        username: username.to_string(),
        password: unique("password"),
    }
}

async fn post_user(app: &Router, request: &RegisterRequest) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/user")
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(serde_json::to_string(request).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn seed(user_factory: &SessionUserRepository, username: &str, nickname: &str) {
    user_factory
        .save(NewUser::new(
            username.to_string(),
            nickname.to_string(),
            unique("password"),
        ))
        .await
        .unwrap();
}

async fn error_message(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice::<ErrorResponse>(&bytes).unwrap().message
}

// cases

async fn register_returns_created_user(app: Router, user_factory: SessionUserRepository) {
    let request = RegisterRequest {
        nickname: "alice".to_string(),
        username: "alice1".to_string(),
        password: "p".to_string(),
    };

    let response = post_user(&app, &request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let user: UserResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(user.id > 0);
    assert_eq!(user.username, "alice1");
    assert_eq!(user.nickname, "alice");
    assert_eq!(user.password, "p");

    // persisted inside the test transaction
    assert!(user_factory.exists_by_username("alice1").await.unwrap());
    assert!(user_factory.exists_by_nickname("alice").await.unwrap());
}

async fn duplicated_username_rejected(app: Router, user_factory: SessionUserRepository) {
    seed(&user_factory, "bob1", &unique("nick")).await;

    let response = post_user(&app, &register_request("bob1", &unique("nick"))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "username already exists");
}

async fn duplicated_nickname_rejected(app: Router, user_factory: SessionUserRepository) {
    seed(&user_factory, &unique("user"), "carol").await;

    let response = post_user(&app, &register_request(&unique("user"), "carol")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "nickname already exists");
}

async fn username_checked_before_nickname(app: Router, user_factory: SessionUserRepository) {
    seed(&user_factory, "dave1", "dave").await;

    let response = post_user(&app, &register_request("dave1", &unique("nick"))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "username already exists");
}

async fn second_registration_rejected(app: Router, _user_factory: SessionUserRepository) {
    let request = register_request("erin1", "erin");

    let first = post_user(&app, &request).await;
    let second = post_user(&app, &request).await;

    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

/// Everything the cases above wrote was rolled back, so the same names
/// register again.
async fn earlier_writes_are_gone(app: Router, user_factory: SessionUserRepository) {
    for username in ["alice1", "bob1", "dave1", "erin1"] {
        assert!(!user_factory.exists_by_username(username).await.unwrap());
    }
    for nickname in ["alice", "carol", "dave", "erin"] {
        assert!(!user_factory.exists_by_nickname(nickname).await.unwrap());
    }

    let response = post_user(&app, &register_request("bob1", "carol")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[rstest]
#[tokio::test]
async fn test_user_registration(#[future] manager: SessionManager) {
    let mut manager = manager.await;

    in_transaction(&mut manager, register_returns_created_user).await;
    in_transaction(&mut manager, duplicated_username_rejected).await;
    in_transaction(&mut manager, duplicated_nickname_rejected).await;
    in_transaction(&mut manager, username_checked_before_nickname).await;
    in_transaction(&mut manager, second_registration_rejected).await;
    in_transaction(&mut manager, earlier_writes_are_gone).await;

    manager.close().await.unwrap();
}

#[rstest]
#[tokio::test]
async fn test_rolled_back_user_is_not_visible(#[future] manager: SessionManager) {
    let mut manager = manager.await;

    in_transaction(&mut manager, |app, _user_factory| async move {
        let response = post_user(&app, &register_request("frank1", "frank")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    })
    .await;

    in_transaction(&mut manager, |_app, user_factory| async move {
        assert!(!user_factory.exists_by_username("frank1").await.unwrap());
        assert!(!user_factory.exists_by_nickname("frank").await.unwrap());
    })
    .await;

    manager.close().await.unwrap();
}
