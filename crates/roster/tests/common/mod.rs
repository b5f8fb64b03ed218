//! Test utilities and common setup.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header},
};
use roster::api;
use roster::auth::{AuthConfig, AuthState, DevUser};
use roster::db::Database;
use roster::user::{CreateUserRequest, User, UserRepository, UserRole, UserService};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

/// A seeded user and a token that authenticates as them.
pub struct Seeded {
    pub user: User,
    pub token: String,
}

/// Router over an in-memory database holding one admin and two regular users.
pub struct TestApp {
    pub router: Router,
    pub admin: Seeded,
    pub alice: Seeded,
    pub bob: Seeded,
}

fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Some(TEST_SECRET.to_string()),
        ..AuthConfig::default()
    }
}

async fn seed(
    users: &UserService,
    auth: &AuthState,
    name: &str,
    email: &str,
    role: UserRole,
) -> Seeded {
    let user = users
        .create_user(CreateUserRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            role: Some(role),
        })
        .await
        .unwrap();
    let token = auth.generate_token(user.id, &user.email, user.role).unwrap();
    Seeded { user, token }
}

/// Build the test application with seeded users.
pub async fn test_app() -> TestApp {
    test_app_with_config(test_auth_config()).await
}

/// Build the test application in dev mode, accepting `X-Dev-User`.
pub async fn dev_app() -> TestApp {
    let mut config = test_auth_config();
    config.dev_mode = true;
    // ids match the seeding order below
    config.dev_users = vec![
        DevUser {
            id: 1,
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
        },
        DevUser {
            id: 2,
            email: "alice@example.com".to_string(),
            role: UserRole::User,
        },
    ];
    test_app_with_config(config).await
}

async fn test_app_with_config(config: AuthConfig) -> TestApp {
    let db = Database::in_memory().await.unwrap();
    let users = UserService::new(UserRepository::new(db.pool().clone()));
    let auth = AuthState::new(config);

    let admin = seed(&users, &auth, "Admin", "admin@example.com", UserRole::Admin).await;
    let alice = seed(&users, &auth, "Alice", "alice@example.com", UserRole::User).await;
    let bob = seed(&users, &auth, "Bob", "bob@example.com", UserRole::User).await;

    let router = api::create_router(api::AppState::new(users, auth));

    TestApp {
        router,
        admin,
        alice,
        bob,
    }
}

impl TestApp {
    /// Send a request with an optional bearer token and JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Like [`TestApp::send`], returning the status and parsed JSON body.
    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send(method, uri, token, body).await;
        read_json(response).await
    }
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// True if any object in `value` carries a password-like key.
pub fn contains_password(value: &Value) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k.contains("password") || contains_password(v)),
        Value::Array(items) => items.iter().any(contains_password),
        _ => false,
    }
}
