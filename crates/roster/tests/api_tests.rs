//! API integration tests.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{contains_password, dev_app, read_json, test_app};

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;

    let (status, json) = app.send_json(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_requests_without_credentials_are_rejected() {
    let app = test_app().await;

    for (method, uri) in [
        (Method::GET, "/users"),
        (Method::GET, "/users/1"),
        (Method::PUT, "/users/1"),
        (Method::DELETE, "/users/1"),
    ] {
        let (status, json) = app.send_json(method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = test_app().await;

    let (status, _) = app
        .send_json(Method::GET, "/users", Some("not.a.jwt"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_accepted_from_cookie() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users")
                .header(header::COOKIE, format!("auth_token={}", app.alice.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_users() {
    let app = test_app().await;

    let (status, json) = app
        .send_json(Method::GET, "/users", Some(&app.alice.token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Successfully retrieved all users");
    let users = json["users"].as_array().unwrap();
    assert_eq!(json["count"], users.len());
    assert_eq!(users.len(), 3);
    assert_eq!(users[0]["email"], "admin@example.com");
    assert!(!contains_password(&json));
}

#[tokio::test]
async fn test_get_user() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.bob.user.id);

    let (status, json) = app
        .send_json(Method::GET, &uri, Some(&app.alice.token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Successfully retrieved user");
    assert_eq!(json["user"]["name"], "Bob");
    assert_eq!(json["user"]["role"], "user");
    assert!(!contains_password(&json));
}

#[tokio::test]
async fn test_get_user_non_numeric_id() {
    let app = test_app().await;

    let (status, json) = app
        .send_json(Method::GET, "/users/abc", Some(&app.alice.token), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Validation failed.");
    assert_eq!(json["code"], "VALIDATION_FAILED");
    assert_eq!(json["details"][0]["field"], "id");
    assert_eq!(json["details"][0]["message"], "User ID must be a valid number");
}

#[tokio::test]
async fn test_get_user_non_positive_id() {
    let app = test_app().await;

    let (status, json) = app
        .send_json(Method::GET, "/users/0", Some(&app.alice.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["details"][0]["message"],
        "User ID must be a positive number"
    );

    let (status, json) = app
        .send_json(Method::GET, "/users/-1", Some(&app.alice.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "id");
}

#[tokio::test]
async fn test_get_missing_user() {
    let app = test_app().await;

    let (status, json) = app
        .send_json(Method::GET, "/users/999", Some(&app.admin.token), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "User not found");
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_update_self() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.alice.user.id);

    let (status, json) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&app.alice.token),
            Some(json!({"name": "  Alice Liddell  ", "email": " ALICE.L@Example.com "})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Successfully updated user");
    assert_eq!(json["user"]["name"], "Alice Liddell");
    assert_eq!(json["user"]["email"], "alice.l@example.com");
    assert!(!contains_password(&json));
}

#[tokio::test]
async fn test_patch_is_an_update() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.bob.user.id);

    let (status, json) = app
        .send_json(
            Method::PATCH,
            &uri,
            Some(&app.bob.token),
            Some(json!({"password": "new-password"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["email"], "bob@example.com");
}

#[tokio::test]
async fn test_update_empty_body() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.alice.user.id);

    let (status, json) = app
        .send_json(Method::PUT, &uri, Some(&app.alice.token), Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Validation failed.");
    assert_eq!(
        json["details"][0]["message"],
        "At least one field must be provided for update"
    );
    assert!(json["details"][0].get("field").is_none());
}

#[tokio::test]
async fn test_update_reports_every_invalid_field() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.admin.user.id);

    let (status, json) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&app.admin.token),
            Some(json!({"name": "   ", "email": "nope", "password": "123", "role": "root"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["name", "email", "password", "role"]);
}

#[tokio::test]
async fn test_update_null_role_is_rejected() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.alice.user.id);

    let (status, json) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&app.alice.token),
            Some(json!({"name": "A2", "role": null})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "role");
    assert_eq!(
        json["details"][0]["message"],
        r#"Role must be either "user" or "admin""#
    );

    // Nothing was applied
    let (_, json) = app
        .send_json(Method::GET, &uri, Some(&app.alice.token), None)
        .await;
    assert_eq!(json["user"]["name"], "Alice");
}

#[tokio::test]
async fn test_update_null_name_reports_the_field() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.alice.user.id);

    let (status, json) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&app.alice.token),
            Some(json!({"name": null})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["field"], "name");
    assert_eq!(details[0]["message"], "Name must be a string");
}

#[tokio::test]
async fn test_update_whitespace_name_is_empty() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.alice.user.id);

    let (status, json) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&app.alice.token),
            Some(json!({"name": "    "})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "name");
    assert_eq!(json["details"][0]["message"], "Name cannot be empty");
}

#[tokio::test]
async fn test_update_malformed_json() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.alice.user.id);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", app.alice.token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, json) = read_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_non_admin_cannot_update_other_user() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.bob.user.id);

    let (status, json) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&app.alice.token),
            Some(json!({"name": "Mallory"})),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_non_admin_cannot_change_role() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.alice.user.id);

    let (status, json) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&app.alice.token),
            Some(json!({"role": "admin"})),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "Only admin users can change user roles.");

    // Role is unchanged
    let (_, json) = app
        .send_json(Method::GET, &uri, Some(&app.alice.token), None)
        .await;
    assert_eq!(json["user"]["role"], "user");
}

#[tokio::test]
async fn test_admin_can_update_other_user_role() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.bob.user.id);

    let (status, json) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&app.admin.token),
            Some(json!({"role": "admin"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["role"], "admin");
}

#[tokio::test]
async fn test_update_email_conflict() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.alice.user.id);

    let (status, json) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&app.alice.token),
            Some(json!({"email": "Bob@Example.com"})),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "Email already exists");
}

#[tokio::test]
async fn test_update_own_email_unchanged_is_not_conflict() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.alice.user.id);

    let (status, _) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&app.alice.token),
            Some(json!({"email": "alice@example.com"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_missing_user() {
    let app = test_app().await;

    let (status, _) = app
        .send_json(
            Method::PUT,
            "/users/999",
            Some(&app.admin.token),
            Some(json!({"name": "Ghost"})),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.admin.user.id);

    let (status, json) = app
        .send_json(Method::DELETE, &uri, Some(&app.admin.token), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Admin users cannot delete their own account.");
}

#[tokio::test]
async fn test_non_admin_cannot_delete_other_user() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.bob.user.id);

    let (status, json) = app
        .send_json(Method::DELETE, &uri, Some(&app.alice.token), None)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_delete_self_as_user() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.bob.user.id);

    let (status, json) = app
        .send_json(Method::DELETE, &uri, Some(&app.bob.token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Successfully deleted user");
    assert_eq!(json["user"]["id"], app.bob.user.id);
    assert_eq!(json["user"]["email"], "bob@example.com");
    assert!(!contains_password(&json));

    let (status, _) = app
        .send_json(Method::GET, &uri, Some(&app.admin.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_deletes_other_user() {
    let app = test_app().await;
    let uri = format!("/users/{}", app.alice.user.id);

    let (status, json) = app
        .send_json(Method::DELETE, &uri, Some(&app.admin.token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["user"].as_object().unwrap().keys().collect::<Vec<_>>(),
        ["email", "id", "name", "role"]
    );

    let (_, json) = app
        .send_json(Method::GET, "/users", Some(&app.admin.token), None)
        .await;
    assert_eq!(json["count"], 2);
}

#[tokio::test]
async fn test_delete_missing_user() {
    let app = test_app().await;

    let (status, json) = app
        .send_json(Method::DELETE, "/users/999", Some(&app.admin.token), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "User not found");
}

#[tokio::test]
async fn test_dev_user_header() {
    let app = dev_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/users/3")
                .header("X-Dev-User", "2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Dev user 2 is a regular user acting on someone else
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dev_user_header_ignored_outside_dev_mode() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users")
                .header("X-Dev-User", "1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
