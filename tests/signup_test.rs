//! Admin-driven account creation: role policy, privilege tiers, duplicate
//! detection, audit trail, and the emailed setup link.

mod common;

use axum::http::StatusCode;
use bms_service::models::{AuditAction, AuditOutcome};
use bms_service::services::{AccountStore, EmailKind, HashRecordStore, TokenPurpose};
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_admin_creates_resident_account() {
    let app = TestApp::spawn();
    let admin = app.seed_admin().await;
    let token = app.access_token_for(&admin);

    let response = app
        .post(
            "/admin/user/signup",
            Some(&token),
            json!({
                "first_name": "Asha",
                "last_name": "Verma",
                "email": "asha@bms.test",
                "roles": { "is_resident": true }
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["email"], "asha@bms.test");
    assert_eq!(body["account_type"], "user");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["is_verified"], false);
    assert_eq!(body["created_by"]["account_id"], admin.id);
    // The stored hash never leaves the service.
    assert!(body.get("password").is_none());

    // Audit: one success entry naming actor and target.
    let entries = app.audit.entries();
    let last = entries.last().unwrap();
    assert_eq!(last.action, AuditAction::Insert);
    assert_eq!(last.outcome, AuditOutcome::Success);
    assert_eq!(last.actor_id, admin.id);
    assert_eq!(last.impacted.as_ref().unwrap().email, "asha@bms.test");

    // Setup email: carries a token whose claim resolves to the new account.
    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "asha@bms.test");
    assert_eq!(sent[0].kind, EmailKind::AccountSetup);
    let setup_token = sent[0].token.clone().unwrap();
    let claims = app
        .tokens
        .verify(TokenPurpose::AccountSetup, &setup_token)
        .unwrap();
    let owner = app.hashes.resolve(&claims.sub).await.unwrap().unwrap();
    assert_eq!(owner, body["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_admin_cannot_create_admin_tier_account() {
    let app = TestApp::spawn();
    let admin = app.seed_admin().await;
    let token = app.access_token_for(&admin);

    let response = app
        .post(
            "/admin/user/signup",
            Some(&token),
            json!({
                "first_name": "New",
                "last_name": "Boss",
                "email": "boss@bms.test",
                "roles": { "is_super_admin": true }
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Superadmin access required to create admin accounts"
    );

    // Nothing persisted, failure audited, no email.
    assert_eq!(app.accounts.count(), 1);
    let last = app.audit.entries().pop().unwrap();
    assert_eq!(last.action, AuditAction::Insert);
    assert_eq!(last.outcome, AuditOutcome::Failure);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_superadmin_creates_admin_account() {
    let app = TestApp::spawn();
    let root = app.seed_superadmin().await;
    let token = app.access_token_for(&root);

    let response = app
        .post(
            "/admin/user/signup",
            Some(&token),
            json!({
                "first_name": "Site",
                "last_name": "Admin",
                "email": "site.admin@bms.test",
                "roles": { "is_admin": true }
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["account_type"], "admin");
    assert_eq!(body["roles"]["is_admin"], true);
}

#[tokio::test]
async fn test_signup_rejects_multiple_role_flags() {
    let app = TestApp::spawn();
    let admin = app.seed_admin().await;
    let token = app.access_token_for(&admin);

    let response = app
        .post(
            "/admin/user/signup",
            Some(&token),
            json!({
                "first_name": "Two",
                "last_name": "Hats",
                "email": "two.hats@bms.test",
                "roles": { "is_manager": true, "is_security": true }
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Exactly one role must be set");
    assert_eq!(app.accounts.count(), 1);
}

#[tokio::test]
async fn test_signup_rejects_empty_role_flags() {
    let app = TestApp::spawn();
    let admin = app.seed_admin().await;
    let token = app.access_token_for(&admin);

    let response = app
        .post(
            "/admin/user/signup",
            Some(&token),
            json!({
                "first_name": "No",
                "last_name": "Role",
                "email": "no.role@bms.test",
                "roles": {}
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn test_signup_rejects_duplicate_email() {
    let app = TestApp::spawn();
    let admin = app.seed_admin().await;
    let existing = app.seed_resident().await;
    let token = app.access_token_for(&admin);

    let response = app
        .post(
            "/admin/user/signup",
            Some(&token),
            json!({
                "first_name": "Copy",
                "last_name": "Cat",
                "email": existing.email,
                "roles": { "is_resident": true }
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Email is already registered");
    assert_eq!(app.accounts.count(), 2);
}

#[tokio::test]
async fn test_signup_rejects_invalid_email_format() {
    let app = TestApp::spawn();
    let admin = app.seed_admin().await;
    let token = app.access_token_for(&admin);

    let response = app
        .post(
            "/admin/user/signup",
            Some(&token),
            json!({
                "first_name": "Bad",
                "last_name": "Mail",
                "email": "not-an-email",
                "roles": { "is_resident": true }
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_signup_requires_authentication() {
    let app = TestApp::spawn();

    let response = app
        .post(
            "/admin/user/signup",
            None,
            json!({
                "first_name": "Ghost",
                "last_name": "Caller",
                "email": "ghost@bms.test",
                "roles": { "is_resident": true }
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.accounts.count(), 0);
}

#[tokio::test]
async fn test_user_tier_cannot_reach_signup() {
    let app = TestApp::spawn();
    let resident = app.seed_resident().await;
    let token = app.access_token_for(&resident);

    let response = app
        .post(
            "/admin/user/signup",
            Some(&token),
            json!({
                "first_name": "Side",
                "last_name": "Door",
                "email": "side.door@bms.test",
                "roles": { "is_resident": true }
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Admin access required");
    assert_eq!(app.accounts.count(), 1);
}

#[tokio::test]
async fn test_email_failure_surfaces_but_account_persists() {
    let app = TestApp::spawn_with_failing_mailer();
    let admin = app.seed_admin().await;
    let token = app.access_token_for(&admin);

    let response = app
        .post(
            "/admin/user/signup",
            Some(&token),
            json!({
                "first_name": "Asha",
                "last_name": "Verma",
                "email": "asha@bms.test",
                "roles": { "is_resident": true }
            }),
        )
        .await;

    // The account was created before the send failed; the caller sees the
    // failure and can re-trigger the link.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.accounts.count(), 2);
    assert!(app
        .accounts
        .find_by_email("asha@bms.test")
        .await
        .unwrap()
        .is_some());
    let last = app.audit.entries().pop().unwrap();
    assert_eq!(last.outcome, AuditOutcome::Success);
}
