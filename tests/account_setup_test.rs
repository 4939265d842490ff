//! First-login account setup: the invitee redeems the emailed link, chooses
//! a password, and comes out verified.

mod common;

use axum::http::StatusCode;
use bms_service::services::{AccountStore, EmailKind, TokenPurpose};
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_setup_confirm_sets_password_and_verifies() {
    let app = TestApp::spawn();
    let admin = app.seed_admin().await;
    let token = app.access_token_for(&admin);

    // 1. Admin invites a resident; the setup token arrives by email.
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
    let created = body_json(response).await;
    assert_eq!(created["is_verified"], false);

    let sent = app.mailer.sent();
    let setup_token = sent[0].token.clone().unwrap();

    // 2. The invitee redeems the link with a password of their choosing.
    let response = app
        .post(
            "/account/setup/confirm",
            None,
            json!({ "token": setup_token, "new_password": "invitee password" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Account setup completed");

    // 3. Setup doubles as verification.
    let stored = app
        .accounts
        .find_by_email("asha@bms.test")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_verified);

    // 4. The chosen password signs in.
    let signin = app
        .post(
            "/signin",
            None,
            json!({ "email": "asha@bms.test", "password": "invitee password" }),
        )
        .await;
    assert_eq!(signin.status(), StatusCode::OK);

    // 5. A welcome confirmation followed the commit.
    let kinds: Vec<EmailKind> = app.mailer.sent().iter().map(|m| m.kind).collect();
    assert!(kinds.contains(&EmailKind::SetupConfirmation));
}

#[tokio::test]
async fn test_setup_link_is_single_use() {
    let app = TestApp::spawn();
    let resident = app.seed_resident().await;

    let token = app
        .link_token_for(TokenPurpose::AccountSetup, &resident)
        .await;

    let first = app
        .post(
            "/account/setup/confirm",
            None,
            json!({ "token": token.clone(), "new_password": "chosen password" }),
        )
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .post(
            "/account/setup/confirm",
            None,
            json!({ "token": token, "new_password": "another password" }),
        )
        .await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_setup_rejects_reset_purpose_token() {
    let app = TestApp::spawn();
    let resident = app.seed_resident().await;

    let token = app
        .link_token_for(TokenPurpose::PasswordReset, &resident)
        .await;

    let response = app
        .post(
            "/account/setup/confirm",
            None,
            json!({ "token": token, "new_password": "chosen password" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_setup_commit_survives_failed_confirmation_mail() {
    let app = TestApp::spawn_with_failing_mailer();
    let resident = app.seed_resident().await;

    let token = app
        .link_token_for(TokenPurpose::AccountSetup, &resident)
        .await;

    let response = app
        .post(
            "/account/setup/confirm",
            None,
            json!({ "token": token, "new_password": "chosen password" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = app
        .accounts
        .find_by_id(&resident.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_verified);
}
