use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::dtos::accounts::{
    SignupRequest, UpdateAccountRequest, VerificationRequest, VerifyEmailQuery,
};
use crate::dtos::MessageResponse;
use crate::error::AppError;
use crate::middleware::CurrentAccount;
use crate::models::AccountResponse;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Look up an account by id
#[utoipa::path(
    get,
    path = "/admin/user/search/{id}",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account found", body = AccountResponse),
        (status = 404, description = "No such account", body = ErrorResponse)
    ),
    tag = "Accounts",
    security(("bearer_auth" = []))
)]
pub async fn search(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    Ok(Json(state.accounts.find_account(&id).await?))
}

/// Create an account and email the invitee a setup link
#[utoipa::path(
    post,
    path = "/admin/user/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 403, description = "Privilege escalation attempt", body = ErrorResponse),
        (status = 406, description = "Role conflict", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Accounts",
    security(("bearer_auth" = []))
)]
pub async fn signup(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.accounts.signup(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an account's fields and role flags
#[utoipa::path(
    put,
    path = "/admin/user/update/{id}",
    params(("id" = String, Path, description = "Account id")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 403, description = "Privilege escalation attempt", body = ErrorResponse),
        (status = 404, description = "No such account", body = ErrorResponse),
        (status = 406, description = "Role conflict", body = ErrorResponse)
    ),
    tag = "Accounts",
    security(("bearer_auth" = []))
)]
pub async fn update(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    Ok(Json(state.accounts.update(&actor, &id, req).await?))
}

/// Request a verification email for yourself or, as an admin, another account
#[utoipa::path(
    post,
    path = "/account/verification/request",
    request_body = VerificationRequest,
    responses(
        (status = 200, description = "Verification email sent", body = MessageResponse),
        (status = 403, description = "Target requires admin tier", body = ErrorResponse),
        (status = 422, description = "Account is already verified", body = ErrorResponse)
    ),
    tag = "Accounts",
    security(("bearer_auth" = []))
)]
pub async fn request_verification(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    body: Option<Json<VerificationRequest>>,
) -> Result<Json<MessageResponse>, AppError> {
    let target_id = body.as_ref().and_then(|b| b.account_id.as_deref());
    state
        .accounts
        .request_email_verification(&actor, target_id)
        .await?;
    Ok(Json(MessageResponse {
        message: "Verification email sent".to_string(),
    }))
}

/// Redeem an emailed verification link
#[utoipa::path(
    get,
    path = "/verification",
    params(VerifyEmailQuery),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 401, description = "Expired or invalid token", body = ErrorResponse),
        (status = 404, description = "Link already used or unknown", body = ErrorResponse)
    ),
    tag = "Accounts"
)]
pub async fn confirm_verification(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .accounts
        .confirm_email_verification(&query.token)
        .await?;
    Ok(Json(MessageResponse {
        message: "Email verified successfully".to_string(),
    }))
}
