use axum::{extract::State, Json};

use crate::dtos::password::{AccountSetupConfirm, PasswordResetConfirm, PasswordResetRequest};
use crate::dtos::MessageResponse;
use crate::error::AppError;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Request a password reset link
///
/// Responds 200 whether or not the email is known.
#[utoipa::path(
    post,
    path = "/password/reset/request",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset link sent if the email exists", body = MessageResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Password"
)]
pub async fn request_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.request_password_reset(&req.email).await?;
    Ok(Json(MessageResponse {
        message: "If the email is registered, a reset link has been sent".to_string(),
    }))
}

/// Redeem a reset link and set a new password
#[utoipa::path(
    post,
    path = "/password/reset/confirm",
    request_body = PasswordResetConfirm,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 401, description = "Expired or invalid token", body = ErrorResponse),
        (status = 404, description = "Link already used or unknown", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Password"
)]
pub async fn confirm_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirm>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .accounts
        .confirm_password_reset(&req.token, &req.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password has been reset".to_string(),
    }))
}

/// Redeem a setup link, choose a password, and activate the account
#[utoipa::path(
    post,
    path = "/account/setup/confirm",
    request_body = AccountSetupConfirm,
    responses(
        (status = 200, description = "Account set up and verified", body = MessageResponse),
        (status = 401, description = "Expired or invalid token", body = ErrorResponse),
        (status = 404, description = "Link already used or unknown", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Password"
)]
pub async fn confirm_setup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AccountSetupConfirm>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .accounts
        .confirm_account_setup(&req.token, &req.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Account setup completed".to_string(),
    }))
}
