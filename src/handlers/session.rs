use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::dtos::session::{AccessTokenResponse, SignInRequest};
use crate::error::AppError;
use crate::utils::ValidatedJson;
use crate::AppState;

pub const REFRESH_COOKIE: &str = "refreshToken";

/// Sign in with email and password
///
/// Sets the refresh token as an HttpOnly cookie; only the access token is
/// returned in the body.
#[utoipa::path(
    post,
    path = "/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AccessTokenResponse),
        (status = 401, description = "Invalid credentials or inactive account", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Session"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<SignInRequest>,
) -> Result<(CookieJar, Json<AccessTokenResponse>), AppError> {
    let tokens = state.accounts.sign_in(req).await?;

    let cookie = Cookie::build((REFRESH_COOKIE, tokens.refresh_token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build();

    Ok((
        jar.add(cookie),
        Json(AccessTokenResponse::new(
            tokens.access_token,
            tokens.expires_in,
        )),
    ))
}

/// Exchange the refresh cookie for a fresh access token
#[utoipa::path(
    get,
    path = "/refreshToken",
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Missing, expired or invalid refresh token", body = ErrorResponse)
    ),
    tag = "Session"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing refresh token cookie")))?;

    let response = state.accounts.refresh(&token).await?;
    Ok(Json(response))
}
