use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::Account;
use crate::services::TokenPurpose;
use crate::AppState;

/// Require a live access token and load the account behind it into the
/// request extensions. Accounts deleted or deactivated after the token was
/// issued are rejected here.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let claims = state.tokens.verify(TokenPurpose::Access, token)?;

    let account = state
        .account_store
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Account no longer exists")))?;

    if !account.is_active {
        return Err(AppError::AccountInactive);
    }

    req.extensions_mut().insert(account);

    Ok(next.run(req).await)
}

/// Extractor for the account `auth_middleware` resolved.
pub struct CurrentAccount(pub Account);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account = parts.extensions.get::<Account>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Account missing from request extensions"))
        })?;
        Ok(CurrentAccount(account))
    }
}
