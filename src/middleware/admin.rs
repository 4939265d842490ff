use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::AppError;
use crate::models::Account;

/// Gate for `/admin/*` routes: the resolved account must be admin tier.
/// Runs inside `auth_middleware`, which puts the account into the
/// extensions.
pub async fn admin_middleware(req: Request, next: Next) -> Result<Response, AppError> {
    let account = req.extensions().get::<Account>().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("Account missing from request extensions"))
    })?;

    if !account.account_type.is_admin_tier() {
        tracing::warn!(account_id = %account.id, "Non-admin attempted an admin route");
        return Err(AppError::Forbidden(anyhow::anyhow!("Admin access required")));
    }

    Ok(next.run(req).await)
}
