//! Account lifecycle: signup, update, sign-in, refresh, and the emailed
//! link flows (verification, password reset, account setup).
//!
//! Order of effects matters in every mutation: role validation and
//! authorization run before any write, the audit entry is recorded for both
//! outcomes, and nothing committed is ever rolled back to mask a later
//! failure.

use std::sync::Arc;

use crate::dtos::accounts::{SignupRequest, UpdateAccountRequest};
use crate::dtos::session::{AccessTokenResponse, SignInRequest};
use crate::error::AppError;
use crate::models::hash_record::generate_hash_value;
use crate::models::{Account, AccountResponse, ActorStamp, AuditAction, AuditRecord};
use crate::services::email::Mailer;
use crate::services::policy::RolePolicy;
use crate::services::store::{AccountStore, AuditSink, HashRecordStore};
use crate::services::token::{TokenPurpose, TokenService};
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

/// Both session tokens minted at sign-in. The refresh token is set as an
/// HttpOnly cookie by the handler and never appears in a response body.
#[derive(Debug)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    hash_records: Arc<dyn HashRecordStore>,
    audit: Arc<dyn AuditSink>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenService,
    base_url: String,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        hash_records: Arc<dyn HashRecordStore>,
        audit: Arc<dyn AuditSink>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenService,
        base_url: String,
    ) -> Self {
        Self {
            accounts,
            hash_records,
            audit,
            mailer,
            tokens,
            base_url,
        }
    }

    /// Create an account on behalf of `actor` and email the invitee a setup
    /// link. Role and privilege failures are audited and nothing is
    /// persisted; an email failure after the insert is surfaced without
    /// rolling the account back.
    pub async fn signup(
        &self,
        actor: &Account,
        req: SignupRequest,
    ) -> Result<AccountResponse, AppError> {
        if let Err(err) = RolePolicy::validate(&req.roles) {
            self.audit(
                AuditRecord::failure(actor, AuditAction::Insert, err.to_string())
                    .impacting(None, req.email.as_str()),
            )
            .await;
            return Err(err);
        }

        if !RolePolicy::can_assign(actor.account_type, &req.roles) {
            let err = AppError::Forbidden(anyhow::anyhow!(
                "Superadmin access required to create admin accounts"
            ));
            self.audit(
                AuditRecord::failure(actor, AuditAction::Insert, err.to_string())
                    .impacting(None, req.email.as_str()),
            )
            .await;
            return Err(err);
        }

        if self.accounts.find_by_email(&req.email).await?.is_some() {
            let err = AppError::Conflict(anyhow::anyhow!("Email is already registered"));
            self.audit(
                AuditRecord::failure(actor, AuditAction::Insert, err.to_string())
                    .impacting(None, req.email.as_str()),
            )
            .await;
            return Err(err);
        }

        // Unguessable placeholder credential; the invitee chooses the real
        // password through the setup link.
        let password_hash = hash_password(&Password::new(generate_hash_value()))?;

        let account_type = RolePolicy::derive_account_type(&req.roles);
        let account = Account::new(
            req.first_name,
            req.last_name,
            req.email,
            password_hash.into_string(),
            account_type,
            req.roles,
            Some(ActorStamp::of(actor)),
        );

        if let Err(err) = self.accounts.insert(&account).await {
            self.audit(
                AuditRecord::failure(actor, AuditAction::Insert, err.to_string())
                    .impacting(None, account.email.as_str()),
            )
            .await;
            return Err(err);
        }

        tracing::info!(
            account_id = %account.id,
            account_type = %account.account_type.as_str(),
            "Account created"
        );

        self.audit(
            AuditRecord::success(actor, AuditAction::Insert, "Account created")
                .impacting(Some(account.id.clone()), account.email.as_str()),
        )
        .await;

        let hash = self.hash_records.create(&account.id).await?;
        let setup_token = self.tokens.issue(TokenPurpose::AccountSetup, &hash)?;

        self.mailer
            .send_account_setup(
                &account.email,
                &account.full_name(),
                &setup_token,
                &self.base_url,
            )
            .await?;

        Ok(account.sanitized())
    }

    /// Overwrite the target's mutable fields, re-deriving the account type
    /// from the new flag set. The audit entry carries a field-level diff.
    pub async fn update(
        &self,
        actor: &Account,
        target_id: &str,
        req: UpdateAccountRequest,
    ) -> Result<AccountResponse, AppError> {
        let Some(current) = self.accounts.find_by_id(target_id).await? else {
            self.audit(AuditRecord::failure(
                actor,
                AuditAction::Update,
                format!("Account not found: {}", target_id),
            ))
            .await;
            return Err(AppError::NotFound(anyhow::anyhow!("Account not found")));
        };

        if let Err(err) = RolePolicy::validate(&req.roles) {
            self.audit(
                AuditRecord::failure(actor, AuditAction::Update, err.to_string())
                    .impacting(Some(current.id.clone()), current.email.as_str()),
            )
            .await;
            return Err(err);
        }

        if !RolePolicy::can_modify(actor.account_type, current.account_type, &req.roles) {
            let err = AppError::Forbidden(anyhow::anyhow!(
                "Superadmin access required to modify admin accounts"
            ));
            self.audit(
                AuditRecord::failure(actor, AuditAction::Update, err.to_string())
                    .impacting(Some(current.id.clone()), current.email.as_str()),
            )
            .await;
            return Err(err);
        }

        let mut updated = current.clone();
        updated.first_name = req.first_name;
        updated.last_name = req.last_name;
        updated.roles = req.roles;
        updated.is_active = req.is_active;
        updated.account_type = RolePolicy::derive_account_type(&req.roles);
        updated.last_updated_by = Some(ActorStamp::of(actor));

        let changes = Account::diff(&current, &updated);

        self.accounts.update(&updated).await?;

        tracing::info!(account_id = %updated.id, "Account updated");

        self.audit(
            AuditRecord::success(actor, AuditAction::Update, "Account updated")
                .impacting(Some(updated.id.clone()), updated.email.as_str())
                .with_changes(changes),
        )
        .await;

        Ok(updated.sanitized())
    }

    /// Unknown email and wrong password collapse into the same
    /// `InvalidCredentials`; inactive accounts are rejected after the
    /// existence check and before password comparison.
    pub async fn sign_in(&self, req: SignInRequest) -> Result<SessionTokens, AppError> {
        let account = self
            .accounts
            .find_by_email(&req.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !account.is_active {
            return Err(AppError::AccountInactive);
        }

        if !verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(account.password.clone()),
        ) {
            return Err(AppError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(TokenPurpose::Access, &account.id)?;
        let refresh_token = self.tokens.issue(TokenPurpose::Refresh, &account.id)?;

        tracing::info!(account_id = %account.id, "Sign-in successful");

        Ok(SessionTokens {
            access_token,
            refresh_token,
            expires_in: self.tokens.access_token_expiry_seconds(),
        })
    }

    /// Mint a new access token against a live refresh token. The refresh
    /// token itself is never rotated; it expires on its original schedule.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessTokenResponse, AppError> {
        let claims = self.tokens.verify(TokenPurpose::Refresh, refresh_token)?;

        let account = self
            .accounts
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Account no longer exists")))?;

        if !account.is_active {
            return Err(AppError::AccountInactive);
        }

        let access_token = self.tokens.issue(TokenPurpose::Access, &account.id)?;
        Ok(AccessTokenResponse::new(
            access_token,
            self.tokens.access_token_expiry_seconds(),
        ))
    }

    /// Email a verification link. The default target is the actor; pointing
    /// at another account requires admin tier.
    pub async fn request_email_verification(
        &self,
        actor: &Account,
        target_id: Option<&str>,
    ) -> Result<(), AppError> {
        let target = match target_id {
            Some(id) if id != actor.id => {
                if !actor.account_type.is_admin_tier() {
                    return Err(AppError::Forbidden(anyhow::anyhow!(
                        "Admin access required to request verification for another account"
                    )));
                }
                self.accounts
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account not found")))?
            }
            _ => actor.clone(),
        };

        if target.is_verified {
            return Err(AppError::ValidationError(
                "Account is already verified".to_string(),
            ));
        }

        let hash = self.hash_records.create(&target.id).await?;
        let token = self.tokens.issue(TokenPurpose::EmailVerify, &hash)?;

        self.mailer
            .send_email_verification(&target.email, &target.full_name(), &token, &self.base_url)
            .await?;

        Ok(())
    }

    pub async fn confirm_email_verification(&self, token: &str) -> Result<(), AppError> {
        let claims = self.tokens.verify(TokenPurpose::EmailVerify, token)?;

        let account_id = self.hash_records.resolve(&claims.sub).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Verification link already used or unknown"))
        })?;

        self.accounts.mark_verified(&account_id).await?;
        self.hash_records.consume(&claims.sub).await?;

        tracing::info!(account_id = %account_id, "Email verified");
        Ok(())
    }

    /// Unknown emails get the same 200 as known ones; nothing in the
    /// response reveals whether an account exists.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let hash = self.hash_records.create(&account.id).await?;
        let token = self.tokens.issue(TokenPurpose::PasswordReset, &hash)?;

        self.mailer
            .send_password_reset(&account.email, &account.full_name(), &token, &self.base_url)
            .await?;

        Ok(())
    }

    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let account = self
            .redeem_link(TokenPurpose::PasswordReset, token, new_password, false)
            .await?;

        tracing::info!(account_id = %account.id, "Password reset completed");

        // The password change is already committed; the courtesy mail is
        // best effort.
        if let Err(err) = self
            .mailer
            .send_password_change_confirmation(&account.email, &account.full_name())
            .await
        {
            tracing::warn!(error = %err, "failed to send password change confirmation");
        }

        Ok(())
    }

    /// Same shape as a password reset, but setup doubles as first-login
    /// verification: the account comes out verified.
    pub async fn confirm_account_setup(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let account = self
            .redeem_link(TokenPurpose::AccountSetup, token, new_password, true)
            .await?;

        tracing::info!(account_id = %account.id, "Account setup completed");

        if let Err(err) = self
            .mailer
            .send_setup_confirmation(&account.email, &account.full_name())
            .await
        {
            tracing::warn!(error = %err, "failed to send setup confirmation");
        }

        Ok(())
    }

    pub async fn find_account(&self, id: &str) -> Result<AccountResponse, AppError> {
        let account = self
            .accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account not found")))?;
        Ok(account.sanitized())
    }

    /// Resolve a link token to its account, store the new password, and
    /// consume every outstanding link for that account.
    async fn redeem_link(
        &self,
        purpose: TokenPurpose,
        token: &str,
        new_password: &str,
        mark_verified: bool,
    ) -> Result<Account, AppError> {
        let claims = self.tokens.verify(purpose, token)?;

        let account_id = self
            .hash_records
            .resolve(&claims.sub)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Link already used or unknown")))?;

        let account = self
            .accounts
            .find_by_id(&account_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account not found")))?;

        let password_hash = hash_password(&Password::new(new_password.to_string()))?;
        self.accounts
            .set_password(&account.id, password_hash.as_str(), mark_verified)
            .await?;
        self.hash_records.consume(&claims.sub).await?;

        Ok(account)
    }

    /// Audit failures are logged, never propagated into the triggering
    /// operation.
    async fn audit(&self, entry: AuditRecord) {
        if let Err(err) = self.audit.record(&entry).await {
            tracing::warn!(error = %err, "failed to write audit record");
        }
    }
}
