use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::TokenConfig;
use crate::error::AppError;

/// What a token is allowed to be used for. Issuance binds the purpose into
/// the claims; verification requires an exact match, so a refresh token can
/// never pass as an access token and a reset link can never verify an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    Refresh,
    EmailVerify,
    AccountSetup,
    PasswordReset,
}

/// Signed claims. `sub` is an account id for session tokens and a hash-record
/// value for link tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies all tokens with the single process-wide HS256 secret.
/// Stateless: nothing is persisted, expiry is the only revocation.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_expiry_minutes: i64,
    refresh_expiry_hours: i64,
    email_verify_expiry_minutes: i64,
    account_setup_expiry_hours: i64,
    password_reset_expiry_minutes: i64,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_expiry_minutes: config.access_expiry_minutes,
            refresh_expiry_hours: config.refresh_expiry_hours,
            email_verify_expiry_minutes: config.email_verify_expiry_minutes,
            account_setup_expiry_hours: config.account_setup_expiry_hours,
            password_reset_expiry_minutes: config.password_reset_expiry_minutes,
        }
    }

    fn lifetime(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::Access => Duration::minutes(self.access_expiry_minutes),
            TokenPurpose::Refresh => Duration::hours(self.refresh_expiry_hours),
            TokenPurpose::EmailVerify => Duration::minutes(self.email_verify_expiry_minutes),
            TokenPurpose::AccountSetup => Duration::hours(self.account_setup_expiry_hours),
            TokenPurpose::PasswordReset => Duration::minutes(self.password_reset_expiry_minutes),
        }
    }

    /// Sign a token of the given purpose over the given subject.
    pub fn issue(&self, purpose: TokenPurpose, subject: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            purpose,
            iat: now.timestamp(),
            exp: (now + self.lifetime(purpose)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode token: {}", e)))
    }

    /// Verify signature, expiry (zero leeway) and purpose. Any failure other
    /// than a clean expiry reads as `TokenInvalid`.
    pub fn verify(&self, purpose: TokenPurpose, token: &str) -> Result<TokenClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::TokenInvalid,
            },
        )?;

        if data.claims.purpose != purpose {
            return Err(AppError::TokenInvalid);
        }

        Ok(data.claims)
    }

    /// Access-token lifetime in seconds, reported to clients as `expires_in`.
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_expiry_minutes * 60
    }
}
