use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct BmsConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    /// Base URL used when building links embedded in outbound emails.
    pub base_url: String,
    pub mongodb: MongoConfig,
    pub token: TokenConfig,
    pub smtp: SmtpConfig,
    pub security: SecurityConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// Signing secret and per-purpose lifetimes for issued tokens.
///
/// The secret has no default in any environment: it must come from
/// configuration, never from source.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub access_expiry_minutes: i64,
    pub refresh_expiry_hours: i64,
    pub email_verify_expiry_minutes: i64,
    pub account_setup_expiry_hours: i64,
    pub password_reset_expiry_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub enabled: bool,
}

impl BmsConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = BmsConfig {
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("bms-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: parse_env("PORT", Some("8080"), is_prod)?,
            base_url: get_env("APP_BASE_URL", Some("http://localhost:8080"), is_prod)?,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", None, is_prod)?,
            },
            token: TokenConfig {
                // No default: deployments must provide their own secret.
                secret: get_env("TOKEN_SECRET", None, is_prod)?,
                access_expiry_minutes: parse_env("ACCESS_TOKEN_EXPIRY_MINUTES", Some("60"), is_prod)?,
                refresh_expiry_hours: parse_env("REFRESH_TOKEN_EXPIRY_HOURS", Some("24"), is_prod)?,
                email_verify_expiry_minutes: parse_env(
                    "EMAIL_VERIFY_TOKEN_EXPIRY_MINUTES",
                    Some("15"),
                    is_prod,
                )?,
                account_setup_expiry_hours: parse_env(
                    "ACCOUNT_SETUP_TOKEN_EXPIRY_HOURS",
                    Some("24"),
                    is_prod,
                )?,
                password_reset_expiry_minutes: parse_env(
                    "PASSWORD_RESET_TOKEN_EXPIRY_MINUTES",
                    Some("15"),
                    is_prod,
                )?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: parse_env("SMTP_PORT", Some("587"), is_prod)?,
                user: get_env("SMTP_USER", None, is_prod)?,
                password: get_env("SMTP_PASSWORD", None, is_prod)?,
                from_email: get_env("SMTP_FROM", None, is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            swagger: SwaggerConfig {
                enabled: get_env("ENABLE_SWAGGER", Some("true"), is_prod)?
                    .parse()
                    .unwrap_or(!is_prod),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.token.access_expiry_minutes <= 0
            || self.token.refresh_expiry_hours <= 0
            || self.token.email_verify_expiry_minutes <= 0
            || self.token.account_setup_expiry_hours <= 0
            || self.token.password_reset_expiry_minutes <= 0
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "token expiries must be positive"
            )));
        }

        if self.environment == Environment::Prod {
            if self.token.secret.len() < 32 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "TOKEN_SECRET must be at least 32 bytes in production"
                )));
            }

            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
        } else if self.token.secret.len() < 32 {
            tracing::warn!("TOKEN_SECRET is shorter than 32 bytes");
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, default, is_prod)?.parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!(format!("{} is invalid: {}", key, e)))
    })
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_str() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_get_env_defaults_outside_prod() {
        let val = get_env("BMS_CONFIG_TEST_UNSET_KEY", Some("fallback"), false).unwrap();
        assert_eq!(val, "fallback");

        // Required keys still fail without a default.
        assert!(get_env("BMS_CONFIG_TEST_UNSET_KEY", None, false).is_err());
        // Prod never falls back to a default.
        assert!(get_env("BMS_CONFIG_TEST_UNSET_KEY", Some("fallback"), true).is_err());
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        env::set_var("BMS_CONFIG_TEST_BAD_PORT", "not-a-number");
        let result: Result<u16, _> = parse_env("BMS_CONFIG_TEST_BAD_PORT", None, false);
        assert!(result.is_err());
        env::remove_var("BMS_CONFIG_TEST_BAD_PORT");
    }
}
