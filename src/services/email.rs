use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};

use crate::config::SmtpConfig;
use crate::error::AppError;

/// Outbound mail seam. Every message that carries a link token takes the
/// token and the public base URL; confirmation mails carry neither.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_account_setup(
        &self,
        to_email: &str,
        name: &str,
        setup_token: &str,
        base_url: &str,
    ) -> Result<(), AppError>;

    async fn send_setup_confirmation(&self, to_email: &str, name: &str) -> Result<(), AppError>;

    async fn send_email_verification(
        &self,
        to_email: &str,
        name: &str,
        verification_token: &str,
        base_url: &str,
    ) -> Result<(), AppError>;

    async fn send_password_reset(
        &self,
        to_email: &str,
        name: &str,
        reset_token: &str,
        base_url: &str,
    ) -> Result<(), AppError>;

    async fn send_password_change_confirmation(
        &self,
        to_email: &str,
        name: &str,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "SMTP mailer initialized");

        Ok(Self {
            mailer,
            from_email: config.from_email.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.from_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .to(to_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::InternalError(e.into()))?;

        // SmtpTransport is blocking; keep it off the async runtime.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(
                    to = %to_email,
                    subject = %subject,
                    "Email sent successfully"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e.to_string(),
                    to = %to_email,
                    "Failed to send email"
                );
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_account_setup(
        &self,
        to_email: &str,
        name: &str,
        setup_token: &str,
        base_url: &str,
    ) -> Result<(), AppError> {
        let setup_link = format!("{}/register/callback?ut={}", base_url, setup_token);

        let html_body = format!(
            r###"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Welcome, {}!</h2>
                    <p>An account has been created for you. Click the link below to choose your password and activate it:</p>
                    <p>
                        <a href="{}" style="background-color: #4CAF50; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                            Set Up Account
                        </a>
                    </p>
                    <p style="color: #666; font-size: 12px;">
                        This link will expire in 24 hours. If you weren't expecting this, please ignore this email.
                    </p>
                </body>
            </html>
            "###,
            name, setup_link
        );

        let plain_body = format!(
            "Welcome, {}!\n\nAn account has been created for you. Please visit the following link to choose your password and activate it:\n\n{}\n\nThis link will expire in 24 hours. If you weren't expecting this, please ignore this email.",
            name, setup_link
        );

        self.send_email(to_email, "Set Up Your Account", &plain_body, &html_body)
            .await
    }

    async fn send_setup_confirmation(&self, to_email: &str, name: &str) -> Result<(), AppError> {
        let html_body = format!(
            r###"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>You're all set, {}!</h2>
                    <p>Your account has been activated and your password is in place. You can sign in now.</p>
                </body>
            </html>
            "###,
            name
        );

        let plain_body = format!(
            "You're all set, {}!\n\nYour account has been activated and your password is in place. You can sign in now.",
            name
        );

        self.send_email(to_email, "Your Account Is Ready", &plain_body, &html_body)
            .await
    }

    async fn send_email_verification(
        &self,
        to_email: &str,
        name: &str,
        verification_token: &str,
        base_url: &str,
    ) -> Result<(), AppError> {
        let verification_link = format!("{}/verification?token={}", base_url, verification_token);

        let html_body = format!(
            r###"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Hi {}, please verify your email</h2>
                    <p>Click the link below to verify this email address:</p>
                    <p>
                        <a href="{}" style="background-color: #4CAF50; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                            Verify Email
                        </a>
                    </p>
                    <p style="color: #666; font-size: 12px;">
                        This link will expire in 15 minutes. If you didn't request this, please ignore this email.
                    </p>
                </body>
            </html>
            "###,
            name, verification_link
        );

        let plain_body = format!(
            "Hi {}, please verify your email\n\nPlease visit the following link to verify this email address:\n\n{}\n\nThis link will expire in 15 minutes. If you didn't request this, please ignore this email.",
            name, verification_link
        );

        self.send_email(
            to_email,
            "Verify Your Email Address",
            &plain_body,
            &html_body,
        )
        .await
    }

    async fn send_password_reset(
        &self,
        to_email: &str,
        name: &str,
        reset_token: &str,
        base_url: &str,
    ) -> Result<(), AppError> {
        let reset_link = format!("{}/password/reset/callback?ut={}", base_url, reset_token);

        let html_body = format!(
            r###"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Password Reset Request</h2>
                    <p>Hi {}, we received a request to reset your password. Click the link below to set a new one:</p>
                    <p>
                        <a href="{}" style="background-color: #2196F3; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                            Reset Password
                        </a>
                    </p>
                    <p style="color: #666; font-size: 12px;">
                        This link will expire in 15 minutes. If you didn't request this, please ignore this email.
                    </p>
                </body>
            </html>
            "###,
            name, reset_link
        );

        let plain_body = format!(
            "Password Reset Request\n\nHi {}, we received a request to reset your password. Please visit the following link to set a new one:\n\n{}\n\nThis link will expire in 15 minutes. If you didn't request this, please ignore this email.",
            name, reset_link
        );

        self.send_email(to_email, "Reset Your Password", &plain_body, &html_body)
            .await
    }

    async fn send_password_change_confirmation(
        &self,
        to_email: &str,
        name: &str,
    ) -> Result<(), AppError> {
        let html_body = format!(
            r###"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Your password was changed</h2>
                    <p>Hi {}, the password on your account was just changed. If this wasn't you, contact your administrator immediately.</p>
                </body>
            </html>
            "###,
            name
        );

        let plain_body = format!(
            "Your password was changed\n\nHi {}, the password on your account was just changed. If this wasn't you, contact your administrator immediately.",
            name
        );

        self.send_email(
            to_email,
            "Your Password Was Changed",
            &plain_body,
            &html_body,
        )
        .await
    }
}

/// What kind of message a recorded mock send was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    AccountSetup,
    SetupConfirmation,
    EmailVerification,
    PasswordReset,
    PasswordChangeConfirmation,
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub kind: EmailKind,
    pub token: Option<String>,
}

/// Records sends instead of talking SMTP. `failing()` builds one whose every
/// send returns `EmailError`.
#[derive(Default)]
pub struct MockMailer {
    sent: Mutex<Vec<SentEmail>>,
    failing: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, to: &str, kind: EmailKind, token: Option<&str>) -> Result<(), AppError> {
        if self.failing {
            return Err(AppError::EmailError("mock mailer failure".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            kind,
            token: token.map(str::to_string),
        });
        Ok(())
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_account_setup(
        &self,
        to_email: &str,
        _name: &str,
        setup_token: &str,
        _base_url: &str,
    ) -> Result<(), AppError> {
        self.record(to_email, EmailKind::AccountSetup, Some(setup_token))
    }

    async fn send_setup_confirmation(&self, to_email: &str, _name: &str) -> Result<(), AppError> {
        self.record(to_email, EmailKind::SetupConfirmation, None)
    }

    async fn send_email_verification(
        &self,
        to_email: &str,
        _name: &str,
        verification_token: &str,
        _base_url: &str,
    ) -> Result<(), AppError> {
        self.record(
            to_email,
            EmailKind::EmailVerification,
            Some(verification_token),
        )
    }

    async fn send_password_reset(
        &self,
        to_email: &str,
        _name: &str,
        reset_token: &str,
        _base_url: &str,
    ) -> Result<(), AppError> {
        self.record(to_email, EmailKind::PasswordReset, Some(reset_token))
    }

    async fn send_password_change_confirmation(
        &self,
        to_email: &str,
        _name: &str,
    ) -> Result<(), AppError> {
        self.record(to_email, EmailKind::PasswordChangeConfirmation, None)
    }
}
