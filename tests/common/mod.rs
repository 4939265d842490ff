//! Shared harness for the integration tests.
//!
//! Everything runs against the in-memory store implementations and the mock
//! mailer, so no MongoDB or SMTP relay is required. The router under test is
//! the same one `main` serves.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use bms_service::{
    build_router,
    config::{
        BmsConfig, Environment, MongoConfig, SecurityConfig, SmtpConfig, SwaggerConfig,
        TokenConfig,
    },
    models::{Account, AccountType, RoleFlags},
    services::{
        AccountService, AccountStore, BuildingService, HashRecordStore, MemoryAccountStore,
        MemoryAuditSink, MemoryBuildingStore, MemoryHashStore, MockMailer, TokenClaims,
        TokenPurpose, TokenService,
    },
    utils::{hash_password, Password},
    AppState,
};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

pub fn test_config() -> BmsConfig {
    BmsConfig {
        environment: Environment::Dev,
        service_name: "bms-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        port: 8080,
        base_url: "http://localhost:8080".to_string(),
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "bms_test".to_string(),
        },
        token: TokenConfig {
            secret: TEST_SECRET.to_string(),
            access_expiry_minutes: 60,
            refresh_expiry_hours: 24,
            email_verify_expiry_minutes: 15,
            account_setup_expiry_hours: 24,
            password_reset_expiry_minutes: 15,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            user: "test".to_string(),
            password: "test".to_string(),
            from_email: "noreply@bms.test".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        swagger: SwaggerConfig { enabled: false },
    }
}

/// Router plus handles on every backend it was built over, so tests can seed
/// state directly and assert on what the handlers persisted.
pub struct TestApp {
    pub router: axum::Router,
    pub accounts: Arc<MemoryAccountStore>,
    pub hashes: Arc<MemoryHashStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub buildings: Arc<MemoryBuildingStore>,
    pub mailer: Arc<MockMailer>,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with_mailer(Arc::new(MockMailer::new()))
    }

    /// Variant for tests that need SMTP to fail.
    pub fn spawn_with_failing_mailer() -> Self {
        Self::spawn_with_mailer(Arc::new(MockMailer::failing()))
    }

    fn spawn_with_mailer(mailer: Arc<MockMailer>) -> Self {
        let config = test_config();
        let tokens = TokenService::new(&config.token);

        let accounts = Arc::new(MemoryAccountStore::new());
        let hashes = Arc::new(MemoryHashStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let buildings = Arc::new(MemoryBuildingStore::new());

        let account_service = AccountService::new(
            accounts.clone(),
            hashes.clone(),
            audit.clone(),
            mailer.clone(),
            tokens.clone(),
            config.base_url.clone(),
        );
        let building_service = BuildingService::new(buildings.clone(), accounts.clone());

        let state = AppState {
            config,
            accounts: account_service,
            buildings: building_service,
            account_store: accounts.clone(),
            tokens: tokens.clone(),
            db: None,
        };

        TestApp {
            router: build_router(state),
            accounts,
            hashes,
            audit,
            buildings,
            mailer,
            tokens,
        }
    }

    /// Insert an account straight into the store, bypassing the HTTP surface.
    /// The password is `TEST_PASSWORD`; the account starts active and
    /// unverified, like one created through signup.
    pub async fn seed_account(
        &self,
        first_name: &str,
        email: &str,
        account_type: AccountType,
        roles: RoleFlags,
    ) -> Account {
        let hash = hash_password(&Password::new(TEST_PASSWORD.to_string())).unwrap();
        let account = Account::new(
            first_name.to_string(),
            "Tester".to_string(),
            email.to_string(),
            hash.into_string(),
            account_type,
            roles,
            None,
        );
        self.accounts.insert(&account).await.unwrap();
        account
    }

    pub async fn seed_superadmin(&self) -> Account {
        self.seed_account(
            "Root",
            "root@bms.test",
            AccountType::Superadmin,
            RoleFlags::super_admin(),
        )
        .await
    }

    pub async fn seed_admin(&self) -> Account {
        self.seed_account(
            "Admin",
            "admin@bms.test",
            AccountType::Admin,
            RoleFlags::admin(),
        )
        .await
    }

    pub async fn seed_resident(&self) -> Account {
        self.seed_account(
            "Resident",
            "resident@bms.test",
            AccountType::User,
            RoleFlags::resident(),
        )
        .await
    }

    pub fn access_token_for(&self, account: &Account) -> String {
        self.tokens.issue(TokenPurpose::Access, &account.id).unwrap()
    }

    /// Mint a single-use link hash for `account` directly, as the request
    /// endpoints would, and wrap it in a token of the given purpose.
    pub async fn link_token_for(&self, purpose: TokenPurpose, account: &Account) -> String {
        let hash = self.hashes.create(&account.id).await.unwrap();
        self.tokens.issue(purpose, &hash).unwrap()
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> Response<Body> {
        self.request("GET", uri, bearer, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        bearer: Option<&str>,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.request("POST", uri, bearer, Some(body)).await
    }

    pub async fn put(
        &self,
        uri: &str,
        bearer: Option<&str>,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.request("PUT", uri, bearer, Some(body)).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response<Body> {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// The `name=value` pair of a Set-Cookie header, ready to send back in a
/// Cookie header.
pub fn cookie_pair(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{name}=")))
        .map(|value| value.split(';').next().unwrap_or(value).to_string())
}

/// Sign a token with the test secret but an expiry in the past. Exercises the
/// expired-token paths without waiting out a real lifetime.
pub fn expired_token(purpose: TokenPurpose, subject: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = TokenClaims {
        sub: subject.to_string(),
        purpose,
        iat: now - 7200,
        exp: now - 3600,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}
