pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{openapi::security::SecurityScheme, Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::BmsConfig;
use crate::services::{AccountService, AccountStore, BuildingService, MongoDb, TokenService};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::online,
        handlers::health::health_check,
        handlers::session::sign_in,
        handlers::session::refresh_token,
        handlers::accounts::search,
        handlers::accounts::signup,
        handlers::accounts::update,
        handlers::accounts::request_verification,
        handlers::accounts::confirm_verification,
        handlers::password::request_reset,
        handlers::password::confirm_reset,
        handlers::password::confirm_setup,
        handlers::buildings::list,
        handlers::buildings::search,
        handlers::buildings::create,
        handlers::buildings::update,
        handlers::buildings::assign,
        handlers::amenities::list,
        handlers::amenities::find,
        handlers::amenities::create,
        handlers::amenities::update,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::accounts::SignupRequest,
            dtos::accounts::UpdateAccountRequest,
            dtos::accounts::VerificationRequest,
            dtos::session::SignInRequest,
            dtos::session::AccessTokenResponse,
            dtos::password::PasswordResetRequest,
            dtos::password::PasswordResetConfirm,
            dtos::password::AccountSetupConfirm,
            dtos::buildings::CreateBuildingRequest,
            dtos::buildings::UpdateBuildingRequest,
            dtos::buildings::CreateAmenityRequest,
            dtos::buildings::UpdateAmenityRequest,
            dtos::buildings::AssignBuildingResponse,
            models::AccountResponse,
            models::AccountType,
            models::RoleFlags,
            models::ActorStamp,
            models::AssignedBuilding,
            models::FieldChange,
            models::Building,
            models::Amenity,
            models::AuditRecord,
            models::AuditAction,
            models::AuditOutcome,
            models::ImpactedAccount,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service liveness and database health"),
        (name = "Session", description = "Sign-in and token refresh"),
        (name = "Accounts", description = "Account administration and email verification"),
        (name = "Password", description = "Password reset and account setup links"),
        (name = "Buildings", description = "Building records and account assignment"),
        (name = "Amenities", description = "Amenities nested under buildings"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Shared application state. `db` is absent in tests, which run on the
/// in-memory store implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: BmsConfig,
    pub accounts: AccountService,
    pub buildings: BuildingService,
    pub account_store: Arc<dyn AccountStore>,
    pub tokens: TokenService,
    pub db: Option<MongoDb>,
}

pub fn build_router(state: AppState) -> Router {
    // Admin routes: auth resolves the account, then the admin gate checks
    // its tier. The last layer added runs first.
    let admin_routes = Router::new()
        .route("/admin/user/search/:id", get(handlers::accounts::search))
        .route("/admin/user/signup", post(handlers::accounts::signup))
        .route("/admin/user/update/:id", put(handlers::accounts::update))
        .route("/admin/building/list", get(handlers::buildings::list))
        .route(
            "/admin/building/search/:id",
            get(handlers::buildings::search),
        )
        .route("/admin/building/create", post(handlers::buildings::create))
        .route(
            "/admin/building/update/:id",
            put(handlers::buildings::update),
        )
        .route(
            "/admin/building/assign/:account_id/:building_id",
            put(handlers::buildings::assign),
        )
        .layer(from_fn(middleware::admin_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    // Routes any signed-in account may use.
    let account_routes = Router::new()
        .route(
            "/account/verification/request",
            post(handlers::accounts::request_verification),
        )
        .route(
            "/building/:building_id/amenities/search",
            get(handlers::amenities::list),
        )
        .route(
            "/building/:building_id/amenities/search/:amenity_id",
            get(handlers::amenities::find),
        )
        .route(
            "/building/:building_id/amenities/create",
            put(handlers::amenities::create),
        )
        .route(
            "/building/:building_id/amenities/update/:amenity_id",
            put(handlers::amenities::update),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/", get(handlers::health::online))
        .route("/health", get(handlers::health::health_check));

    if state.config.swagger.enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    } else {
        // UI off, but keep the document available for tooling.
        app = app.route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .map(|origin| {
                    origin.parse::<HeaderValue>().unwrap_or_else(|e| {
                        tracing::error!("Invalid CORS origin '{}': {}. Using fallback.", origin, e);
                        HeaderValue::from_static("*")
                    })
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    app.route("/signin", post(handlers::session::sign_in))
        .route("/refreshToken", get(handlers::session::refresh_token))
        .route(
            "/verification",
            get(handlers::accounts::confirm_verification),
        )
        .route(
            "/account/setup/confirm",
            post(handlers::password::confirm_setup),
        )
        .route(
            "/password/reset/request",
            post(handlers::password::request_reset),
        )
        .route(
            "/password/reset/confirm",
            post(handlers::password::confirm_reset),
        )
        .merge(account_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(cors)
}
