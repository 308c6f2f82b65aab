//! Spendwise Web Server
//!
//! Axum-based REST API for the Spendwise expense tracker.
//!
//! Security features:
//! - Short-lived bearer access tokens with an HTTP-only refresh cookie
//! - Per-user ownership checks on every expense mutation
//! - Per-IP rate limiting on the AI insight endpoint
//! - Restrictive CORS policy and security headers
//! - Sanitized error responses

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use spendwise_core::ai::{AIBackend, AIClient};
use spendwise_core::db::Database;
use spendwise_core::insights::{InsightCache, InsightComposer, DEFAULT_TTL};

pub mod auth;
mod handlers;
pub mod rate_limit;
mod scheduler;

pub use auth::{AuthUser, TokenKeys, TokenKind};
pub use rate_limit::{RateDecision, RateLimiter};
pub use scheduler::{run_housekeeping, start_janitor, JanitorConfig};

/// Origin allowed by default (local frontend dev server)
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Default AI insight requests per client per window
pub const DEFAULT_AI_RATE_LIMIT: u32 = 10;

/// Default AI insight rate-limit window (15 minutes)
pub const DEFAULT_AI_RATE_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
    /// Mark the refresh cookie `Secure` (disable only for plain-HTTP local dev)
    pub secure_cookies: bool,
    /// HS256 secret for access tokens
    pub access_token_secret: String,
    /// HS256 secret for refresh tokens
    pub refresh_token_secret: String,
    /// Requests per client IP allowed on `/ai-insights` per window
    pub ai_rate_limit: u32,
    pub ai_rate_window: Duration,
    /// How long generated insights are reused
    pub insight_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            secure_cookies: true,
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            ai_rate_limit: DEFAULT_AI_RATE_LIMIT,
            ai_rate_window: DEFAULT_AI_RATE_WINDOW,
            insight_ttl: DEFAULT_TTL,
        }
    }
}

impl ServerConfig {
    /// Read configuration from environment variables
    ///
    /// - `ACCESS_TOKEN_SECRET`, `REFRESH_TOKEN_SECRET`
    /// - `SPENDWISE_ALLOWED_ORIGINS` (comma-separated)
    /// - `SPENDWISE_SECURE_COOKIES` (`false`/`0` to disable)
    /// - `SPENDWISE_AI_RATE_LIMIT`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secret) = lookup("ACCESS_TOKEN_SECRET") {
            config.access_token_secret = secret;
        }
        if let Some(secret) = lookup("REFRESH_TOKEN_SECRET") {
            config.refresh_token_secret = secret;
        }

        if let Some(origins) = lookup("SPENDWISE_ALLOWED_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !origins.is_empty() {
                config.allowed_origins = origins;
            }
        }

        if let Some(secure) = lookup("SPENDWISE_SECURE_COOKIES") {
            config.secure_cookies = !matches!(
                secure.trim().to_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }

        if let Some(limit) = lookup("SPENDWISE_AI_RATE_LIMIT") {
            match limit.trim().parse::<u32>() {
                Ok(v) if v > 0 => config.ai_rate_limit = v,
                _ => warn!(
                    "Invalid SPENDWISE_AI_RATE_LIMIT '{}', using {}",
                    limit, DEFAULT_AI_RATE_LIMIT
                ),
            }
        }

        config
    }

    /// Both token secrets must be set before serving
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.access_token_secret.is_empty() {
            anyhow::bail!("ACCESS_TOKEN_SECRET must be set");
        }
        if self.refresh_token_secret.is_empty() {
            anyhow::bail!("REFRESH_TOKEN_SECRET must be set");
        }
        // Credentialed CORS needs explicit origins
        if self.allowed_origins.iter().any(|o| o == "*") {
            anyhow::bail!("SPENDWISE_ALLOWED_ORIGINS must list origins explicitly, not '*'");
        }
        for origin in &self.allowed_origins {
            if origin.parse::<HeaderValue>().is_err() {
                anyhow::bail!("Invalid origin in SPENDWISE_ALLOWED_ORIGINS: {}", origin);
            }
        }
        Ok(())
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub tokens: TokenKeys,
    /// AI insight composer with its per-user cache
    pub composer: InsightComposer,
    pub ai_limiter: RateLimiter,
}

/// Build shared state from a database, configuration and text generator
pub fn build_state(db: Database, config: ServerConfig, ai: AIClient) -> Arc<AppState> {
    let tokens = TokenKeys::new(&config.access_token_secret, &config.refresh_token_secret);
    let cache = Arc::new(InsightCache::new(config.insight_ttl));
    let composer = InsightComposer::with_cache(db.clone(), ai, cache);
    let ai_limiter = RateLimiter::new(config.ai_rate_limit, config.ai_rate_window);

    Arc::new(AppState {
        db,
        config,
        tokens,
        composer,
        ai_limiter,
    })
}

/// Create the router using the text generator configured in the environment
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    create_router_with_ai(db, config, AIClient::from_env())
}

/// Create the router with an explicit text generator
pub fn create_router_with_ai(db: Database, config: ServerConfig, ai: AIClient) -> Router {
    router_from_state(build_state(db, config, ai))
}

/// Create the router over existing state
pub fn router_from_state(state: Arc<AppState>) -> Router {
    let require_user = || middleware::from_fn_with_state(state.clone(), auth::require_user);

    let public_routes = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/signup", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh-token", post(handlers::refresh_token))
        .route("/auth/logout", post(handlers::logout));

    let protected_routes = Router::new()
        .route("/auth/user", get(handlers::current_user))
        .route("/protected", get(handlers::protected))
        // Expenses
        .route("/expense", get(handlers::list_expenses))
        .route("/expense/add", post(handlers::add_expense))
        .route("/expense/update/:id", put(handlers::update_expense))
        .route("/expense/delete/:id", delete(handlers::delete_expense))
        // Budgets
        .route("/budget/set", post(handlers::set_budget))
        .route("/budget/alert", get(handlers::budget_alert))
        .route("/budget/:period", get(handlers::get_budget))
        // Analytics
        .route(
            "/analytics/monthly-summary",
            get(handlers::monthly_summary),
        )
        .route(
            "/analytics/category-breakdown",
            get(handlers::category_breakdown),
        )
        // Insights
        .route("/insights", get(handlers::financial_insights))
        // Reports
        .route("/reports/csv", get(handlers::export_csv))
        .route("/reports/pdf", get(handlers::export_pdf))
        .route_layer(require_user());

    // The limiter wraps authentication so rejected tokens still count
    let ai_routes = Router::new()
        .route("/ai-insights", get(handlers::ai_insights))
        .route_layer(require_user())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_ai_requests,
        ));

    let api_routes = public_routes.merge(protected_routes).merge(ai_routes);

    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    // JSON and file downloads only, nothing to render
    let csp_value = HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'");

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ))
}

/// Start the server with configuration from the environment
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::from_env()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    config.validate()?;

    if !config.secure_cookies {
        warn!("⚠️  Refresh cookies are not marked Secure - do not expose to network!");
    }

    let ai = AIClient::from_env();
    check_ai_connection(&ai).await;

    let state = build_state(db, config, ai);

    if let Some(janitor) = JanitorConfig::from_env() {
        start_janitor(state.clone(), janitor);
    }

    let app = router_from_state(state)
        .into_make_service_with_connect_info::<std::net::SocketAddr>();
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log text generator connection status
async fn check_ai_connection(client: &AIClient) {
    if client.health_check().await {
        info!(
            "✅ AI backend connected: {} (model: {})",
            client.host(),
            client.model()
        );
    } else {
        warn!(
            "⚠️  AI backend not responding: {} (model: {}) - /api/ai-insights will fail until it is",
            client.host(),
            client.model()
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Message returned when the text generator fails without saying why
pub const INSIGHT_FAILURE_MESSAGE: &str = "Error generating financial insights";

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn forbidden(msg: &str) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, msg)
    }

    /// 500 with a generic client message; the cause is only logged
    pub fn internal<E: Into<anyhow::Error>>(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "message": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<spendwise_core::Error> for AppError {
    fn from(err: spendwise_core::Error) -> Self {
        use spendwise_core::Error;

        match err {
            Error::Validation(msg) | Error::Conflict(msg) => Self::bad_request(&msg),
            Error::Unauthorized(msg) => Self::unauthorized(&msg),
            Error::Forbidden(msg) => Self::forbidden(&msg),
            Error::NotFound(msg) => Self::not_found(&msg),
            Error::Upstream { status, message } => {
                let status = status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                let message = if message.trim().is_empty() {
                    INSIGHT_FAILURE_MESSAGE.to_string()
                } else {
                    message
                };
                warn!(status = %status, error = %message, "Text generator failed");
                Self {
                    status,
                    message,
                    internal: None,
                }
            }
            other => Self::internal(other),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::internal(err)
    }
}

#[cfg(test)]
mod tests;
