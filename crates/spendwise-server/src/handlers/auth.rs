//! Authentication-related handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{
    clear_refresh_cookie, read_cookie, refresh_cookie, AuthUser, TokenKind, REFRESH_COOKIE,
};
use crate::{AppError, AppState};
use spendwise_core::auth::{hash_password, verify_password};
use spendwise_core::budget::resolve_budget_amount;

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Optional default budget used until a period budget is set
    pub budget: Option<Decimal>,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub email: String,
    pub budget: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: &'static str,
    pub access_token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: &'static str,
    pub access_token: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

/// POST /api/auth/register - Create an account and sign in
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let (Some(name), Some(email), Some(password)) = (
        required(body.name),
        required(body.email),
        required(body.password),
    ) else {
        return Err(AppError::bad_request("All fields are required"));
    };

    if state.db.get_user_by_email(&email)?.is_some() {
        return Err(AppError::bad_request("User already exists"));
    }

    let hash = hash_password(&password)?;
    let user = state
        .db
        .create_user_with_budget(&name, &email, &hash, body.budget)?;

    let access_token = state.tokens.sign(TokenKind::Access, user.id)?;
    let refresh_token = state.tokens.sign(TokenKind::Refresh, user.id)?;

    info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        [(
            header::SET_COOKIE,
            refresh_cookie(&refresh_token, state.config.secure_cookies),
        )],
        Json(RegisterResponse {
            message: "User registered successfully",
            access_token,
            user: UserSummary {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        }),
    )
        .into_response())
}

/// POST /api/auth/login - Exchange credentials for tokens
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let (Some(email), Some(password)) = (required(body.email), required(body.password)) else {
        return Err(AppError::bad_request("All fields are required"));
    };

    let Some(creds) = state.db.get_user_credentials_by_email(&email)? else {
        warn!("Login attempt for unknown email");
        return Err(AppError::bad_request("Invalid credentials"));
    };

    if !verify_password(&password, &creds.password_hash)? {
        warn!(user_id = creds.user.id, "Login attempt with wrong password");
        return Err(AppError::bad_request("Invalid credentials"));
    }

    let user = creds.user;
    let stored = state.db.get_primary_budget(user.id)?.map(|b| b.amount);
    let budget = resolve_budget_amount(stored, user.default_budget).unwrap_or(Decimal::ZERO);

    let access_token = state.tokens.sign(TokenKind::Access, user.id)?;
    let refresh_token = state.tokens.sign(TokenKind::Refresh, user.id)?;

    info!(user_id = user.id, "User logged in");

    Ok((
        [(
            header::SET_COOKIE,
            refresh_cookie(&refresh_token, state.config.secure_cookies),
        )],
        Json(LoginResponse {
            message: "Login successful",
            access_token,
            user: LoginUser {
                id: user.id,
                name: user.name,
                email: user.email,
                budget,
            },
        }),
    )
        .into_response())
}

/// POST /api/auth/refresh-token - Issue a new access token from the refresh cookie
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, AppError> {
    let token = read_cookie(&headers, REFRESH_COOKIE)
        .ok_or_else(|| AppError::forbidden("No refresh token provided"))?;

    let claims = state
        .tokens
        .verify(TokenKind::Refresh, &token)
        .map_err(|e| {
            warn!(error = %e, "Refresh token rejected");
            AppError::forbidden("Invalid refresh token")
        })?;

    if state.db.get_user(claims.id)?.is_none() {
        return Err(AppError::forbidden("Invalid refresh token"));
    }

    Ok(Json(RefreshResponse {
        access_token: state.tokens.sign(TokenKind::Access, claims.id)?,
    }))
}

/// POST /api/auth/logout - Clear the refresh cookie
pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    (
        [(
            header::SET_COOKIE,
            clear_refresh_cookie(state.config.secure_cookies),
        )],
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}

/// GET /api/auth/user - The authenticated user's profile
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserSummary>, AppError> {
    let user = state
        .db
        .get_user(auth.id)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserSummary {
        id: user.id,
        name: user.name,
        email: user.email,
    }))
}

/// GET /api/protected - Authentication smoke test
pub async fn protected(Extension(_auth): Extension<AuthUser>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "You have accessed a protected route!" }))
}
