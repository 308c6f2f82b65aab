//! Bearer-token authentication
//!
//! Access tokens (15 minutes) travel in the `Authorization` header; refresh
//! tokens (7 days) live in an HTTP-only cookie and are signed with a
//! separate secret, so one can never stand in for the other.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::AppState;

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub id: i64,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// The authenticated caller, inserted into request extensions by `require_user`
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i64,
}

/// Signing and verification keys for both token kinds
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
        }
    }

    /// Sign a token of `kind` for `user_id` as if issued at `issued_at`
    pub fn sign_at(
        &self,
        kind: TokenKind,
        user_id: i64,
        issued_at: DateTime<Utc>,
    ) -> jsonwebtoken::errors::Result<String> {
        let (ttl, key) = match kind {
            TokenKind::Access => (
                Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
                &self.access_encoding,
            ),
            TokenKind::Refresh => (
                Duration::days(REFRESH_TOKEN_TTL_DAYS),
                &self.refresh_encoding,
            ),
        };
        let claims = Claims {
            id: user_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, key)
    }

    pub fn sign(&self, kind: TokenKind, user_id: i64) -> jsonwebtoken::errors::Result<String> {
        self.sign_at(kind, user_id, Utc::now())
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, kind: TokenKind, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, key, &validation).map(|data| data.claims)
    }
}

/// `Set-Cookie` value storing a refresh token
pub fn refresh_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        REFRESH_COOKIE,
        token,
        REFRESH_TOKEN_TTL_DAYS * 24 * 60 * 60
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the refresh token
pub fn clear_refresh_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", REFRESH_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Read a cookie value from the request headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

/// Authentication middleware for protected routes
///
/// Rejections, in order: no bearer header (401), empty or `null` token (401),
/// bad signature or expired (403), unknown user (404).
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let token = match request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        Some(token) => token.trim().to_string(),
        None => {
            debug!(path = %path, "Request without bearer token");
            return reject(StatusCode::UNAUTHORIZED, "Access denied. No token provided.");
        }
    };

    if token.is_empty() || token == "null" {
        return reject(StatusCode::UNAUTHORIZED, "Invalid token.");
    }

    let claims = match state.tokens.verify(TokenKind::Access, &token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(path = %path, error = %e, "Token verification failed");
            return reject(StatusCode::FORBIDDEN, "Invalid or expired token.");
        }
    };

    match state.db.get_user(claims.id) {
        Ok(Some(user)) => {
            request.extensions_mut().insert(AuthUser { id: user.id });
            next.run(request).await
        }
        Ok(None) => {
            warn!(user_id = claims.id, path = %path, "Token for unknown user");
            reject(StatusCode::NOT_FOUND, "User not found.")
        }
        Err(e) => {
            error!(error = %e, "User lookup failed during authentication");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server error during authentication.",
            )
        }
    }
}
