/**
 * Authentication Routes
 * JWT-based authentication for the site owner: login, verify, refresh, logout
 */
use axum::{
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, net::SocketAddr};
use tokio::sync::RwLock;

use crate::config::AuthConfig;
use crate::content::entity::is_valid_email;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Access token expiry in minutes
const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Refresh token expiry in days
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// The only role this service issues
pub const ADMIN_ROLE: &str = "admin";

// ============================================================================
// Types
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,   // Owner id
    pub email: String, // Owner email
    pub role: String,  // Always "admin"
    pub exp: i64,      // Expiry timestamp
    pub iat: i64,      // Issued at timestamp
}

/// Stored refresh token data
#[derive(Debug, Clone)]
pub struct RefreshTokenData {
    pub user_id: String,
    pub email: String,
    pub expires_at: i64,
    pub revoked: bool,
}

/// User info returned to frontend
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

impl From<Claims> for UserInfo {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserInfo,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub is_valid: bool,
    pub user: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============================================================================
// Auth service
// ============================================================================

/// Token issuing and checking for the single admin principal.
/// Refresh tokens live in memory, keyed by their SHA-256 hash.
pub struct AuthService {
    config: AuthConfig,
    refresh_tokens: RwLock<HashMap<String, RefreshTokenData>>,
    /// IP -> timestamp of the last login attempt
    rate_limit: RwLock<HashMap<String, i64>>,
}

/// Generate a random refresh token
fn generate_refresh_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 64)
}

/// Hash a refresh token for storage: SHA-256 keyed with the refresh secret
fn hash_refresh_token(secret: &str, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update([0u8]);
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            refresh_tokens: RwLock::new(HashMap::new()),
            rate_limit: RwLock::new(HashMap::new()),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.config.admin_user_id
    }

    pub fn create_access_token(&self, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES);

        let claims = Claims {
            sub: self.config.admin_user_id.clone(),
            email: email.to_string(),
            role: ADMIN_ROLE.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
    }

    /// Verify and decode access token
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Check rate limit for an IP.
    ///
    /// Expired entries are evicted on every write so the map only holds active IPs.
    async fn check_rate_limit(&self, ip: &str) -> bool {
        let window = self.config.login_rate_limit_secs;
        if window <= 0 {
            return true;
        }

        let now = Utc::now().timestamp();
        let mut limits = self.rate_limit.write().await;
        limits.retain(|_, last| now - *last < window);

        if limits.contains_key(ip) {
            return false;
        }
        limits.insert(ip.to_string(), now);
        true
    }

    /// Compare against the configured admin credentials. bcrypt runs off the executor.
    async fn check_credentials(&self, email: &str, password: &str) -> bool {
        if !email.eq_ignore_ascii_case(&self.config.admin_email) {
            return false;
        }
        let password = password.to_string();
        let hash = self.config.admin_password_hash.clone();
        tokio::task::spawn_blocking(move || verify(&password, &hash).unwrap_or(false))
            .await
            .unwrap_or(false)
    }

    async fn issue_refresh_token(&self, email: &str) -> String {
        let token = generate_refresh_token();
        let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS);
        self.refresh_tokens.write().await.insert(
            hash_refresh_token(&self.config.refresh_secret, &token),
            RefreshTokenData {
                user_id: self.config.admin_user_id.clone(),
                email: email.to_string(),
                expires_at: expires_at.timestamp(),
                revoked: false,
            },
        );
        token
    }

    /// Revoke `token` and hand out a replacement, if it is still valid
    async fn rotate_refresh_token(&self, token: &str) -> Option<(RefreshTokenData, String)> {
        let token_hash = hash_refresh_token(&self.config.refresh_secret, token);
        let now = Utc::now();
        let data = {
            let mut tokens = self.refresh_tokens.write().await;
            tokens.retain(|_, data| data.expires_at > now.timestamp());
            let data = tokens.get_mut(&token_hash)?;
            if data.revoked {
                return None;
            }
            data.revoked = true;
            data.clone()
        };
        let replacement = self.issue_refresh_token(&data.email).await;
        Some((data, replacement))
    }

    async fn revoke_refresh_token(&self, token: &str) {
        let token_hash = hash_refresh_token(&self.config.refresh_secret, token);
        if let Some(data) = self.refresh_tokens.write().await.get_mut(&token_hash) {
            data.revoked = true;
        }
    }

    async fn revoke_all_for(&self, user_id: &str) {
        for data in self.refresh_tokens.write().await.values_mut() {
            if data.user_id == user_id {
                data.revoked = true;
            }
        }
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// A request carrying a valid admin access token
#[derive(Debug, Clone)]
pub struct AdminSession(pub Claims);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authorization required".to_string()))?;

        let claims = state.auth.verify_access_token(&token).map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        if claims.role != ADMIN_ROLE || claims.sub != state.auth.owner_id() {
            return Err(ApiError::Unauthorized("Invalid or expired token".to_string()));
        }
        Ok(AdminSession(claims))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let ip = addr.ip().to_string();

    if !state.auth.check_rate_limit(&ip).await {
        tracing::warn!("Login rate limit hit for {}", ip);
        return Err(ApiError::TooManyRequests);
    }

    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    if !is_valid_email(email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }

    if !state.auth.check_credentials(email, &payload.password).await {
        tracing::warn!("Failed login attempt for: {}", email);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let access_token = state
        .auth
        .create_access_token(email)
        .map_err(|e| ApiError::internal("failed to create access token", e))?;
    let refresh_token = state.auth.issue_refresh_token(email).await;

    tracing::info!("Successful login for user: {}", email);

    Ok(Json(LoginResponse {
        success: true,
        user: UserInfo {
            user_id: state.auth.owner_id().to_string(),
            email: email.to_string(),
            role: ADMIN_ROLE.to_string(),
        },
        access_token,
        refresh_token,
    }))
}

/// POST /api/auth/verify
/// Always 200; the body says whether the bearer token is valid
pub async fn verify_token(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return Json(VerifyResponse {
            success: false,
            is_valid: false,
            user: None,
            error: Some("No authorization token provided".to_string()),
        });
    };

    match state.auth.verify_access_token(&token) {
        Ok(claims) => Json(VerifyResponse {
            success: true,
            is_valid: true,
            user: Some(claims.into()),
            error: None,
        }),
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            Json(VerifyResponse {
                success: false,
                is_valid: false,
                user: None,
                error: Some("Invalid or expired token".to_string()),
            })
        }
    }
}

/// POST /api/auth/refresh
/// Exchange a refresh token for a new access token; the refresh token is rotated
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    if payload.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("Refresh token is required".to_string()));
    }

    let (data, refresh_token) = state
        .auth
        .rotate_refresh_token(&payload.refresh_token)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    let access_token = state
        .auth
        .create_access_token(&data.email)
        .map_err(|e| ApiError::internal("failed to create access token", e))?;

    Ok(Json(RefreshResponse {
        success: true,
        access_token,
        refresh_token,
    }))
}

/// POST /api/auth/logout
/// Revokes the given refresh token, or every refresh token of the bearer. Always succeeds.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LogoutRequest>,
) -> (StatusCode, Json<LogoutResponse>) {
    if let Some(refresh_token) = payload.refresh_token {
        state.auth.revoke_refresh_token(&refresh_token).await;
    }

    if let Some(access_token) = payload
        .access_token
        .or_else(|| extract_bearer_token(&headers))
    {
        if let Ok(claims) = state.auth.verify_access_token(&access_token) {
            state.auth.revoke_all_for(&claims.sub).await;
        }
    }

    (StatusCode::OK, Json(LogoutResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    const EMAIL: &str = "owner@example.com";
    const PASSWORD: &str = "correct horse";

    fn test_state(rate_limit_secs: i64) -> AppState {
        let hash = bcrypt::hash(PASSWORD, 4).unwrap();
        let mut config = AppConfig::for_tests(EMAIL, &hash);
        config.auth.login_rate_limit_secs = rate_limit_secs;
        AppState::in_memory(config)
    }

    async fn whoami(AdminSession(claims): AdminSession) -> String {
        claims.sub
    }

    fn auth_router(state: AppState) -> Router {
        Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/verify", post(verify_token))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/logout", post(logout))
            .route("/whoami", get(whoami))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 12345))))
            .with_state(state)
    }

    async fn post_json(
        app: Router,
        uri: &str,
        json: &impl serde::Serialize,
    ) -> (StatusCode, axum::body::Bytes) {
        let body = Body::from(serde_json::to_vec(json).unwrap());
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    async fn login_ok(app: Router) -> LoginResponse {
        let (status, bytes) = post_json(
            app,
            "/api/auth/login",
            &LoginRequest {
                email: EMAIL.to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_refresh_hash_is_keyed_by_secret() {
        let token = generate_refresh_token();
        assert_eq!(
            hash_refresh_token("secret-a", &token),
            hash_refresh_token("secret-a", &token)
        );
        assert_ne!(
            hash_refresh_token("secret-a", &token),
            hash_refresh_token("secret-b", &token)
        );
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_under_another_secret() {
        let state = test_state(0);
        let token = state.auth.issue_refresh_token(EMAIL).await;

        let mut other = state.config.auth.clone();
        other.refresh_secret = "rotated-refresh-secret".to_string();
        let rotated = AuthService::new(other);
        *rotated.refresh_tokens.write().await = state.auth.refresh_tokens.read().await.clone();

        assert!(rotated.rotate_refresh_token(&token).await.is_none());
        assert!(state.auth.rotate_refresh_token(&token).await.is_some());
    }

    #[tokio::test]
    async fn test_login_empty_email_returns_bad_request() {
        let (status, _) = post_json(
            auth_router(test_state(0)),
            "/api/auth/login",
            &LoginRequest {
                email: "".to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_invalid_email_format_returns_bad_request() {
        let (status, _) = post_json(
            auth_router(test_state(0)),
            "/api/auth/login",
            &LoginRequest {
                email: "no-at-sign".to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_wrong_credentials_returns_unauthorized() {
        let (status, _) = post_json(
            auth_router(test_state(0)),
            "/api/auth/login",
            &LoginRequest {
                email: EMAIL.to_string(),
                password: "wrongpassword".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_issues_tokens_for_owner() {
        let state = test_state(0);
        let body = login_ok(auth_router(state.clone())).await;
        assert!(body.success);
        assert_eq!(body.user.user_id, "site-owner");
        assert_eq!(body.refresh_token.len(), 64);

        let claims = state.auth.verify_access_token(&body.access_token).unwrap();
        assert_eq!(claims.email, EMAIL);
        assert_eq!(claims.role, ADMIN_ROLE);
    }

    #[tokio::test]
    async fn test_login_is_rate_limited_per_ip() {
        let app = auth_router(test_state(60));
        let wrong = LoginRequest {
            email: EMAIL.to_string(),
            password: "nope".to_string(),
        };
        let (first, _) = post_json(app.clone(), "/api/auth/login", &wrong).await;
        assert_eq!(first, StatusCode::UNAUTHORIZED);
        let (second, _) = post_json(app, "/api/auth/login", &wrong).await;
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_verify_no_token_returns_error_in_body() {
        let req = Request::post("/api/auth/verify").body(Body::empty()).unwrap();
        let res = auth_router(test_state(0)).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: VerifyResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert!(!body.is_valid);
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let app = auth_router(test_state(0));
        let tokens = login_ok(app.clone()).await;

        let request = RefreshRequest {
            refresh_token: tokens.refresh_token.clone(),
        };
        let (status, bytes) = post_json(app.clone(), "/api/auth/refresh", &request).await;
        assert_eq!(status, StatusCode::OK);
        let rotated: RefreshResponse = serde_json::from_slice(&bytes).unwrap();
        assert_ne!(rotated.refresh_token, tokens.refresh_token);

        // The old token is spent
        let (status, _) = post_json(app, "/api/auth/refresh", &request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_empty_token_returns_bad_request() {
        let (status, _) = post_json(
            auth_router(test_state(0)),
            "/api/auth/refresh",
            &RefreshRequest {
                refresh_token: "".to_string(),
            },
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_tokens() {
        let app = auth_router(test_state(0));
        let tokens = login_ok(app.clone()).await;

        let (status, bytes) = post_json(
            app.clone(),
            "/api/auth/logout",
            &LogoutRequest {
                access_token: Some(tokens.access_token),
                refresh_token: None,
            },
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: LogoutResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.success);

        let (status, _) = post_json(
            app,
            "/api/auth/refresh",
            &RefreshRequest {
                refresh_token: tokens.refresh_token,
            },
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_session_requires_valid_bearer() {
        let state = test_state(0);
        let app = auth_router(state.clone());

        let res = app
            .clone()
            .oneshot(Request::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let token = state.auth.create_access_token(EMAIL).unwrap();
        let res = app
            .oneshot(
                Request::get("/whoami")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
