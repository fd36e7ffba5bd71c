/*!
 * Application Configuration
 * Everything the server reads from the environment, collected once at startup
 */
use std::path::PathBuf;

use bcrypt::{hash, DEFAULT_COST};

use crate::db::DbConfig;

/// Placeholder secret that production refuses to run with
pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

/// Runtime configuration for the whole service
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// `None` runs the in-memory store
    pub database: Option<DbConfig>,
    pub auth: AuthConfig,
    pub upload_dir: PathBuf,
    /// Prefix used when building public URLs for uploaded files
    pub public_base_url: String,
    pub allowed_origins: Vec<String>,
}

/// Admin identity and token settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub refresh_secret: String,
    pub admin_email: String,
    pub admin_password_hash: String,
    /// Principal id issued in tokens; also the owner key of the profile row
    pub admin_user_id: String,
    /// Seconds between login attempts from one IP, 0 disables the limit
    pub login_rate_limit_secs: i64,
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env_or("JWT_SECRET", DEFAULT_JWT_SECRET);
        let refresh_secret = env_or("REFRESH_TOKEN_SECRET", &jwt_secret);

        // ADMIN_HASH_PASSWORD wins over a plain ADMIN_PASSWORD
        let admin_password_hash = if let Ok(hashed) = std::env::var("ADMIN_HASH_PASSWORD") {
            hashed
        } else {
            let plain = env_or("ADMIN_PASSWORD", "admin123");
            hash(plain, DEFAULT_COST).unwrap_or_default()
        };

        Self {
            jwt_secret,
            refresh_secret,
            admin_email: env_or("ADMIN_EMAIL", "admin@example.com"),
            admin_password_hash,
            admin_user_id: env_or("ADMIN_USER_ID", "site-owner"),
            login_rate_limit_secs: env_parse("LOGIN_RATE_LIMIT_SECS", 60),
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host = env_or("HOST", "127.0.0.1");
        let port = env_parse("PORT", 3001);

        let allowed_origins: Vec<String> = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .filter(|origins: &Vec<String>| !origins.is_empty())
            .or_else(|| std::env::var("FRONTEND_ORIGIN").ok().map(|o| vec![o]))
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Self {
            public_base_url: env_or("PUBLIC_BASE_URL", &format!("http://{}:{}", host, port)),
            host,
            port,
            environment: env_or("ENVIRONMENT", "development"),
            database: std::env::var("DATABASE_URL").ok().map(|_| DbConfig::default()),
            auth: AuthConfig::from_env(),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            allowed_origins,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Configuration for tests and local tooling: memory store, fixed secrets,
    /// no login rate limit.
    pub fn for_tests(admin_email: &str, admin_password_hash: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            database: None,
            auth: AuthConfig {
                jwt_secret: "test-secret".to_string(),
                refresh_secret: "test-refresh-secret".to_string(),
                admin_email: admin_email.to_string(),
                admin_password_hash: admin_password_hash.to_string(),
                admin_user_id: "site-owner".to_string(),
                login_rate_limit_secs: 0,
            },
            upload_dir: PathBuf::from("uploads"),
            public_base_url: "http://localhost:3001".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}
