use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Database configuration
    pub database_url: String,
    pub database_max_connections: u32,

    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry: i64,
    pub session_cookie_name: String,
    pub login_url: String,

    // Media configuration
    pub media_root: String,
    pub media_url: String,
    pub max_upload_size: usize,
    pub allowed_image_types: String,

    // Page cache
    pub index_cache_ttl: u64,

    // Content settings
    pub default_posts_per_page: usize,
    pub default_group_posts_per_page: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            environment: "development".to_string(),
            log_level: "info".to_string(),

            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 5,

            jwt_secret: "development-secret".to_string(),
            jwt_expiry: 60 * 60 * 24 * 14,
            session_cookie_name: "rainbow_session".to_string(),
            login_url: "/auth/login/".to_string(),

            media_root: "media".to_string(),
            media_url: "/media".to_string(),
            max_upload_size: 5 * 1024 * 1024,
            allowed_image_types: "jpeg,jpg,png,gif,webp".to_string(),

            index_cache_ttl: 20,

            default_posts_per_page: 10,
            default_group_posts_per_page: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == "production" => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            Err(_) => defaults.jwt_secret,
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),

            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,

            jwt_secret,
            jwt_expiry: env::var("JWT_EXPIRY")
                .unwrap_or_else(|_| defaults.jwt_expiry.to_string())
                .parse()?,
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            login_url: env::var("LOGIN_URL").unwrap_or(defaults.login_url),

            media_root: env::var("MEDIA_ROOT").unwrap_or(defaults.media_root),
            media_url: env::var("MEDIA_URL").unwrap_or(defaults.media_url),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .unwrap_or_else(|_| "5242880".to_string())
                .parse()?,
            allowed_image_types: env::var("ALLOWED_IMAGE_TYPES")
                .unwrap_or(defaults.allowed_image_types),

            index_cache_ttl: env::var("INDEX_CACHE_TTL")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            default_posts_per_page: env::var("DEFAULT_POSTS_PER_PAGE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            default_group_posts_per_page: env::var("DEFAULT_GROUP_POSTS_PER_PAGE")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否为内存数据库（内存库只能使用单连接）
    pub fn is_in_memory_database(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}
