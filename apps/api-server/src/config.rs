//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use merpati_infra::DatabaseConfig;
use merpati_infra::auth::{DEFAULT_SECRET, JwtConfig};

/// Cloudinary credentials and upload settings.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub timeout: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub media: Option<MediaConfig>,
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Unset and blank are treated alike.
fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = non_empty("DATABASE_URL").map(|url| DatabaseConfig {
            max_connections: parsed("DB_MAX_CONNECTIONS", 100),
            min_connections: parsed("DB_MIN_CONNECTIONS", 10),
            ..DatabaseConfig::new(url)
        });

        let jwt = JwtConfig {
            secret: non_empty("JWT_SECRET").unwrap_or_else(|| DEFAULT_SECRET.to_string()),
            expiration_hours: parsed("JWT_EXPIRATION_HOURS", 72),
            issuer: non_empty("JWT_ISSUER").unwrap_or_else(|| "merpati-api".to_string()),
        };

        let media = match (
            non_empty("CLOUDINARY_CLOUD_NAME"),
            non_empty("CLOUDINARY_API_KEY"),
            non_empty("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(MediaConfig {
                cloud_name,
                api_key,
                api_secret,
                folder: non_empty("CLOUDINARY_FOLDER")
                    .unwrap_or_else(|| "article-project".to_string()),
                timeout: Duration::from_secs(parsed("UPLOAD_TIMEOUT_SECS", 10)),
            }),
            _ => None,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT", 8080),
            environment: env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()),
            database,
            jwt,
            media,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
