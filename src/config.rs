use anyhow::Result;
use sea_orm::Database;

use crate::auth::AuthConfig;
use crate::schemas::AppState;

/// Runtime configuration, read from the environment at process start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    /// Whether the two demo seed accounts may log in via literal credential
    /// comparison. On by default for demo parity; turn off in any real
    /// deployment.
    pub seed_logins_enabled: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: database_url_from_env(),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "bookstore-dev-secret".to_string()),
            seed_logins_enabled: std::env::var("SEED_LOGINS")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        }
    }
}

/// Resolve the database URL: an explicit DATABASE_URL wins, otherwise a MySQL
/// URL is assembled from the individual DB_* variables.
pub fn database_url_from_env() -> String {
    dotenvy::dotenv().ok();

    if let Ok(url) = std::env::var("DATABASE_URL") {
        return url;
    }

    let host = std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
    let user = std::env::var("DB_USER").unwrap_or_else(|_| "root".to_string());
    let pass = std::env::var("DB_PASS").unwrap_or_default();
    let name = std::env::var("DB_NAME").unwrap_or_else(|_| "bookstore".to_string());
    let port = std::env::var("DB_PORT").unwrap_or_else(|_| "3306".to_string());

    let mut url = format!("mysql://{user}:{pass}@{host}:{port}/{name}");
    // Optional TLS mode for the connection, e.g. DB_SSL_MODE=required
    if let Ok(ssl_mode) = std::env::var("DB_SSL_MODE") {
        url.push_str(&format!("?ssl-mode={ssl_mode}"));
    }
    url
}

/// Initialize application configuration and state
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    tracing::info!("Connecting to database");
    let db = Database::connect(&config.database_url).await?;

    let auth = AuthConfig::new(config.jwt_secret.clone(), config.seed_logins_enabled);

    Ok(AppState { db, auth })
}
