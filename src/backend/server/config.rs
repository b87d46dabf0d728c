/**
 * Server Configuration
 *
 * Loads the service configuration from environment variables (a `.env`
 * file is read by the binary first) and opens the SQLite store.
 *
 * # Configuration Sources
 *
 * Every setting has a development default. `AppConfig::from_lookup` takes
 * the variable source as a function so tests never touch the process
 * environment.
 *
 * # Database
 *
 * `load_database` connects and runs the embedded migrations. Unlike a
 * best-effort optional service, the store is required: failures are
 * returned to the caller.
 */

use std::fmt::Display;
use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::time::Duration;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;

use crate::backend::auth::delivery::CookieSettings;
use crate::backend::auth::federated::GoogleSettings;
use crate::backend::auth::mailer::SmtpSettings;
use crate::backend::middleware::rate_limit::RateLimitConfig;

const DEFAULT_DATABASE_URL: &str = "sqlite://ayu_blog.db?mode=rwc";
const DEV_JWT_SECRET: &str = "ayu-blog-development-secret-change-me";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const WINDOW_SECS: RangeInclusive<u64> = 1..=86_400;
const MAX_REQUESTS: RangeInclusive<usize> = 1..=1_000_000;

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expire_days: i64,
    pub cookie: CookieSettings,
    pub production: bool,
    pub bcrypt_cost: u32,
    pub server_port: u16,
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
    /// `None` selects the logging mailer
    pub smtp: Option<SmtpSettings>,
    /// `None` disables Google sign-in
    pub google: Option<GoogleSettings>,
    pub general_rate_limit: RateLimitConfig,
    pub post_rate_limit: RateLimitConfig,
    /// Peers whose `X-Forwarded-For` is believed; empty trusts none
    pub trusted_proxies: Vec<IpAddr>,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let window = |key: &str, default: u64| Duration::from_secs(bounded(var(key), key, default, WINDOW_SECS));
        let ceiling = |key: &str, default: usize| bounded(var(key), key, default, MAX_REQUESTS);
        let cookie_days = bounded(var("COOKIE_EXPIRE"), "COOKIE_EXPIRE", 5, 1..=365);
        let server_port = bounded(var("SERVER_PORT"), "SERVER_PORT", 3000, 1..=u16::MAX);

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using the development secret");
            DEV_JWT_SECRET.to_string()
        });

        let production = var("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production"));
        let cookie = if production {
            CookieSettings::production(cookie_days)
        } else {
            CookieSettings::development(cookie_days)
        };

        let frontend_url = var("FRONTEND_URL")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let smtp = var("SMTP_HOST").map(|host| SmtpSettings {
            host,
            port: bounded(var("SMTP_PORT"), "SMTP_PORT", 587, 1..=u16::MAX),
            username: var("SMTP_USERNAME"),
            password: var("SMTP_PASSWORD"),
            from: var("SMTP_FROM").unwrap_or_else(|| "no-reply@ayu-blog.local".to_string()),
        });

        let google = match (var("GOOGLE_CLIENT_ID"), var("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => {
                let redirect_url = var("GOOGLE_CALLBACK_URL").unwrap_or_else(|| {
                    format!("http://localhost:{server_port}/user/auth/google/callback")
                });
                let defaults = GoogleSettings::new(client_id, client_secret, redirect_url);
                Some(GoogleSettings {
                    auth_url: var("GOOGLE_AUTH_URL").unwrap_or(defaults.auth_url.clone()),
                    token_url: var("GOOGLE_TOKEN_URL").unwrap_or(defaults.token_url.clone()),
                    userinfo_url: var("GOOGLE_USERINFO_URL").unwrap_or(defaults.userinfo_url.clone()),
                    ..defaults
                })
            }
            _ => None,
        };

        Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret,
            jwt_expire_days: bounded(var("JWT_EXPIRE_DAYS"), "JWT_EXPIRE_DAYS", 7, 1..=365),
            cookie,
            production,
            bcrypt_cost: bounded(var("BCRYPT_COST"), "BCRYPT_COST", bcrypt::DEFAULT_COST, 4..=31),
            server_port,
            frontend_url,
            cors_origins,
            smtp,
            google,
            general_rate_limit: RateLimitConfig::new(
                window("RATE_LIMIT_WINDOW_SECS", 900),
                ceiling("RATE_LIMIT_MAX_REQUESTS", 100),
            ),
            post_rate_limit: RateLimitConfig::new(
                window("POST_RATE_LIMIT_WINDOW_SECS", 900),
                ceiling("POST_RATE_LIMIT_MAX_REQUESTS", 10),
            ),
            trusted_proxies: var("TRUSTED_PROXIES").map(|raw| parse_proxies(&raw)).unwrap_or_default(),
        }
    }
}

/// Parse a numeric setting, keeping it inside `range`
///
/// Unparseable or out-of-range values fall back to `default` with a warning.
fn bounded<T>(raw: Option<String>, key: &str, default: T, range: RangeInclusive<T>) -> T
where
    T: FromStr + PartialOrd + Display + Copy,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) if range.contains(&value) => value,
        _ => {
            tracing::warn!(
                "{} must be a number from {} to {} (got {:?}); using {}",
                key,
                range.start(),
                range.end(),
                raw,
                default
            );
            default
        }
    }
}

/// Comma-separated proxy addresses; invalid entries are skipped
fn parse_proxies(raw: &str) -> Vec<IpAddr> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                tracing::warn!("Ignoring invalid TRUSTED_PROXIES entry {:?}", entry);
                None
            }
        })
        .collect()
}

/// Connect to the store and apply migrations
///
/// # Errors
///
/// Returns the connection or migration failure; the server cannot run
/// without its store.
pub async fn load_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database ready");

    Ok(pool)
}

/// Fresh, migrated in-memory store
///
/// A single connection that never idles out, since every new connection to
/// `sqlite::memory:` would see an empty database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
