//! Environment configuration
//!
//! Everything is read once at startup. Only `DATABASE_URL` is mandatory,
//! plus `JWT_SECRET` in release builds.

use anyhow::{Context, bail};
use auth::AuthConfig;
use platform::crypto::from_base64;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use worksite::WorksiteConfig;

const DEFAULT_PORT: u16 = 31113;
const DEFAULT_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
/// Shorter keys make HS256 brute-forceable
const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
    pub frontend_origins: Vec<String>,
    pub media_root: String,
    pub auth: AuthConfig,
    pub worksite: WorksiteConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        Ok(Self {
            database_url,
            port: parse_or("PORT", DEFAULT_PORT)?,
            frontend_origins: split_list(&var_or("FRONTEND_ORIGINS", DEFAULT_ORIGINS)),
            media_root: var_or("MEDIA_ROOT", "media"),
            auth: auth_config()?,
            worksite: worksite_config()?,
        })
    }
}

fn auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = match env::var("JWT_SECRET") {
        Ok(secret) => {
            if secret.len() < MIN_JWT_SECRET_BYTES {
                bail!("JWT_SECRET must be at least {MIN_JWT_SECRET_BYTES} bytes");
            }
            AuthConfig::with_secret(secret)
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("JWT_SECRET not set, using a random key; tokens will not survive a restart");
            AuthConfig::development()
        }
        Err(_) => bail!("JWT_SECRET must be set in release builds"),
    };

    let defaults = AuthConfig::default();
    config.access_token_ttl = Duration::from_secs(parse_or(
        "JWT_ACCESS_TTL_SECS",
        defaults.access_token_ttl.as_secs(),
    )?);
    config.refresh_token_ttl = Duration::from_secs(parse_or(
        "JWT_REFRESH_TTL_SECS",
        defaults.refresh_token_ttl.as_secs(),
    )?);
    // Base64 so the pepper can hold arbitrary bytes
    config.password_pepper = match env::var("PASSWORD_PEPPER") {
        Ok(encoded) if !encoded.trim().is_empty() => Some(
            from_base64(encoded.trim()).context("PASSWORD_PEPPER must be standard base64")?,
        ),
        _ => None,
    };

    Ok(config)
}

fn worksite_config() -> anyhow::Result<WorksiteConfig> {
    let defaults = WorksiteConfig::default();
    Ok(WorksiteConfig {
        qr_base_url: var_or("QR_BASE_URL", &defaults.qr_base_url),
        media_url: var_or("MEDIA_URL", &defaults.media_url),
        max_image_bytes: parse_or("MAX_IMAGE_BYTES", defaults.max_image_bytes)?,
        ..defaults
    })
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{name} has an invalid value: {raw:?}"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
