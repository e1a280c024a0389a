use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    /// Access token and `auth` cookie lifetime, in seconds.
    pub access_token_ttl: usize,

    // Rate limiting (auth routes only)
    pub rate_limit_enabled: bool,
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_verify_per_min: u32,

    pub log_dir: String,
    pub log_level: String,

    /// Largest accepted `/upload-data` file, in bytes.
    pub max_upload_bytes: usize,
    /// Account registered with this address becomes a superuser.
    pub superuser_email: Option<String>,

    pub email: EmailConfig,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    /// Falls back to a log-only transport when unset.
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub frontend_url: String,
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8000".to_string(),
            jwt_secret: String::new(),
            access_token_ttl: 3600,
            rate_limit_enabled: true,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_verify_per_min: 30,
            log_dir: "logs".to_string(),
            log_level: "debug".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            superuser_email: None,
            email: EmailConfig::default(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@localhost".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            queue_capacity: 256,
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let email = EmailConfig {
            smtp_host: env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty()),
            smtp_port: parse_var("SMTP_PORT", defaults.email.smtp_port)?,
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("EMAIL_FROM").unwrap_or(defaults.email.from_email),
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.email.frontend_url),
            queue_capacity: parse_var("EMAIL_QUEUE_CAPACITY", defaults.email.queue_capacity)?,
        };

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            jwt_secret,
            access_token_ttl: parse_var("ACCESS_TOKEN_TTL", defaults.access_token_ttl)?,

            rate_limit_enabled: parse_var("RATE_LIMIT_ENABLED", defaults.rate_limit_enabled)?,
            rate_login_per_min: parse_var("RATE_LOGIN_PER_MIN", defaults.rate_login_per_min)?,
            rate_register_per_min: parse_var(
                "RATE_REGISTER_PER_MIN",
                defaults.rate_register_per_min,
            )?,
            rate_verify_per_min: parse_var("RATE_VERIFY_PER_MIN", defaults.rate_verify_per_min)?,

            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),

            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            superuser_email: env::var("SUPERUSER_EMAIL")
                .ok()
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty()),

            email,
        })
    }

    /// Configuration used by in-crate HTTP tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            jwt_secret: "test-secret".to_string(),
            rate_limit_enabled: false,
            ..Self::default()
        }
    }
}
