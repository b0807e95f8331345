use secrecy::Secret;
use service_core::config::{self as core_config, env_flag, get_env};
use service_core::error::AppError;

#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub common: core_config::Config,
    pub store: StoreConfig,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub recaptcha: RecaptchaConfig,
    pub smtp: SmtpConfig,
    pub uploads: UploadsConfig,
    pub security: SecurityConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub expiry_days: i64,
}

/// Credentials for the built-in administrator, which has no account record.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct RecaptchaConfig {
    pub secret_key: Secret<String>,
    pub verify_url: String,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct UploadsConfig {
    /// Root directory served under `/uploads`.
    pub dir: String,
    pub max_images: usize,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub auth_rate_limit_attempts: u32,
    pub auth_rate_limit_window_seconds: u64,
}

impl MarketplaceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = common.is_production();

        Ok(MarketplaceConfig {
            store: StoreConfig {
                backend: get_env("STORE_BACKEND", Some("mongo"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("tourist_helper"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", None, is_prod)?),
                expiry_days: parse_env("JWT_EXPIRY_DAYS", "7", is_prod)?,
            },
            admin: AdminConfig {
                email: get_env("ADMIN_EMAIL", Some("admin@touristhelper.local"), is_prod)?,
                password: Secret::new(get_env("ADMIN_PASSWORD", None, is_prod)?),
            },
            recaptcha: RecaptchaConfig {
                secret_key: Secret::new(get_env("RECAPTCHA_SECRET_KEY", Some(""), is_prod)?),
                verify_url: get_env(
                    "RECAPTCHA_VERIFY_URL",
                    Some("https://www.google.com/recaptcha/api/siteverify"),
                    is_prod,
                )?,
                enabled: captcha_enabled(is_prod),
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: parse_env("SMTP_PORT", "587", is_prod)?,
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: Secret::new(get_env("SMTP_PASSWORD", Some(""), is_prod)?),
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@touristhelper.local"), is_prod)?,
                from_name: get_env("SMTP_FROM_NAME", Some("Tourist Helper"), is_prod)?,
                enabled: env_flag("SMTP_ENABLED"),
            },
            uploads: UploadsConfig {
                dir: get_env("UPLOADS_DIR", Some("uploads"), is_prod)?,
                max_images: 10,
                max_body_bytes: parse_env("MAX_BODY_BYTES", "52428800", is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:5173"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                auth_rate_limit_attempts: parse_env("AUTH_RATE_LIMIT_ATTEMPTS", "10", is_prod)?,
                auth_rate_limit_window_seconds: parse_env(
                    "AUTH_RATE_LIMIT_WINDOW_SECONDS",
                    "60",
                    is_prod,
                )?,
            },
            otlp_endpoint: std::env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            common,
        })
    }
}

/// CAPTCHA is always verified in production; elsewhere `RECAPTCHA_ENABLED`
/// opts in.
fn captcha_enabled(is_prod: bool) -> bool {
    is_prod || env_flag("RECAPTCHA_ENABLED")
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("Invalid {}: {}", key, e)))
}
