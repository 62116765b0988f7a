//! Configuration loaded from the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

const DEV_SECRET_KEY: &str = "vitae-development-secret-key";
const DEV_PASSWORD_SALT: &str = "vitae-development-password-salt";

/// Upper bound for token and session lifetimes (ten years).
pub const MAX_LIFETIME_SECS: u64 = 10 * 365 * 86_400;

/// Which settings profile the server runs under (`APP_SETTINGS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigProfile {
    Development,
    Testing,
    Production,
}

impl ConfigProfile {
    /// Parse a profile name. Accepts plain names (`testing`) as well as
    /// dotted class-style names (`project.config.TestingConfig`).
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.rsplit('.').next().unwrap_or(raw).to_ascii_lowercase();
        let name = name.strip_suffix("config").unwrap_or(&name);
        match name {
            "development" | "dev" | "base" | "" => Some(Self::Development),
            "testing" | "test" => Some(Self::Testing),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    fn default_bcrypt_cost(self) -> u32 {
        match self {
            Self::Testing => 4,
            _ => 13,
        }
    }
}

impl std::fmt::Display for ConfigProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Testing => write!(f, "testing"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Outgoing mail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    /// Never serialized.
    #[serde(skip)]
    pub password: Option<String>,
    pub default_sender: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            server: "localhost".into(),
            port: 587,
            use_tls: true,
            username: None,
            password: None,
            default_sender: "noreply@localhost".into(),
        }
    }
}

/// Admin account ensured at startup.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
}

/// Top-level Vitae configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub profile: ConfigProfile,
    /// HTTP server port.
    pub port: u16,
    /// SQLite database file.
    pub database_path: PathBuf,
    pub secret_key: String,
    pub password_salt: String,
    /// Externally reachable origin used to build confirmation links.
    pub base_url: String,
    pub bcrypt_cost: u32,
    /// Lifetime of an email confirmation token, in seconds.
    pub confirm_token_max_age: u64,
    /// Sliding lifetime of a login session, in seconds.
    pub session_ttl: u64,
    pub mail: MailSettings,
    pub admin: Option<AdminAccount>,
}

impl AppConfig {
    /// Create configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let profile = match get("APP_SETTINGS") {
            Some(raw) => ConfigProfile::parse(&raw)
                .ok_or_else(|| Error::Config(format!("unknown APP_SETTINGS profile: {}", raw)))?,
            None => ConfigProfile::Development,
        };

        let port = parse_or(get("PORT"), "PORT", 5000u16)?;

        let database_path = get("DATABASE_URL")
            .map(|url| {
                let path = url
                    .strip_prefix("sqlite://")
                    .or_else(|| url.strip_prefix("sqlite:"))
                    .unwrap_or(&url);
                PathBuf::from(path)
            })
            .unwrap_or_else(|| PathBuf::from("data/vitae.db"));

        let secret_key = get("SECRET_KEY").unwrap_or_else(|| DEV_SECRET_KEY.into());
        let password_salt =
            get("SECURITY_PASSWORD_SALT").unwrap_or_else(|| DEV_PASSWORD_SALT.into());

        if secret_key == DEV_SECRET_KEY || password_salt == DEV_PASSWORD_SALT {
            if profile == ConfigProfile::Production {
                return Err(Error::Config(
                    "SECRET_KEY and SECURITY_PASSWORD_SALT must be set in production".into(),
                ));
            }
            warn!("Using built-in development secret key and salt");
        }

        let base_url = get("BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let bcrypt_cost: u32 = parse_or(
            get("BCRYPT_LOG_ROUNDS"),
            "BCRYPT_LOG_ROUNDS",
            profile.default_bcrypt_cost(),
        )?;

        let mail = MailSettings {
            server: get("MAIL_SERVER").unwrap_or_else(|| "localhost".into()),
            port: parse_or(get("MAIL_PORT"), "MAIL_PORT", 587u16)?,
            use_tls: parse_bool(get("MAIL_USE_TLS"), true),
            username: get("MAIL_USERNAME"),
            password: get("MAIL_PASSWORD"),
            default_sender: get("MAIL_DEFAULT_SENDER")
                .unwrap_or_else(|| "noreply@localhost".into()),
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminAccount { email, password }),
            _ => None,
        };

        Ok(Self {
            profile,
            port,
            database_path,
            secret_key,
            password_salt,
            base_url,
            bcrypt_cost: bcrypt_cost.clamp(4, 31),
            confirm_token_max_age: parse_lifetime(
                get("CONFIRM_TOKEN_MAX_AGE"),
                "CONFIRM_TOKEN_MAX_AGE",
                3600,
            )?,
            session_ttl: parse_lifetime(get("SESSION_TTL"), "SESSION_TTL", 86_400)?,
            mail,
            admin,
        })
    }

    /// Testing profile configuration backed by the given database file.
    pub fn testing(database_path: impl Into<PathBuf>) -> Self {
        Self {
            profile: ConfigProfile::Testing,
            port: 5000,
            database_path: database_path.into(),
            secret_key: DEV_SECRET_KEY.into(),
            password_salt: DEV_PASSWORD_SALT.into(),
            base_url: "http://localhost:5000".into(),
            bcrypt_cost: 4,
            confirm_token_max_age: 3600,
            session_ttl: 3600,
            mail: MailSettings::default(),
            admin: None,
        }
    }

    /// Key material for signing confirmation tokens.
    pub fn token_key(&self) -> String {
        format!("{}:{}", self.secret_key, self.password_salt)
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid value for {}: {}", key, v))),
        None => Ok(default),
    }
}

/// Parse a lifetime in seconds, bounded to `1..=MAX_LIFETIME_SECS`.
fn parse_lifetime(raw: Option<String>, key: &str, default: u64) -> Result<u64> {
    let secs = parse_or(raw, key, default)?;
    if secs == 0 || secs > MAX_LIFETIME_SECS {
        return Err(Error::Config(format!(
            "{} must be between 1 and {} seconds, got {}",
            key, MAX_LIFETIME_SECS, secs
        )));
    }
    Ok(secs)
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.profile, ConfigProfile::Development);
        assert_eq!(config.port, 5000);
        assert_eq!(config.bcrypt_cost, 13);
        assert_eq!(config.confirm_token_max_age, 3600);
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.database_path, PathBuf::from("data/vitae.db"));
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(ConfigProfile::parse("testing"), Some(ConfigProfile::Testing));
        assert_eq!(
            ConfigProfile::parse("project.config.TestingConfig"),
            Some(ConfigProfile::Testing)
        );
        assert_eq!(
            ConfigProfile::parse("project.config.ProductionConfig"),
            Some(ConfigProfile::Production)
        );
        assert_eq!(ConfigProfile::parse("BaseConfig"), Some(ConfigProfile::Development));
        assert_eq!(ConfigProfile::parse("staging"), None);
    }

    #[test]
    fn test_testing_profile_lowers_cost() {
        let config = config_from(&[("APP_SETTINGS", "testing")]).unwrap();
        assert_eq!(config.bcrypt_cost, 4);

        let config = config_from(&[("APP_SETTINGS", "testing"), ("BCRYPT_LOG_ROUNDS", "1")]).unwrap();
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn test_production_requires_secrets() {
        let err = config_from(&[("APP_SETTINGS", "production")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = config_from(&[
            ("APP_SETTINGS", "production"),
            ("SECRET_KEY", "s3cret"),
            ("SECURITY_PASSWORD_SALT", "salty"),
        ])
        .unwrap();
        assert_eq!(config.token_key(), "s3cret:salty");
    }

    #[test]
    fn test_database_url_and_mail() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite:///var/lib/vitae/app.db"),
            ("PORT", "8080"),
            ("MAIL_PORT", "465"),
            ("MAIL_USE_TLS", "false"),
            ("MAIL_DEFAULT_SENDER", "postmaster@example.org"),
            ("ADMIN_EMAIL", "ad@min.com"),
            ("ADMIN_PASSWORD", "admin"),
        ])
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/vitae/app.db"));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.mail.port, 465);
        assert!(!config.mail.use_tls);
        assert_eq!(config.mail.default_sender, "postmaster@example.org");
        assert_eq!(config.admin.unwrap().email, "ad@min.com");
    }

    #[test]
    fn test_lifetimes_bounded() {
        let config = config_from(&[("SESSION_TTL", "600"), ("CONFIRM_TOKEN_MAX_AGE", "120")]).unwrap();
        assert_eq!(config.session_ttl, 600);
        assert_eq!(config.confirm_token_max_age, 120);

        let err = config_from(&[("SESSION_TTL", "10000000000000")]).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("SESSION_TTL")));

        let err = config_from(&[("CONFIRM_TOKEN_MAX_AGE", "18446744073709551615")]).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("CONFIRM_TOKEN_MAX_AGE")));

        let err = config_from(&[("SESSION_TTL", "0")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
