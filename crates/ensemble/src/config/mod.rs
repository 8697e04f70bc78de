use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the portal.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub session: SessionConfig,
    pub upstream: UpstreamConfig,
    pub turnover: TurnoverSlaConfig,
}

const DEVELOPMENT_SESSION_SECRET: &str = "ensemble-development-only-session-secret";
const DEVELOPMENT_SSO_SECRET: &str = "ensemble-development-only-sso-shared-secret";
const MIN_SECRET_LEN: usize = 32;

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let secret = match env::var("ENSEMBLE_SESSION_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingSessionSecret)
            }
            Err(_) => DEVELOPMENT_SESSION_SECRET.to_string(),
        };
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSessionSecret);
        }

        let sso_secret = match env::var("ENSEMBLE_SSO_SHARED_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingSsoSecret)
            }
            Err(_) => DEVELOPMENT_SSO_SECRET.to_string(),
        };
        if sso_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSsoSecret);
        }

        let session = SessionConfig {
            secret,
            sso_secret,
            ttl_hours: number_var("ENSEMBLE_SESSION_TTL_HOURS", 12)?,
            cookie_name: env::var("ENSEMBLE_SESSION_COOKIE")
                .unwrap_or_else(|_| "ensemble_session".to_string()),
            secure_cookie: environment == AppEnvironment::Production,
        };

        let upstream = UpstreamConfig {
            asset_api_url: env::var("ENSEMBLE_ASSET_API_URL").ok(),
            ldap_api_url: env::var("ENSEMBLE_LDAP_API_URL").ok(),
            timeout: Duration::from_secs(number_var("ENSEMBLE_UPSTREAM_TIMEOUT_SECS", 10)?),
        };

        let defaults = TurnoverSlaConfig::default();
        let turnover = TurnoverSlaConfig {
            overdue_hours: number_var("ENSEMBLE_TURNOVER_OVERDUE_HOURS", defaults.overdue_hours)?,
            at_risk_hours: number_var("ENSEMBLE_TURNOVER_AT_RISK_HOURS", defaults.at_risk_hours)?,
            unattended_hours: number_var(
                "ENSEMBLE_TURNOVER_UNATTENDED_HOURS",
                defaults.unattended_hours,
            )?,
            stale_hours: number_var("ENSEMBLE_TURNOVER_STALE_HOURS", defaults.stale_hours)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            session,
            upstream,
            turnover,
        })
    }
}

fn number_var(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Session cookie sealing and lifetime. `sso_secret` is shared with the
/// identity gateway and signs every assertion it forwards.
#[derive(Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub sso_secret: String,
    pub ttl_hours: u64,
    pub cookie_name: String,
    pub secure_cookie: bool,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("sso_secret", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// Base URLs of the read-only upstream APIs. Unset URLs disable the feature.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub asset_api_url: Option<String>,
    pub ldap_api_url: Option<String>,
    pub timeout: Duration,
}

/// Age thresholds, in hours, for turnover SLA badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnoverSlaConfig {
    pub overdue_hours: u64,
    pub at_risk_hours: u64,
    pub unattended_hours: u64,
    pub stale_hours: u64,
}

impl Default for TurnoverSlaConfig {
    fn default() -> Self {
        Self {
            overdue_hours: 72,
            at_risk_hours: 48,
            unattended_hours: 4,
            stale_hours: 24,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    MissingSessionSecret,
    WeakSessionSecret,
    MissingSsoSecret,
    WeakSsoSecret,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
            ConfigError::MissingSessionSecret => {
                write!(f, "ENSEMBLE_SESSION_SECRET is required in production")
            }
            ConfigError::WeakSessionSecret => write!(
                f,
                "ENSEMBLE_SESSION_SECRET must be at least {MIN_SECRET_LEN} characters"
            ),
            ConfigError::MissingSsoSecret => {
                write!(f, "ENSEMBLE_SSO_SHARED_SECRET is required in production")
            }
            ConfigError::WeakSsoSecret => write!(
                f,
                "ENSEMBLE_SSO_SHARED_SECRET must be at least {MIN_SECRET_LEN} characters"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::MissingSessionSecret
            | ConfigError::WeakSessionSecret
            | ConfigError::MissingSsoSecret
            | ConfigError::WeakSsoSecret => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "ENSEMBLE_SESSION_SECRET",
            "ENSEMBLE_SSO_SHARED_SECRET",
            "ENSEMBLE_SESSION_TTL_HOURS",
            "ENSEMBLE_SESSION_COOKIE",
            "ENSEMBLE_ASSET_API_URL",
            "ENSEMBLE_LDAP_API_URL",
            "ENSEMBLE_UPSTREAM_TIMEOUT_SECS",
            "ENSEMBLE_TURNOVER_OVERDUE_HOURS",
            "ENSEMBLE_TURNOVER_AT_RISK_HOURS",
            "ENSEMBLE_TURNOVER_UNATTENDED_HOURS",
            "ENSEMBLE_TURNOVER_STALE_HOURS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.session.ttl_hours, 12);
        assert_eq!(config.session.cookie_name, "ensemble_session");
        assert!(!config.session.secure_cookie);
        assert_eq!(config.turnover, TurnoverSlaConfig::default());
        assert!(config.upstream.asset_api_url.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn production_requires_session_secret() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::MissingSessionSecret)
        ));

        env::set_var("ENSEMBLE_SESSION_SECRET", "short");
        assert!(matches!(AppConfig::load(), Err(ConfigError::WeakSessionSecret)));

        env::set_var(
            "ENSEMBLE_SESSION_SECRET",
            "a-production-secret-that-is-long-enough",
        );
        assert!(matches!(AppConfig::load(), Err(ConfigError::MissingSsoSecret)));

        env::set_var("ENSEMBLE_SSO_SHARED_SECRET", "short");
        assert!(matches!(AppConfig::load(), Err(ConfigError::WeakSsoSecret)));

        env::set_var(
            "ENSEMBLE_SSO_SHARED_SECRET",
            "a-gateway-shared-secret-that-is-long-enough",
        );
        let config = AppConfig::load().expect("config loads");
        assert!(config.session.secure_cookie);
        assert_eq!(
            config.session.sso_secret,
            "a-gateway-shared-secret-that-is-long-enough"
        );
        reset_env();
    }

    #[test]
    fn debug_output_hides_both_secrets() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads");
        let rendered = format!("{:?}", config.session);
        assert!(!rendered.contains(DEVELOPMENT_SESSION_SECRET));
        assert!(!rendered.contains(DEVELOPMENT_SSO_SECRET));
    }

    #[test]
    fn rejects_non_numeric_sla_hours() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ENSEMBLE_TURNOVER_STALE_HOURS", "a day");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "ENSEMBLE_TURNOVER_STALE_HOURS"
            })
        ));
        reset_env();
    }
}
