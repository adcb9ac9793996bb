//! Application settings loaded via OrthoConfig.
//!
//! Values come from `COREDUMP_*` environment variables, configuration files
//! and command-line flags, in OrthoConfig's usual precedence. The loaded value
//! is immutable and handed to the server factory once at startup.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

/// Listen address when none is configured.
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8080));
/// Static asset directory when none is configured.
pub const DEFAULT_PUBLIC_DIR: &str = "public";
/// Access tokens last a week.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 604_800;
pub const DEFAULT_BODY_LIMIT: usize = 102_400;
/// Token secret used outside production when none is configured.
pub const DEV_TOKEN_SECRET: &str = "coredump-development-token-secret";

/// Deployment environment; controls stack-trace exposure in error bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// Local development; the default.
    #[default]
    Development,
    /// Automated test runs.
    Test,
    /// Production; stack traces and internal messages are withheld.
    Production,
}

impl Environment {
    /// Whether this is the production environment.
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Raised when an environment name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment '{0}'; expected development|test|production")]
pub struct UnknownEnvironment(String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(UnknownEnvironment(value.to_owned())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        })
    }
}

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `environment` holds an unknown name.
    #[error(transparent)]
    Environment(#[from] UnknownEnvironment),
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// Production deployments must configure their own token secret.
    #[error("COREDUMP_TOKEN_SECRET must be set in production")]
    MissingTokenSecret,
}

/// Configuration values for the web application.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "COREDUMP")]
pub struct AppSettings {
    /// Deployment environment name.
    pub environment: Option<String>,
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Directory served for static assets.
    pub public_dir: Option<PathBuf>,
    /// HS256 secret for access tokens.
    pub token_secret: Option<String>,
    /// Access token lifetime in seconds.
    pub token_ttl_secs: Option<u64>,
    /// Maximum accepted request body size in bytes.
    pub body_limit: Option<usize>,
    /// Seed demo users and questions at startup.
    #[ortho_config(default = false)]
    pub demo_data: bool,
}

impl AppSettings {
    /// Parsed environment, defaulting to development.
    pub fn environment(&self) -> Result<Environment, SettingsError> {
        match self.environment.as_deref() {
            Some(name) => Ok(name.parse()?),
            None => Ok(Environment::default()),
        }
    }

    /// Parsed bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let Some(value) = self.bind_addr.as_deref() else {
            return Ok(DEFAULT_BIND_ADDR);
        };
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Static asset directory.
    pub fn public_dir(&self) -> PathBuf {
        self.public_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR))
    }

    /// Token secret; outside production a fixed development secret is used
    /// when none is configured.
    pub fn token_secret(&self, environment: Environment) -> Result<&str, SettingsError> {
        match self.token_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(secret),
            _ if environment.is_production() => Err(SettingsError::MissingTokenSecret),
            _ => Ok(DEV_TOKEN_SECRET),
        }
    }

    /// Access token lifetime.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS))
    }

    /// Request body limit in bytes.
    pub fn body_limit(&self) -> usize {
        self.body_limit.unwrap_or(DEFAULT_BODY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("coredump")]).expect("config should load")
    }

    const VARS: [&str; 7] = [
        "COREDUMP_ENVIRONMENT",
        "COREDUMP_BIND_ADDR",
        "COREDUMP_PUBLIC_DIR",
        "COREDUMP_TOKEN_SECRET",
        "COREDUMP_TOKEN_TTL_SECS",
        "COREDUMP_BODY_LIMIT",
        "COREDUMP_DEMO_DATA",
    ];

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.environment().expect("env"), Environment::Development);
        assert_eq!(
            settings.bind_addr().expect("addr"),
            DEFAULT_BIND_ADDR
        );
        assert_eq!(settings.public_dir(), PathBuf::from(DEFAULT_PUBLIC_DIR));
        assert_eq!(settings.token_ttl(), Duration::from_secs(DEFAULT_TOKEN_TTL_SECS));
        assert_eq!(settings.body_limit(), DEFAULT_BODY_LIMIT);
        assert!(!settings.demo_data);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("COREDUMP_ENVIRONMENT", Some("production".to_owned())),
            ("COREDUMP_BIND_ADDR", Some("127.0.0.1:3000".to_owned())),
            ("COREDUMP_PUBLIC_DIR", None),
            ("COREDUMP_TOKEN_SECRET", Some("s3cret".to_owned())),
            ("COREDUMP_TOKEN_TTL_SECS", Some("60".to_owned())),
            ("COREDUMP_BODY_LIMIT", Some("2048".to_owned())),
            ("COREDUMP_DEMO_DATA", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        let environment = settings.environment().expect("env");
        assert_eq!(environment, Environment::Production);
        assert_eq!(settings.token_secret(environment).expect("secret"), "s3cret");
        assert_eq!(settings.token_ttl(), Duration::from_secs(60));
        assert_eq!(settings.body_limit(), 2048);
        assert!(settings.demo_data);
    }

    #[rstest]
    #[case("production", Environment::Production)]
    #[case("PROD", Environment::Production)]
    #[case(" test ", Environment::Test)]
    #[case("dev", Environment::Development)]
    fn environment_names_parse(#[case] raw: &str, #[case] expected: Environment) {
        assert_eq!(raw.parse::<Environment>(), Ok(expected));
    }

    #[rstest]
    fn unknown_environment_is_rejected() {
        assert!("staging".parse::<Environment>().is_err());
    }

    #[rstest]
    fn production_requires_a_token_secret() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));
        let settings = load_from_empty_args();
        assert!(matches!(
            settings.token_secret(Environment::Production),
            Err(SettingsError::MissingTokenSecret)
        ));
        assert_eq!(
            settings.token_secret(Environment::Development).expect("dev secret"),
            DEV_TOKEN_SECRET
        );
    }
}
