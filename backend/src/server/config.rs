//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use zeroize::Zeroizing;

use crate::inbound::http::session_config::SessionSettings;
use crate::middleware::SanitizerPolicy;
use crate::settings::{
    AppSettings, DEFAULT_BIND_ADDR, DEFAULT_BODY_LIMIT, DEFAULT_PUBLIC_DIR,
    DEFAULT_TOKEN_TTL_SECS, DEV_TOKEN_SECRET, Environment, SettingsError,
};

/// Builder-style configuration for creating the HTTP server.
///
/// Built once at startup and never mutated afterwards; every per-worker
/// factory reads from it.
#[derive(Clone)]
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) environment: Environment,
    pub(crate) public_dir: PathBuf,
    pub(crate) token_secret: Zeroizing<Vec<u8>>,
    pub(crate) token_ttl: Duration,
    pub(crate) body_limit: usize,
    pub(crate) sanitizer: SanitizerPolicy,
    pub(crate) demo_data: bool,
}

impl ServerConfig {
    /// Development defaults around the given session settings.
    ///
    /// # Examples
    /// ```
    /// use actix_web::cookie::{Key, SameSite};
    /// use coredump::inbound::http::session_config::SessionSettings;
    /// use coredump::server::ServerConfig;
    ///
    /// let config = ServerConfig::new(SessionSettings {
    ///     key: Key::generate(),
    ///     cookie_secure: false,
    ///     same_site: SameSite::Lax,
    /// });
    /// assert_eq!(config.bind_addr().port(), 8080);
    /// ```
    #[must_use]
    pub fn new(session: SessionSettings) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr: DEFAULT_BIND_ADDR,
            environment: Environment::default(),
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            token_secret: Zeroizing::new(DEV_TOKEN_SECRET.as_bytes().to_vec()),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            body_limit: DEFAULT_BODY_LIMIT,
            sanitizer: SanitizerPolicy::default(),
            demo_data: false,
        }
    }

    /// Apply loaded application settings.
    ///
    /// # Errors
    /// Fails when the environment name or bind address does not parse, or
    /// when production runs without a token secret.
    pub fn from_settings(
        settings: &AppSettings,
        session: SessionSettings,
    ) -> Result<Self, SettingsError> {
        let environment = settings.environment()?;
        let secret = settings.token_secret(environment)?;
        Ok(Self::new(session)
            .with_bind_addr(settings.bind_addr()?)
            .with_environment(environment)
            .with_public_dir(settings.public_dir())
            .with_token(secret.as_bytes(), settings.token_ttl())
            .with_body_limit(settings.body_limit())
            .with_demo_data(settings.demo_data))
    }

    #[must_use]
    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_public_dir(mut self, public_dir: impl Into<PathBuf>) -> Self {
        self.public_dir = public_dir.into();
        self
    }

    /// Token signing secret and lifetime.
    #[must_use]
    pub fn with_token(mut self, secret: &[u8], ttl: Duration) -> Self {
        self.token_secret = Zeroizing::new(secret.to_vec());
        self.token_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    #[must_use]
    pub fn with_sanitizer(mut self, policy: SanitizerPolicy) -> Self {
        self.sanitizer = policy;
        self
    }

    #[must_use]
    pub fn with_demo_data(mut self, demo_data: bool) -> Self {
        self.demo_data = demo_data;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Deployment environment.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn session() -> SessionSettings {
        SessionSettings {
            key: Key::generate(),
            cookie_secure: true,
            same_site: SameSite::Strict,
        }
    }

    fn settings(environment: Option<&str>, secret: Option<&str>) -> AppSettings {
        AppSettings {
            environment: environment.map(str::to_owned),
            bind_addr: Some("127.0.0.1:9000".into()),
            public_dir: None,
            token_secret: secret.map(str::to_owned),
            token_ttl_secs: Some(60),
            body_limit: None,
            demo_data: true,
        }
    }

    #[rstest]
    fn settings_flow_into_the_config() {
        let config = ServerConfig::from_settings(&settings(Some("test"), Some("s3cret")), session())
            .expect("valid settings");
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.environment(), Environment::Test);
        assert_eq!(config.token_secret.as_slice(), b"s3cret");
        assert_eq!(config.token_ttl, Duration::from_secs(60));
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
        assert!(config.demo_data);
        assert!(config.cookie_secure);
        assert_eq!(config.same_site, SameSite::Strict);
    }

    #[rstest]
    fn production_requires_a_token_secret() {
        let result = ServerConfig::from_settings(&settings(Some("production"), None), session());
        assert!(matches!(result, Err(SettingsError::MissingTokenSecret)));
    }

    #[rstest]
    fn defaults_bind_to_the_documented_address() {
        assert_eq!(ServerConfig::new(session()).bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(DEFAULT_BIND_ADDR.to_string(), "0.0.0.0:8080");
    }
}
