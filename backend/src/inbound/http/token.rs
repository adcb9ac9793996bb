//! HS256 access tokens.
//!
//! A token carries the user's id, username and email so soft-gated pages can
//! greet the user without a store lookup. Expiry is checked with zero leeway.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Email, Error, Identity, User, UserId, Username};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims stored in an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier.
    pub sub: String,
    pub username: String,
    pub email: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    fn into_identity(self) -> Option<Identity> {
        Some(Identity::new(
            UserId::new(&self.sub).ok()?,
            Username::new(&self.username).ok()?,
            Email::new(&self.email).ok()?,
        ))
    }
}

/// Why a presented token was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),
    #[error("token claims do not describe a valid user")]
    MalformedClaims,
}

/// Issues and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Build an issuer for `secret`, stamping tokens with `clock`.
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            clock,
        }
    }

    /// Sign a token for `user`.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// use coredump::domain::User;
    /// use coredump::inbound::http::token::TokenIssuer;
    /// use mockable::DefaultClock;
    ///
    /// let issuer = TokenIssuer::new(b"secret", Duration::from_secs(60), Arc::new(DefaultClock));
    /// let user = User::try_from_strings(
    ///     "3fa85f64-5717-4562-b3fc-2c963f66afa6",
    ///     "ada",
    ///     "ada@example.com",
    /// )
    /// .expect("valid user");
    /// let token = issuer.issue(&user).expect("signed");
    /// let identity = issuer.verify(&token).expect("verified");
    /// assert_eq!(identity.username().as_ref(), "ada");
    /// ```
    pub fn issue(&self, user: &User) -> Result<String, Error> {
        let iat = self.clock.utc().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user.id().to_string(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            iat,
            exp: iat.saturating_add(ttl),
        };
        encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|err| Error::internal("failed to sign access token").with_cause(&err))
    }

    /// Check signature and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        claims.into_identity().ok_or(TokenError::MalformedClaims)
    }

    /// Like [`TokenIssuer::verify`] but logs and discards the failure.
    pub fn identify(&self, token: &str) -> Option<Identity> {
        match self.verify(token) {
            Ok(identity) => Some(identity),
            Err(error) => {
                debug!(%error, "ignoring unverifiable access token");
                None
            }
        }
    }

    /// Configured token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
