//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie session holds a single value: the per-session anti-forgery
//! secret from which CSRF tokens are derived.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::domain::Error;

pub(crate) const CSRF_SECRET_KEY: &str = "csrf_secret";
const SECRET_BYTES: usize = 18;

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Anti-forgery secret bound to this session, if one was issued.
    pub fn csrf_secret(&self) -> Result<Option<String>, Error> {
        self.0
            .get::<String>(CSRF_SECRET_KEY)
            .map(|secret| secret.filter(|value| !value.is_empty()))
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// Existing secret, or a fresh one persisted in the session.
    pub fn ensure_csrf_secret(&self) -> Result<String, Error> {
        if let Some(secret) = self.csrf_secret()? {
            return Ok(secret);
        }
        let mut bytes = [0_u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let secret = hex::encode(bytes);
        self.0
            .insert(CSRF_SECRET_KEY, &secret)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))?;
        Ok(secret)
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
