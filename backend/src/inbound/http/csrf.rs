//! Anti-forgery tokens bound to the cookie session.
//!
//! A token is `salt-digest` where `digest = hex(sha256(salt "-" secret))` and
//! `secret` lives in the session. Every render gets a new salt, so tokens
//! differ per form while all of them validate against the same session.

use actix_web::HttpRequest;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::session::SessionContext;
use crate::domain::Error;

/// Form field carrying the token.
pub const CSRF_FIELD: &str = "_csrf";
/// Header accepted as an alternative to [`CSRF_FIELD`].
pub const CSRF_HEADER: &str = "csrf-token";

const SALT_LEN: usize = 8;

fn digest(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"-");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn tokenize(salt: &str, secret: &str) -> String {
    format!("{salt}-{}", digest(salt, secret))
}

/// Whether `token` was derived from `secret`.
pub fn token_matches(secret: &str, token: &str) -> bool {
    let Some((salt, _)) = token.split_once('-') else {
        return false;
    };
    let expected = tokenize(salt, secret);
    expected.as_bytes().ct_eq(token.as_bytes()).into()
}

/// Issue a token for the current session, creating its secret if needed.
pub fn issue_token(session: &SessionContext) -> Result<String, Error> {
    let secret = session.ensure_csrf_secret()?;
    let salt: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect();
    Ok(tokenize(&salt, &secret))
}

/// Token from the submitted form field, falling back to the header.
pub fn submitted_token(req: &HttpRequest, form_value: Option<&str>) -> Option<String> {
    form_value
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            req.headers()
                .get(CSRF_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        })
}

/// Reject with 403 unless `token` belongs to this session.
pub fn verify_token(session: &SessionContext, token: Option<&str>) -> Result<(), Error> {
    let secret = session.csrf_secret()?;
    match (secret, token) {
        (Some(secret), Some(token)) if token_matches(&secret, token) => Ok(()),
        (secret, token) => {
            warn!(
                has_secret = secret.is_some(),
                has_token = token.is_some(),
                "csrf validation failed"
            );
            Err(Error::forbidden("invalid csrf token").with_title("Forbidden"))
        }
    }
}
