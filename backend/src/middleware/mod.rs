//! Request middleware.
//!
//! Stages, outermost first: [`Trace`], the cookie session,
//! [`ErrorEnvelope`], [`BearerCredential`], [`SanitizeBody`].

pub mod credential;
pub mod error_envelope;
pub mod sanitize;
pub mod trace;

pub use credential::{ACCESS_TOKEN_COOKIE, BearerCredential, CookieSigner, Credential};
pub use error_envelope::ErrorEnvelope;
pub use sanitize::{SanitizeBody, Sanitizer, SanitizerPolicy};
pub use trace::Trace;
