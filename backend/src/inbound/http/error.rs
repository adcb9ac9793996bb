//! HTTP mapping for domain errors.
//!
//! Every failure leaves the server as the same JSON envelope:
//! `{title, message, errors, stack}`. [`ResponseError::error_response`] cannot
//! see configuration, so it always renders the production-safe form; the
//! [`ErrorEnvelope`](crate::middleware::ErrorEnvelope) middleware re-renders
//! with diagnostics when the server runs outside production.

use actix_web::error::{JsonPayloadError, UrlencodedError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::domain::{DEFAULT_TITLE, Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Message used for unmatched routes.
pub const NOT_FOUND_MESSAGE: &str = "The requested resource couldn't be found.";

const REDACTED_MESSAGE: &str = "Internal server error";

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short heading, `"Server Error"` unless the error names its own.
    pub title: String,
    /// Human-readable description.
    pub message: String,
    /// Field-level validation errors, when any.
    pub errors: Option<Value>,
    /// Diagnostic trace; always `null` in production.
    pub stack: Option<String>,
}

impl ErrorBody {
    /// Render a domain error.
    ///
    /// # Examples
    /// ```
    /// use coredump::domain::Error;
    /// use coredump::inbound::http::error::ErrorBody;
    ///
    /// let body = ErrorBody::from_error(&Error::internal("db offline"), true);
    /// assert_eq!(body.message, "Internal server error");
    /// assert!(body.stack.is_none());
    /// ```
    pub fn from_error(error: &Error, production: bool) -> Self {
        let message = if production && error.code() == ErrorCode::InternalError {
            REDACTED_MESSAGE.to_owned()
        } else {
            error.message().to_owned()
        };
        Self {
            title: error.title().to_owned(),
            message,
            errors: error.details().cloned(),
            stack: (!production).then(|| error.stack()),
        }
    }

    /// Render any framework error, delegating to [`ErrorBody::from_error`]
    /// when it wraps a domain error.
    pub fn from_actix(error: &actix_web::Error, production: bool) -> Self {
        if let Some(domain) = error.as_error::<Error>() {
            return Self::from_error(domain, production);
        }
        let status = error.as_response_error().status_code();
        let mut message = error.to_string();
        if status.is_server_error() && production {
            message = REDACTED_MESSAGE.to_owned();
        } else if message.trim().is_empty() {
            message = status
                .canonical_reason()
                .unwrap_or(DEFAULT_TITLE)
                .to_owned();
        }
        Self {
            title: DEFAULT_TITLE.to_owned(),
            message,
            errors: None,
            stack: (!production).then(|| format!("{error:?}")),
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(ErrorBody::from_error(self, true))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal(REDACTED_MESSAGE).with_cause(&err)
    }
}

const BAD_BODY_TITLE: &str = "Bad request.";

/// Map JSON extractor failures onto domain errors.
///
/// Registered as the `JsonConfig` error handler so malformed bodies reach
/// the client in the same envelope as every other failure.
pub fn json_payload_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let mapped = match &err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            Error::payload_too_large(err.to_string())
        }
        _ => Error::invalid_request(err.to_string()).with_title(BAD_BODY_TITLE),
    };
    mapped.with_cause(&err).into()
}

/// Map URL-encoded form extractor failures onto domain errors.
pub fn form_payload_error(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    let mapped = match &err {
        UrlencodedError::Overflow { .. } => Error::payload_too_large(err.to_string()),
        _ => Error::invalid_request(err.to_string()).with_title(BAD_BODY_TITLE),
    };
    mapped.with_cause(&err).into()
}

/// Default service for unmatched requests.
pub async fn not_found() -> ApiResult<HttpResponse> {
    Err(Error::not_found(NOT_FOUND_MESSAGE))
}
