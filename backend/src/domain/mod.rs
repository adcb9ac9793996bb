//! Domain primitives, aggregates and ports.
//!
//! Purpose: define strongly typed entities shared by the HTTP adapter and the
//! storage adapters. Keep types immutable and document invariants in each
//! type's Rustdoc.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic failure with title, details
//!   and a diagnostic cause chain.
//! - `User`, `Identity`, `Viewer`: who exists and who is asking.
//! - `Question`, `NewQuestion`: feed content.
//! - `ports`: traits the inbound adapter depends on.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod identity;
pub mod ports;
pub mod question;
pub mod trace_id;
pub mod user;

pub use self::accounts::PasswordAccountService;
pub use self::auth::{FieldError, LoginCredentials, LoginValidationError, NewAccount, SignupValidationError};
pub use self::error::{DEFAULT_TITLE, Error, ErrorCode, ErrorValidationError};
pub use self::identity::{Identity, Viewer};
pub use self::question::{NewQuestion, Question, QuestionId, QuestionValidationError};
pub use self::trace_id::TraceId;
pub use self::user::{Email, User, UserId, UserValidationError, Username};

/// HTTP header used to propagate the trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";
