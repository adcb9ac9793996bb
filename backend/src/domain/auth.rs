//! Authentication primitives such as login credentials and signup forms.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use serde::Serialize;
use zeroize::Zeroizing;

use super::user::{Email, UserValidationError, Username};

/// Minimum password length accepted at signup.
pub const PASSWORD_MIN: usize = 8;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or malformed.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` satisfies [`Email`] rules.
/// - `password` is non-empty but retains caller-provided whitespace to avoid
///   surprising credential comparisons.
///
/// # Examples
/// ```
/// use coredump::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("ada@example.com", "password").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = Email::new(email).map_err(|_| LoginValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// One rejected signup field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form field name.
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl fmt::Display) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Every field error found while validating a signup form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupValidationError(Vec<FieldError>);

impl SignupValidationError {
    /// Field errors in form order.
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }
}

impl fmt::Display for SignupValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for SignupValidationError {}

/// Validated signup form ready for registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    username: Username,
    email: Email,
    password: Zeroizing<String>,
}

impl NewAccount {
    /// Validate every field, collecting all failures rather than stopping at
    /// the first.
    ///
    /// # Examples
    /// ```
    /// use coredump::domain::NewAccount;
    ///
    /// let err = NewAccount::try_from_parts("", "nope", "short", "other").unwrap_err();
    /// assert_eq!(err.fields().len(), 4);
    /// ```
    pub fn try_from_parts(
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Self, SignupValidationError> {
        let mut errors = Vec::new();
        let username = Username::new(username)
            .map_err(|err| errors.push(FieldError::new("username", err)))
            .ok();
        let email = Email::new(email)
            .map_err(|err: UserValidationError| errors.push(FieldError::new("email", err)))
            .ok();
        if password.chars().count() < PASSWORD_MIN {
            errors.push(FieldError::new(
                "password",
                format!("password must be at least {PASSWORD_MIN} characters"),
            ));
        }
        if password != confirm_password {
            errors.push(FieldError::new(
                "confirmPassword",
                "confirm password must match password",
            ));
        }

        match (username, email) {
            (Some(username), Some(email)) if errors.is_empty() => Ok(Self {
                username,
                email,
                password: Zeroizing::new(password.to_owned()),
            }),
            _ => Err(SignupValidationError(errors)),
        }
    }

    /// Requested username.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Requested login email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Plain-text password; hashed before it reaches storage.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
