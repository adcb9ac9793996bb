//! Driving port for signup and login use-cases.
//!
//! Inbound adapters call it to register or authenticate without knowing how
//! passwords are hashed or where accounts live.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, NewAccount, User};

/// Domain use-case port for account management.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a validated signup, returning the stored user.
    async fn register(&self, account: NewAccount) -> Result<User, Error>;

    /// Check credentials and return the matching user.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error>;
}
