//! Port abstraction for account persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::{Email, User};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by account repository adapters.
    pub enum AccountPersistenceError {
        /// A unique column already holds the value.
        Conflict { field: String } => "an account with this {field} already exists",
        /// Query or mutation failed during execution.
        Query { message: String } => "account repository query failed: {message}",
    }
}

/// Stored account: the public user plus its password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Public user data.
    pub user: User,
    /// PHC-encoded password hash.
    pub password_hash: String,
}

/// Account persistence port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account, rejecting duplicate usernames or emails.
    async fn insert(&self, record: AccountRecord) -> Result<(), AccountPersistenceError>;

    /// Fetch an account by login email.
    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AccountRecord>, AccountPersistenceError>;
}
