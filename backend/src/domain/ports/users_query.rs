//! Driving port for the user list page.
//!
//! Inbound adapters use this port to fetch user-visible data without importing
//! outbound persistence concerns. Handler tests use the
//! generated mock.

use async_trait::async_trait;

use crate::domain::{Error, User};

/// Domain use-case port for listing users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Return every registered user, ordered by username.
    async fn list_users(&self) -> Result<Vec<User>, Error>;
}
