//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Inbound HTTP handlers only see these traits; the in-memory store and any
//! future database adapter implement them on the outbound side.

mod macros;
pub(crate) use macros::define_port_error;

mod account_repository;
mod account_service;
mod questions;
mod users_query;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{AccountPersistenceError, AccountRecord, AccountRepository};
#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::AccountService;
#[cfg(test)]
pub use questions::{MockQuestionsCommand, MockQuestionsQuery};
pub use questions::{FEED_SIZE, QuestionsCommand, QuestionsQuery};
#[cfg(test)]
pub use users_query::MockUsersQuery;
pub use users_query::UsersQuery;
