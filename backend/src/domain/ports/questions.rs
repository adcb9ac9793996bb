//! Driving ports for reading and posting questions.

use async_trait::async_trait;

use crate::domain::{Error, Identity, NewQuestion, Question, QuestionId};

/// Number of questions shown on the main feed.
pub const FEED_SIZE: usize = 10;

/// Read-side question use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionsQuery: Send + Sync {
    /// Newest questions first, at most `limit` of them.
    async fn recent(&self, limit: usize) -> Result<Vec<Question>, Error>;

    /// Look a single question up by identifier.
    async fn find(&self, id: QuestionId) -> Result<Option<Question>, Error>;

    /// Questions whose title or body contains `term`, ignoring case, newest
    /// first and at most `limit` of them.
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Question>, Error>;
}

/// Write-side question use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionsCommand: Send + Sync {
    /// Store a question asked by `author`.
    async fn create(&self, author: &Identity, submission: NewQuestion) -> Result<Question, Error>;
}
