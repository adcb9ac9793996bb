//! Questions posted to the feed.

use std::fmt;

use ammonia::Builder;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::user::{UserId, Username};

/// Maximum question title length in characters.
pub const TITLE_MAX: usize = 255;

/// Stable question identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QuestionId(Uuid);

impl QuestionId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation failures for a question submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
    EmptyBody,
}

impl fmt::Display for QuestionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::EmptyBody => write!(f, "body must not be empty"),
        }
    }
}

impl std::error::Error for QuestionValidationError {}

impl QuestionValidationError {
    /// Form field the failure belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::EmptyBody => "body",
        }
    }
}

/// Validated submission from the add-question form.
///
/// The body is expected to have passed the request sanitiser already; it may
/// contain the allow-listed markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    title: String,
    body: String,
}

impl NewQuestion {
    /// Validate a title/body pair.
    pub fn try_new(title: &str, body: &str) -> Result<Self, QuestionValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(QuestionValidationError::EmptyTitle);
        }
        if title.chars().count() > TITLE_MAX {
            return Err(QuestionValidationError::TitleTooLong { max: TITLE_MAX });
        }
        if body.trim().is_empty() {
            return Err(QuestionValidationError::EmptyBody);
        }
        Ok(Self {
            title: title.to_owned(),
            body: body.to_owned(),
        })
    }

    /// Question title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Question body.
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// A stored question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    author_id: UserId,
    author: Username,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    #[serde(skip)]
    search_text: String,
}

/// Lowercased visible text of a title and body, markup removed.
fn searchable_text(title: &str, body: &str) -> String {
    let text = Builder::empty().clean(&format!("{title}\n{body}")).to_string();
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .to_lowercase()
}

impl Question {
    /// Materialise a stored question.
    pub fn new(
        id: QuestionId,
        author_id: UserId,
        author: Username,
        submission: NewQuestion,
        created_at: DateTime<Utc>,
    ) -> Self {
        let NewQuestion { title, body } = submission;
        let search_text = searchable_text(&title, &body);
        Self {
            id,
            author_id,
            author,
            title,
            body,
            created_at,
            search_text,
        }
    }

    /// Question identifier.
    pub fn id(&self) -> QuestionId {
        self.id
    }

    /// Identifier of the asking user.
    pub fn author_id(&self) -> &UserId {
        &self.author_id
    }

    /// Username of the asking user.
    pub fn author(&self) -> &Username {
        &self.author
    }

    /// Question title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Question body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Creation timestamp used for feed ordering.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Case-insensitive match against the visible text of title or body.
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        self.search_text.contains(needle_lowercase)
    }
}
