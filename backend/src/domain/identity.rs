//! Who is making the current request.
//!
//! Pages that render differently for guests take a [`Viewer`]; handlers that
//! need a signed-in user take an [`Identity`] directly. Modelling the guest
//! case as a variant keeps callers from forgetting it.

use serde::Serialize;

use super::user::{Email, User, UserId, Username};

/// Identity decoded from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    user_id: UserId,
    username: Username,
    email: Email,
}

impl Identity {
    /// Assemble an identity from validated parts.
    pub fn new(user_id: UserId, username: Username, email: Email) -> Self {
        Self {
            user_id,
            username,
            email,
        }
    }

    /// Identifier of the signed-in user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Username of the signed-in user.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Email of the signed-in user.
    pub fn email(&self) -> &Email {
        &self.email
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self::new(
            user.id().clone(),
            user.username().clone(),
            user.email().clone(),
        )
    }
}

/// The requester as seen by a soft-gated page.
///
/// # Examples
/// ```
/// use coredump::domain::Viewer;
///
/// let viewer = Viewer::Guest;
/// assert!(viewer.identity().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Viewer {
    /// A request carrying a valid access token.
    Member(Identity),
    /// No credential, or one that failed verification.
    #[default]
    Guest,
}

impl Viewer {
    /// Identity when signed in.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Member(identity) => Some(identity),
            Self::Guest => None,
        }
    }

    /// Consume the viewer, yielding the identity when signed in.
    pub fn into_identity(self) -> Option<Identity> {
        match self {
            Self::Member(identity) => Some(identity),
            Self::Guest => None,
        }
    }
}
