//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountService, QuestionsCommand, QuestionsQuery, UsersQuery};

/// Parameter object bundling the port implementations.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountService>,
    pub users: Arc<dyn UsersQuery>,
    pub questions: Arc<dyn QuestionsQuery>,
    pub question_commands: Arc<dyn QuestionsCommand>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub users: Arc<dyn UsersQuery>,
    pub questions: Arc<dyn QuestionsQuery>,
    pub question_commands: Arc<dyn QuestionsCommand>,
}

impl HttpState {
    /// Construct state from the port bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            users,
            questions,
            question_commands,
        } = ports;
        Self {
            accounts,
            users,
            questions,
            question_commands,
        }
    }
}
