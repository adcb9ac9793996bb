//! Demo content seeded at startup when `COREDUMP_DEMO_DATA` is set.

use tracing::info;

use crate::domain::ports::{AccountService, QuestionsCommand};
use crate::domain::{Error, Identity, NewAccount, NewQuestion};

/// Password shared by every demo account.
pub const DEMO_PASSWORD: &str = "correct horse battery";

const ACCOUNTS: [(&str, &str); 2] = [("ada", "ada@example.com"), ("grace", "grace@example.com")];

const QUESTIONS: [(usize, &str, &str); 3] = [
    (
        0,
        "Why does the borrow checker reject my loop?",
        "<p>I hold a <code>&amp;mut</code> into a <code>Vec</code> while pushing to it.</p>",
    ),
    (
        1,
        "When should I reach for Rc over Arc?",
        "<p>Is there a <em>measurable</em> cost to <code>Arc</code> on one thread?</p>",
    ),
    (
        0,
        "How do I read a file line by line?",
        "<ul><li>BufReader?</li><li>read_to_string?</li></ul>",
    ),
];

fn invalid_seed(err: impl std::fmt::Display) -> Error {
    Error::internal(format!("invalid demo data: {err}"))
}

/// Register the demo accounts and post their questions.
///
/// Returns how many questions were posted.
///
/// # Errors
/// Propagates registration and storage failures, including conflicts when
/// the accounts already exist.
pub async fn seed_demo_data(
    accounts: &dyn AccountService,
    questions: &dyn QuestionsCommand,
) -> Result<usize, Error> {
    let mut authors = Vec::with_capacity(ACCOUNTS.len());
    for (username, email) in ACCOUNTS {
        let account = NewAccount::try_from_parts(username, email, DEMO_PASSWORD, DEMO_PASSWORD)
            .map_err(invalid_seed)?;
        let user = accounts.register(account).await?;
        authors.push(Identity::from(&user));
    }

    let mut posted = 0;
    for (index, title, body) in QUESTIONS {
        let Some(author) = authors.get(index) else {
            return Err(invalid_seed(format!("no author at index {index}")));
        };
        let submission = NewQuestion::try_new(title, body).map_err(invalid_seed)?;
        questions.create(author, submission).await?;
        posted += 1;
    }
    info!(
        accounts = authors.len(),
        questions = posted,
        "demo data seeded"
    );
    Ok(posted)
}
