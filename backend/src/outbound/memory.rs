//! In-process store implementing every data port.
//!
//! Backs the server when no external database is configured and gives
//! integration tests a real adapter. Each collection sits behind its own
//! async lock; no lock is held across an await on another collection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::RwLock;

use crate::domain::ports::{
    AccountPersistenceError, AccountRecord, AccountRepository, QuestionsCommand, QuestionsQuery,
    UsersQuery,
};
use crate::domain::{Email, Error, Identity, NewQuestion, Question, QuestionId, User};

/// Shared in-memory store.
#[derive(Clone)]
pub struct MemoryStore {
    accounts: Arc<RwLock<HashMap<Email, AccountRecord>>>,
    questions: Arc<RwLock<Vec<Question>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create an empty store stamping questions with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            questions: Arc::new(RwLock::new(Vec::new())),
            clock,
        }
    }

    /// Insert a fully formed question, bypassing the clock.
    pub async fn seed_question(&self, question: Question) {
        self.questions.write().await.push(question);
    }

    /// Number of stored questions.
    pub async fn question_count(&self) -> usize {
        self.questions.read().await.len()
    }
}

fn newest_first(mut questions: Vec<Question>, limit: usize) -> Vec<Question> {
    questions.sort_by_key(|question| std::cmp::Reverse(question.created_at()));
    questions.truncate(limit);
    questions
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn insert(&self, record: AccountRecord) -> Result<(), AccountPersistenceError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(record.user.email()) {
            return Err(AccountPersistenceError::conflict("email"));
        }
        if accounts
            .values()
            .any(|existing| existing.user.username() == record.user.username())
        {
            return Err(AccountPersistenceError::conflict("username"));
        }
        accounts.insert(record.user.email().clone(), record);
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AccountRecord>, AccountPersistenceError> {
        Ok(self.accounts.read().await.get(email).cloned())
    }
}

#[async_trait]
impl UsersQuery for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, Error> {
        let mut users: Vec<User> = self
            .accounts
            .read()
            .await
            .values()
            .map(|record| record.user.clone())
            .collect();
        users.sort_by(|a, b| a.username().as_ref().cmp(b.username().as_ref()));
        Ok(users)
    }
}

#[async_trait]
impl QuestionsQuery for MemoryStore {
    async fn recent(&self, limit: usize) -> Result<Vec<Question>, Error> {
        let questions = self.questions.read().await.clone();
        Ok(newest_first(questions, limit))
    }

    async fn find(&self, id: QuestionId) -> Result<Option<Question>, Error> {
        Ok(self
            .questions
            .read()
            .await
            .iter()
            .find(|question| question.id() == id)
            .cloned())
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Question>, Error> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let matches = self
            .questions
            .read()
            .await
            .iter()
            .filter(|question| question.matches(&needle))
            .cloned()
            .collect();
        Ok(newest_first(matches, limit))
    }
}

#[async_trait]
impl QuestionsCommand for MemoryStore {
    async fn create(&self, author: &Identity, submission: NewQuestion) -> Result<Question, Error> {
        let question = Question::new(
            QuestionId::random(),
            author.user_id().clone(),
            author.username().clone(),
            submission,
            self.clock.utc(),
        );
        self.questions.write().await.push(question.clone());
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{UserId, Username};
    use chrono::{DateTime, Duration, Local, TimeZone, Utc};
    use rstest::{fixture, rstest};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn store() -> MemoryStore {
        MemoryStore::new(Arc::new(FixedClock(epoch())))
    }

    fn record(username: &str, email: &str) -> AccountRecord {
        AccountRecord {
            user: User::new(
                UserId::random(),
                Username::new(username).expect("username"),
                Email::new(email).expect("email"),
            ),
            password_hash: "hash".to_owned(),
        }
    }

    fn question(title: &str, minutes: i64) -> Question {
        Question::new(
            QuestionId::random(),
            UserId::random(),
            Username::new("ada").expect("username"),
            NewQuestion::try_new(title, "body text").expect("valid question"),
            epoch() + Duration::minutes(minutes),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn insert_rejects_duplicate_email_and_username(store: MemoryStore) {
        store
            .insert(record("ada", "ada@example.com"))
            .await
            .expect("first insert");
        assert_eq!(
            store.insert(record("grace", "ada@example.com")).await,
            Err(AccountPersistenceError::conflict("email"))
        );
        assert_eq!(
            store.insert(record("ada", "other@example.com")).await,
            Err(AccountPersistenceError::conflict("username"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn list_users_is_sorted_by_username(store: MemoryStore) {
        store.insert(record("grace", "grace@example.com")).await.expect("insert");
        store.insert(record("ada", "ada@example.com")).await.expect("insert");
        let names: Vec<String> = store
            .list_users()
            .await
            .expect("users")
            .into_iter()
            .map(|user| user.username().to_string())
            .collect();
        assert_eq!(names, ["ada", "grace"]);
    }

    #[rstest]
    #[tokio::test]
    async fn recent_returns_newest_first_up_to_limit(store: MemoryStore) {
        for minute in 0..12 {
            store.seed_question(question(&format!("q{minute}"), minute)).await;
        }
        let titles: Vec<String> = store
            .recent(10)
            .await
            .expect("recent")
            .iter()
            .map(|q| q.title().to_owned())
            .collect();
        assert_eq!(titles.len(), 10);
        assert_eq!(titles.first().map(String::as_str), Some("q11"));
        assert_eq!(titles.last().map(String::as_str), Some("q2"));
    }

    #[rstest]
    #[tokio::test]
    async fn search_ignores_case_and_blank_terms(store: MemoryStore) {
        store.seed_question(question("Lifetimes explained", 0)).await;
        store.seed_question(question("Async traits", 1)).await;
        let hits = store.search("LIFETIME", 10).await.expect("search");
        assert_eq!(hits.len(), 1);
        assert!(store.search("   ", 10).await.expect("search").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn search_skips_markup(store: MemoryStore) {
        store
            .seed_question(Question::new(
                QuestionId::random(),
                UserId::random(),
                Username::new("ada").expect("username"),
                NewQuestion::try_new("Traits", r#"<p>See <a href="x">this</a></p>"#)
                    .expect("valid question"),
                epoch(),
            ))
            .await;
        assert!(store.search("href", 10).await.expect("search").is_empty());
        assert!(store.search("p", 10).await.expect("search").is_empty());
        assert_eq!(store.search("see this", 10).await.expect("search").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn create_stamps_author_and_clock(store: MemoryStore) {
        let author = Identity::new(
            UserId::random(),
            Username::new("ada").expect("username"),
            Email::new("ada@example.com").expect("email"),
        );
        let submission = NewQuestion::try_new("Title", "Body").expect("valid");
        let created = store.create(&author, submission).await.expect("create");
        assert_eq!(created.created_at(), epoch());
        assert_eq!(created.author().as_ref(), "ada");
        assert_eq!(
            store.find(created.id()).await.expect("find"),
            Some(created)
        );
    }
}
