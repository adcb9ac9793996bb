//! Signup and login backed by an [`AccountRepository`].
//!
//! Passwords are stored as Argon2id PHC strings. Hashing runs on the blocking
//! pool so a burst of logins does not stall the request workers.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{AccountPersistenceError, AccountRecord, AccountRepository, AccountService};
use crate::domain::{Error, LoginCredentials, NewAccount, User, UserId};

/// Hash of a throwaway password, verified when the email is unknown so both
/// branches cost the same.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

/// [`AccountService`] implementation hashing passwords with Argon2id.
#[derive(Clone)]
pub struct PasswordAccountService {
    accounts: Arc<dyn AccountRepository>,
}

impl PasswordAccountService {
    /// Build the service over an account repository.
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }
}

fn map_persistence_error(error: AccountPersistenceError) -> Error {
    match &error {
        AccountPersistenceError::Conflict { field } => {
            Error::invalid_request(error.to_string())
                .with_title("Bad request.")
                .with_details(json!([{ "field": field, "message": error.to_string() }]))
        }
        AccountPersistenceError::Query { .. } => {
            Error::internal("account storage failed").with_cause(&error)
        }
    }
}

fn login_failed() -> Error {
    Error::unauthorized("The provided credentials were invalid.").with_title("Login failed")
}

async fn hash_password(password: Zeroizing<String>) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| Error::internal(format!("password hashing failed: {err}")))
    })
    .await
    .map_err(|err| Error::internal("password hashing task failed").with_cause(&err))?
}

async fn verify_password(password: Zeroizing<String>, phc: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&phc)
            .map_err(|err| Error::internal(format!("stored password hash is invalid: {err}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|err| Error::internal("password verification task failed").with_cause(&err))?
}

#[async_trait]
impl AccountService for PasswordAccountService {
    async fn register(&self, account: NewAccount) -> Result<User, Error> {
        let password_hash = hash_password(Zeroizing::new(account.password().to_owned())).await?;
        let user = User::new(
            UserId::random(),
            account.username().clone(),
            account.email().clone(),
        );
        self.accounts
            .insert(AccountRecord {
                user: user.clone(),
                password_hash,
            })
            .await
            .map_err(map_persistence_error)?;
        info!(user_id = %user.id(), "account registered");
        Ok(user)
    }

    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let record = self
            .accounts
            .find_by_email(credentials.email())
            .await
            .map_err(map_persistence_error)?;
        let password = Zeroizing::new(credentials.password().to_owned());
        let Some(record) = record else {
            verify_password(password, DUMMY_HASH.to_owned()).await?;
            warn!("login attempt for unknown email");
            return Err(login_failed());
        };

        if verify_password(password, record.password_hash).await? {
            Ok(record.user)
        } else {
            warn!(user_id = %record.user.id(), "login attempt with wrong password");
            Err(login_failed())
        }
    }
}
