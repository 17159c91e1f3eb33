use std::sync::Arc;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{password::Hasher, repo::UserStore, repo_types::User},
    error::ApiError,
    store::StoreResult,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Registration and credential checks on top of a `UserStore`.
#[derive(Clone)]
pub struct Credentials {
    users: Arc<dyn UserStore>,
    hasher: Arc<Hasher>,
}

impl Credentials {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<Hasher>) -> Self {
        Self { users, hasher }
    }

    /// Create a user. Emails are compared exactly as given.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, ApiError> {
        if !is_valid_email(email) {
            warn!("registration with invalid email");
            return Err(ApiError::InvalidEmail);
        }

        // cheap pre-check so a duplicate doesn't pay for a hash; the store
        // insert remains the authoritative uniqueness check
        if self.users.find_by_email(email).await?.is_some() {
            warn!("email already registered");
            return Err(ApiError::Conflict);
        }

        let password = password.to_owned();
        let hash = self.with_hasher(move |h| h.hash(&password)).await??;
        let user = self.users.insert(email, &hash).await.map_err(|e| {
            warn!(error = %e, "user insert failed");
            ApiError::from(e)
        })?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check an email/password pair. Unknown email and wrong password yield
    /// the same error after the same amount of hashing work.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let password = password.to_owned();
        let Some(user) = self.users.find_by_email(email).await? else {
            self.with_hasher(move |h| h.verify_dummy(&password)).await?;
            warn!("login failed");
            return Err(ApiError::InvalidCredentials);
        };

        let stored = user.password_hash.clone();
        if !self.with_hasher(move |h| h.verify(&password, &stored)).await? {
            warn!(user_id = %user.id, "login failed");
            return Err(ApiError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    pub async fn find(&self, email: &str) -> StoreResult<Option<User>> {
        self.users.find_by_email(email).await
    }

    /// Run argon2 work on the blocking pool so it doesn't stall the runtime.
    async fn with_hasher<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Hasher) -> T + Send + 'static,
        T: Send + 'static,
    {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || f(&hasher))
            .await
            .context("password hashing task failed")
    }
}
