//! In-memory `UserRepository` with a unique email index.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, User, UserId};

#[derive(Default)]
struct Accounts {
    by_id: HashMap<UserId, User>,
    by_email: HashMap<EmailAddress, UserId>,
}

/// Account store held in a single lock; inserts check the email index and
/// write both maps atomically.
#[derive(Default)]
pub struct InMemoryUserRepository {
    accounts: RwLock<Accounts>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> UserPersistenceError {
    UserPersistenceError::query("account store lock poisoned")
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        if accounts.by_email.contains_key(user.email()) {
            return Err(UserPersistenceError::duplicate_email(user.email().as_str()));
        }
        if accounts.by_id.contains_key(user.id()) {
            return Err(UserPersistenceError::query(format!(
                "user id {} already exists",
                user.id()
            )));
        }
        accounts.by_email.insert(user.email().clone(), *user.id());
        accounts.by_id.insert(*user.id(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.by_id.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts
            .by_email
            .get(email)
            .and_then(|id| accounts.by_id.get(id))
            .cloned())
    }
}
