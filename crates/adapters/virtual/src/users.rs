//! In-memory user directory.

use std::sync::{Mutex, MutexGuard, PoisonError};

use alerthub_app::ports::UserDirectory;
use alerthub_domain::error::HubError;
use alerthub_domain::id::UserId;
use alerthub_domain::user::UserRecord;

/// [`UserDirectory`] over a list of users kept in insertion order.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<Vec<UserRecord>>,
}

impl InMemoryUserDirectory {
    #[must_use]
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        let directory = Self::default();
        for user in users {
            directory.upsert(user);
        }
        directory
    }

    fn users(&self) -> MutexGuard<'_, Vec<UserRecord>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a user, or replace the one with the same uid in place.
    pub fn upsert(&self, user: UserRecord) {
        let mut users = self.users();
        match users.iter_mut().find(|u| u.uid == user.uid) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
    }

    pub fn len(&self) -> usize {
        self.users().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users().is_empty()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    async fn get_by_uid(&self, uid: &UserId) -> Result<Option<UserRecord>, HubError> {
        Ok(self.users().iter().find(|u| &u.uid == uid).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, HubError> {
        Ok(self
            .users()
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }
}
