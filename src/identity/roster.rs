//! Identity store abstraction and the in-memory roster that stands in for a real identity backend.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::user::UserRecord;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub user: UserRecord,
    /// Argon2 PHC string. Seeded fixture users have none and accept any password.
    pub password_hash: Option<String>,
}

impl RosterEntry {
    pub fn without_password(user: UserRecord) -> Self { Self { user, password_hash: None } }
}

/// Lookup/append surface the auth provider needs from an identity backend.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<RosterEntry>>;
    /// Appends `entry`, failing with `UserAlreadyExists` when the email is taken.
    async fn append(&self, entry: RosterEntry) -> AuthResult<()>;
    async fn len(&self) -> AuthResult<usize>;
}

/// Ordered, append-only, unique by email. Lives as long as the value does.
#[derive(Debug, Default)]
pub struct InMemoryRoster {
    entries: RwLock<Vec<RosterEntry>>,
}

impl InMemoryRoster {
    pub fn new(entries: Vec<RosterEntry>) -> Self { Self { entries: RwLock::new(entries) } }

    /// The two fixture users every fresh process starts with.
    pub fn seeded() -> Self {
        Self::new(vec![
            RosterEntry::without_password(UserRecord::new("john@mail.com", &["admin"])),
            RosterEntry::without_password(UserRecord::new("jane@mail.com", &["editor"])),
        ])
    }

    pub fn emails(&self) -> Vec<String> {
        self.entries.read().iter().map(|e| e.user.email.clone()).collect()
    }
}

#[async_trait]
impl IdentityStore for InMemoryRoster {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<RosterEntry>> {
        Ok(self.entries.read().iter().find(|e| e.user.email == email).cloned())
    }

    async fn append(&self, entry: RosterEntry) -> AuthResult<()> {
        let mut w = self.entries.write();
        if w.iter().any(|e| e.user.email == entry.user.email) {
            return Err(AuthError::user_already_exists());
        }
        w.push(entry);
        Ok(())
    }

    async fn len(&self) -> AuthResult<usize> {
        Ok(self.entries.read().len())
    }
}
