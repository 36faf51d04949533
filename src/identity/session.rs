use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::Engine;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::user::{SessionRecord, UserRecord};
use crate::error::{AuthError, AuthResult};
use crate::storage::SharedSlots;

pub type Credential = String;

/// Explicit session state; the storage slot is only its persistence backing.
/// Any present slot is a signed-in session; a bare credential carries no profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Credentialed,
    Authenticated(UserRecord),
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool { !matches!(self, SessionState::Anonymous) }
}

#[derive(Debug, Clone)]
struct Slot {
    state: SessionState,
    token: Option<Credential>,
}

impl Slot {
    fn empty() -> Self { Self { state: SessionState::Anonymous, token: None } }

    /// Interpret a stored slot value. JSON objects are session records, a JSON string or
    /// any non-JSON text is a raw credential without a user profile.
    fn decode(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() { return Self::empty(); }
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(obj)) => match serde_json::from_value::<SessionRecord>(serde_json::Value::Object(obj)) {
                Ok(rec) => Self { state: SessionState::Authenticated(rec.user), token: rec.token },
                Err(e) => {
                    warn!(target: "adminauth::session", "stored session record is malformed: {}", e);
                    Self::empty()
                }
            },
            Ok(serde_json::Value::String(s)) if !s.is_empty() => Self { state: SessionState::Credentialed, token: Some(s) },
            Ok(serde_json::Value::String(_)) | Ok(serde_json::Value::Null) => Self::empty(),
            _ => Self { state: SessionState::Credentialed, token: Some(raw.to_string()) },
        }
    }

    fn encode(&self) -> AuthResult<Option<String>> {
        match (&self.state, &self.token) {
            (SessionState::Authenticated(user), token) => {
                let rec = SessionRecord { user: user.clone(), token: token.clone() };
                Ok(Some(serde_json::to_string(&rec)?))
            }
            (_, Some(token)) => Ok(Some(token.clone())),
            (_, None) => Ok(None),
        }
    }
}

/// 256-bit random credential, base64url without padding.
pub fn issue_token() -> AuthResult<Credential> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| AuthError::storage(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// Sole reader/writer of the session slot. Cheap to clone; clones share state.
/// Every mutation writes the whole slot through to storage while holding the lock.
///
/// `generation` moves whenever the signed-in party changes (sign-in, clear, reload), so
/// anything cached against an earlier session can tell it is stale. Credential renewal
/// keeps the generation.
#[derive(Clone)]
pub struct SessionStore {
    slots: SharedSlots,
    key: Arc<str>,
    current: Arc<RwLock<Slot>>,
    generation: Arc<AtomicU64>,
}

impl SessionStore {
    /// Load the session from `key` in `slots`.
    pub fn open(slots: SharedSlots, key: &str) -> AuthResult<Self> {
        let slot = match slots.get(key)? {
            Some(raw) => Slot::decode(&raw),
            None => Slot::empty(),
        };
        debug!(target: "adminauth::session", "session.open key={} signed_in={}", key, slot.state.is_signed_in());
        Ok(Self { slots, key: Arc::from(key), current: Arc::new(RwLock::new(slot)), generation: Arc::new(AtomicU64::new(0)) })
    }

    pub fn key(&self) -> &str { &self.key }

    pub fn state(&self) -> SessionState { self.current.read().state.clone() }

    pub fn is_authenticated(&self) -> bool { self.current.read().state.is_signed_in() }

    pub fn generation(&self) -> u64 { self.generation.load(Ordering::SeqCst) }

    pub fn user(&self) -> Option<UserRecord> {
        match &self.current.read().state {
            SessionState::Authenticated(u) => Some(u.clone()),
            SessionState::Anonymous | SessionState::Credentialed => None,
        }
    }

    pub fn credential(&self) -> Option<Credential> { self.current.read().token.clone() }

    /// Anonymous -> Authenticated.
    pub fn sign_in(&self, user: UserRecord, token: Option<Credential>) -> AuthResult<()> {
        let email = user.email.clone();
        self.replace(|_| Slot { state: SessionState::Authenticated(user), token })?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!(target: "adminauth::session", "session.sign_in user={}", email);
        Ok(())
    }

    /// Store a renewed credential, keeping the signed-in user if there is one.
    pub fn set_credential(&self, token: &str) -> AuthResult<()> {
        self.replace(|cur| {
            let state = match &cur.state {
                SessionState::Anonymous => SessionState::Credentialed,
                other => other.clone(),
            };
            Slot { state, token: Some(token.to_string()) }
        })
    }

    /// Delete the slot. In-memory state is cleared even when storage fails, so a stale
    /// credential is never served again by this process.
    pub fn clear(&self) -> AuthResult<()> {
        let mut w = self.current.write();
        *w = Slot::empty();
        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!(target: "adminauth::session", "session.clear key={}", self.key);
        self.slots.remove(&self.key)
    }

    /// Re-read the slot, picking up writes made through another handle on the same storage.
    pub fn reload(&self) -> AuthResult<SessionState> {
        let mut w = self.current.write();
        *w = match self.slots.get(&self.key)? {
            Some(raw) => Slot::decode(&raw),
            None => Slot::empty(),
        };
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(w.state.clone())
    }

    fn replace(&self, next: impl FnOnce(&Slot) -> Slot) -> AuthResult<()> {
        let mut w = self.current.write();
        let slot = next(&w);
        match slot.encode()? {
            Some(v) => self.slots.set(&self.key, &v)?,
            None => self.slots.remove(&self.key)?,
        }
        *w = slot;
        Ok(())
    }
}
