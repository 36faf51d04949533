use serde::{Deserialize, Serialize};

/// A roster entry as seen by the session layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserRecord {
    pub fn new<S: Into<String>>(email: S, roles: &[&str]) -> Self {
        Self { email: email.into(), roles: roles.iter().map(|r| r.to_string()).collect() }
    }
}

/// What the `auth` slot holds: the signed-in user plus the bearer credential, if one was issued.
/// A bare `{email, roles}` document deserializes with `token: None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    #[serde(flatten)]
    pub user: UserRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Public profile derived from the stored user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub roles: Vec<String>,
    pub name: String,
    pub avatar: String,
}

impl Identity {
    pub fn from_record(user: &UserRecord, name: &str, avatar: &str) -> Self {
        Self { email: user.email.clone(), roles: user.roles.clone(), name: name.to_string(), avatar: avatar.to_string() }
    }
}
