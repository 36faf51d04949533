//! Unified auth error model.
//! Every failure the subsystem can produce is one of these variants. Each carries the
//! `{message, name}` pair that the hosting application renders; outcome types embed it
//! as an [`ErrorPayload`] instead of propagating the error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The uniform `{message, name}` shape attached to structured outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthError {
    #[error("{name}: {message}")]
    InvalidCredentials { message: String, name: String },
    #[error("{name}: {message}")]
    UserAlreadyExists { message: String, name: String },
    #[error("{name}: {message}")]
    Unauthorized { message: String, name: String },
    #[error("{name}: {message}")]
    AuthorizationRejected { message: String, name: String },
    #[error("{name}: {message}")]
    RenewalFailed { message: String, name: String },
    #[error("{name}: {message}")]
    PasswordReset { message: String, name: String },
    #[error("{name}: {message}")]
    PasswordUpdate { message: String, name: String },
    #[error("{name}: {message}")]
    UserInput { message: String, name: String },
    #[error("{name}: {message}")]
    Storage { message: String, name: String },
    #[error("{name}: {message}")]
    Transport { message: String, name: String },
}

impl AuthError {
    pub fn invalid_credentials() -> Self {
        AuthError::InvalidCredentials { message: "Invalid credentials".into(), name: "Invalid email or password".into() }
    }
    pub fn user_already_exists() -> Self {
        AuthError::UserAlreadyExists { message: "Register error".into(), name: "User already exists".into() }
    }
    pub fn unauthorized() -> Self {
        AuthError::Unauthorized { message: "Check failed".into(), name: "Unauthorized".into() }
    }
    pub fn password_reset() -> Self {
        AuthError::PasswordReset { message: "Forgot password error".into(), name: "Email address does not exist".into() }
    }
    pub fn password_update() -> Self {
        AuthError::PasswordUpdate { message: "Update password error".into(), name: "Invalid password".into() }
    }
    pub fn rejected<S: Into<String>>(name: S, msg: S) -> Self { AuthError::AuthorizationRejected { message: msg.into(), name: name.into() } }
    pub fn renewal<S: Into<String>>(msg: S) -> Self { AuthError::RenewalFailed { message: msg.into(), name: "RenewalFailed".into() } }
    pub fn user_input<S: Into<String>>(msg: S) -> Self { AuthError::UserInput { message: msg.into(), name: "Invalid input".into() } }
    pub fn storage<S: Into<String>>(msg: S) -> Self { AuthError::Storage { message: msg.into(), name: "StorageError".into() } }
    pub fn transport<S: Into<String>>(msg: S) -> Self { AuthError::Transport { message: msg.into(), name: "TransportError".into() } }

    pub fn message(&self) -> &str {
        match self {
            AuthError::InvalidCredentials { message, .. }
            | AuthError::UserAlreadyExists { message, .. }
            | AuthError::Unauthorized { message, .. }
            | AuthError::AuthorizationRejected { message, .. }
            | AuthError::RenewalFailed { message, .. }
            | AuthError::PasswordReset { message, .. }
            | AuthError::PasswordUpdate { message, .. }
            | AuthError::UserInput { message, .. }
            | AuthError::Storage { message, .. }
            | AuthError::Transport { message, .. } => message.as_str(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AuthError::InvalidCredentials { name, .. }
            | AuthError::UserAlreadyExists { name, .. }
            | AuthError::Unauthorized { name, .. }
            | AuthError::AuthorizationRejected { name, .. }
            | AuthError::RenewalFailed { name, .. }
            | AuthError::PasswordReset { name, .. }
            | AuthError::PasswordUpdate { name, .. }
            | AuthError::UserInput { name, .. }
            | AuthError::Storage { name, .. }
            | AuthError::Transport { name, .. } => name.as_str(),
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload { message: self.message().to_string(), name: self.name().to_string() }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials { .. } => 401,
            AuthError::UserAlreadyExists { .. } => 409,
            AuthError::Unauthorized { .. } => 401,
            AuthError::AuthorizationRejected { .. } => 403,
            AuthError::RenewalFailed { .. } => 401,
            AuthError::PasswordReset { .. } => 404,
            AuthError::PasswordUpdate { .. } => 400,
            AuthError::UserInput { .. } => 400,
            AuthError::Storage { .. } => 500,
            AuthError::Transport { .. } => 503,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self { AuthError::transport(err.to_string()) }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self { AuthError::storage(err.to_string()) }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self { AuthError::storage(err.to_string()) }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
