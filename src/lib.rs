//! Authentication and session subsystem for the admin console.
//!
//! - [`identity`]: auth provider policy, roster, session store and route guard.
//! - [`client`]: outbound HTTP with credential injection and single-flight renewal.
//! - [`storage`]: durable key/value slots backing the session.

pub mod error;
pub mod config;
pub mod storage;
pub mod identity;
pub mod client;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult, ErrorPayload};
