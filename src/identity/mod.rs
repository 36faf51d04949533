//! Identity and session policy for the admin console.
//! Users and roster, the persisted session slot, the auth provider and the route guard.

mod user;
mod password;
mod roster;
mod session;
mod provider;
mod guard;

pub use user::{UserRecord, SessionRecord, Identity};
pub use password::{hash_password, verify_password};
pub use roster::{IdentityStore, InMemoryRoster, RosterEntry};
pub use session::{Credential, SessionState, SessionStore, issue_token};
pub use provider::{
    AuthProvider, LocalAuthProvider, LoginRequest, RegisterRequest, ForgotPasswordRequest, UpdatePasswordRequest,
    HttpError, AuthActionResponse, CheckResponse, OnErrorResponse, HOME_PATH, LOGIN_PATH, REGISTER_PATH, DEFAULT_ROLE,
};
pub use guard::{GuardDecision, RouteGuard};
