use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::password::{hash_password, verify_password};
use super::roster::{IdentityStore, RosterEntry};
use super::session::{issue_token, SessionStore};
use super::user::{Identity, UserRecord};
use crate::config::AuthConfig;
use crate::error::{AuthError, ErrorPayload};

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";

/// Role granted to self-registered users.
pub const DEFAULT_ROLE: &str = "editor";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

/// An error reported by the data layer, carrying the HTTP status when there was one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub name: String,
}

impl HttpError {
    pub fn with_status(status: u16, message: &str) -> Self {
        Self { status: Some(status), message: message.to_string(), name: format!("HTTP {}", status) }
    }
}

impl From<&AuthError> for HttpError {
    fn from(err: &AuthError) -> Self {
        Self { status: Some(err.http_status()), message: err.message().to_string(), name: err.name().to_string() }
    }
}

/// Outcome of login, logout, register, forgotPassword and updatePassword.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl AuthActionResponse {
    fn ok(redirect_to: &str) -> Self {
        Self { success: true, redirect_to: Some(redirect_to.to_string()), error: None }
    }

    fn failed(err: &AuthError, redirect_to: Option<&str>) -> Self {
        Self { success: false, redirect_to: redirect_to.map(str::to_string), error: Some(err.payload()) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logout: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// `{}` means "no action"; a forced logout carries the redirect and the original error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logout: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<HttpError>,
}

impl OnErrorResponse {
    pub fn forces_logout(&self) -> bool { self.logout == Some(true) }
}

/// Identity and session policy as seen by the hosting application.
/// Every operation resolves to an outcome value; none of them fail with `Err`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self, req: &LoginRequest) -> AuthActionResponse;
    async fn check(&self) -> CheckResponse;
    async fn logout(&self) -> AuthActionResponse;
    async fn on_error(&self, err: &HttpError) -> OnErrorResponse;
    async fn register(&self, req: &RegisterRequest) -> AuthActionResponse;
    async fn get_permissions(&self) -> Option<Vec<String>>;
    async fn get_identity(&self) -> Option<Identity>;
    async fn forgot_password(&self, req: &ForgotPasswordRequest) -> AuthActionResponse;
    async fn update_password(&self, req: &UpdatePasswordRequest) -> AuthActionResponse;
}

/// Provider backed by an injected identity store and the local session slot.
pub struct LocalAuthProvider {
    roster: Arc<dyn IdentityStore>,
    session: SessionStore,
    display_name: String,
    avatar_url: String,
}

impl LocalAuthProvider {
    pub fn new(roster: Arc<dyn IdentityStore>, session: SessionStore, cfg: &AuthConfig) -> Self {
        Self { roster, session, display_name: cfg.display_name.clone(), avatar_url: cfg.avatar_url.clone() }
    }

    pub fn session(&self) -> &SessionStore { &self.session }

    async fn authenticate(&self, req: &LoginRequest) -> Result<UserRecord, AuthError> {
        let Some(entry) = self.roster.find_by_email(&req.email).await? else {
            return Err(AuthError::invalid_credentials());
        };
        if let Some(phc) = entry.password_hash.as_deref() {
            if !verify_password(phc, &req.password) {
                return Err(AuthError::invalid_credentials());
            }
        }
        Ok(entry.user)
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn login(&self, req: &LoginRequest) -> AuthActionResponse {
        let user = match self.authenticate(req).await {
            Ok(u) => u,
            Err(e @ AuthError::InvalidCredentials { .. }) => {
                info!(target: "adminauth::auth", "auth.login rejected user={}", req.email);
                return AuthActionResponse::failed(&e, Some(REGISTER_PATH));
            }
            Err(e) => {
                error!(target: "adminauth::auth", "auth.login lookup failed user={}: {}", req.email, e);
                return AuthActionResponse::failed(&e, None);
            }
        };
        let signed_in = issue_token().and_then(|token| self.session.sign_in(user, Some(token)));
        if let Err(e) = signed_in {
            error!(target: "adminauth::auth", "auth.login could not persist session user={}: {}", req.email, e);
            return AuthActionResponse::failed(&e, None);
        }
        info!(target: "adminauth::auth", "auth.login user={}", req.email);
        AuthActionResponse::ok(HOME_PATH)
    }

    async fn check(&self) -> CheckResponse {
        if self.session.is_authenticated() {
            return CheckResponse { authenticated: true, ..Default::default() };
        }
        CheckResponse {
            authenticated: false,
            logout: Some(true),
            redirect_to: Some(LOGIN_PATH.to_string()),
            error: Some(AuthError::unauthorized().payload()),
        }
    }

    async fn logout(&self) -> AuthActionResponse {
        let who = self.session.user().map(|u| u.email).unwrap_or_default();
        if let Err(e) = self.session.clear() {
            error!(target: "adminauth::auth", "auth.logout could not delete session slot: {}", e);
        }
        info!(target: "adminauth::auth", "auth.logout user={}", who);
        AuthActionResponse::ok(LOGIN_PATH)
    }

    async fn on_error(&self, err: &HttpError) -> OnErrorResponse {
        match err.status {
            Some(401) | Some(403) => {
                warn!(target: "adminauth::auth", "auth.on_error forcing logout status={:?} name={}", err.status, err.name);
                OnErrorResponse { logout: Some(true), redirect_to: Some(LOGIN_PATH.to_string()), error: Some(err.clone()) }
            }
            _ => OnErrorResponse::default(),
        }
    }

    async fn register(&self, req: &RegisterRequest) -> AuthActionResponse {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return AuthActionResponse::failed(&AuthError::user_input("email and password are required"), None);
        }
        match self.roster.find_by_email(&req.email).await {
            Ok(Some(_)) => {
                info!(target: "adminauth::auth", "auth.register duplicate user={}", req.email);
                return AuthActionResponse::failed(&AuthError::user_already_exists(), None);
            }
            Ok(None) => {}
            Err(e) => return AuthActionResponse::failed(&e, None),
        }
        let entry = match hash_password(&req.password) {
            Ok(phc) => RosterEntry {
                user: UserRecord { email: req.email.clone(), roles: vec![DEFAULT_ROLE.to_string()] },
                password_hash: Some(phc),
            },
            Err(e) => return AuthActionResponse::failed(&e, None),
        };
        // append re-checks uniqueness under the store's own lock
        if let Err(e) = self.roster.append(entry).await {
            return AuthActionResponse::failed(&e, None);
        }
        info!(target: "adminauth::auth", "auth.register user={}", req.email);
        AuthActionResponse::ok(LOGIN_PATH)
    }

    async fn get_permissions(&self) -> Option<Vec<String>> {
        self.session.user().map(|u| u.roles)
    }

    async fn get_identity(&self) -> Option<Identity> {
        self.session.user().map(|u| Identity::from_record(&u, &self.display_name, &self.avatar_url))
    }

    async fn forgot_password(&self, req: &ForgotPasswordRequest) -> AuthActionResponse {
        // no reset channel exists for the in-memory roster
        info!(target: "adminauth::auth", "auth.forgot_password user={}", req.email);
        AuthActionResponse::failed(&AuthError::password_reset(), None)
    }

    async fn update_password(&self, _req: &UpdatePasswordRequest) -> AuthActionResponse {
        // the roster is append-only
        AuthActionResponse::failed(&AuthError::password_update(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::roster::InMemoryRoster;
    use crate::storage::{MemoryStorage, SlotStore, AUTH_KEY};

    fn provider() -> (MemoryStorage, Arc<InMemoryRoster>, LocalAuthProvider) {
        let mem = MemoryStorage::new();
        let roster = Arc::new(InMemoryRoster::seeded());
        let session = SessionStore::open(Arc::new(mem.clone()), AUTH_KEY).unwrap();
        let p = LocalAuthProvider::new(roster.clone(), session, &AuthConfig::default());
        (mem, roster, p)
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest { email: email.into(), password: password.into() }
    }

    #[tokio::test]
    async fn login_unknown_email_redirects_to_register() {
        let (mem, _, p) = provider();
        let out = p.login(&login("ghost@mail.com", "x")).await;
        assert!(!out.success);
        assert_eq!(out.redirect_to.as_deref(), Some("/register"));
        let err = out.error.unwrap();
        assert_eq!(err.message, "Invalid credentials");
        assert_eq!(err.name, "Invalid email or password");
        assert!(mem.get(AUTH_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn login_persists_record_and_token() {
        let (mem, _, p) = provider();
        let out = p.login(&login("jane@mail.com", "whatever")).await;
        assert_eq!(out, AuthActionResponse { success: true, redirect_to: Some("/".into()), error: None });
        let raw = mem.get(AUTH_KEY).unwrap().unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["email"], "jane@mail.com");
        assert!(v["token"].as_str().map(|t| !t.is_empty()).unwrap_or(false));
        assert!(p.session().credential().is_some());
    }

    #[tokio::test]
    async fn check_when_anonymous() {
        let (_, _, p) = provider();
        let out = p.check().await;
        assert!(!out.authenticated);
        assert_eq!(out.logout, Some(true));
        assert_eq!(out.redirect_to.as_deref(), Some("/login"));
        assert_eq!(out.error.unwrap().name, "Unauthorized");
    }

    #[tokio::test]
    async fn outcomes_serialize_camel_case_and_omit_absent_fields() {
        let (_, _, p) = provider();
        let v = serde_json::to_value(p.check().await).unwrap();
        assert_eq!(v["redirectTo"], "/login");
        assert_eq!(v["error"]["message"], "Check failed");

        p.login(&login("john@mail.com", "")).await;
        let v = serde_json::to_value(p.check().await).unwrap();
        assert_eq!(v, serde_json::json!({"authenticated": true}));

        let v = serde_json::to_value(p.on_error(&HttpError::with_status(500, "boom")).await).unwrap();
        assert_eq!(v, serde_json::json!({}));
    }

    #[tokio::test]
    async fn registered_password_is_verified() {
        let (_, _, p) = provider();
        let reg = p.register(&RegisterRequest { email: "new@mail.com".into(), password: "hunter22".into() }).await;
        assert!(reg.success);
        assert_eq!(reg.redirect_to.as_deref(), Some("/login"));

        let bad = p.login(&login("new@mail.com", "nope")).await;
        assert!(!bad.success);
        assert_eq!(bad.redirect_to.as_deref(), Some("/register"));

        let good = p.login(&login("new@mail.com", "hunter22")).await;
        assert!(good.success);
        assert_eq!(p.get_permissions().await, Some(vec!["editor".to_string()]));
    }

    #[tokio::test]
    async fn register_rejects_blank_input_without_touching_roster() {
        let (_, roster, p) = provider();
        let out = p.register(&RegisterRequest { email: "  ".into(), password: "pw".into() }).await;
        assert!(!out.success);
        assert_eq!(out.error.unwrap().name, "Invalid input");
        let out = p.register(&RegisterRequest { email: "a@b.c".into(), password: String::new() }).await;
        assert!(!out.success);
        assert_eq!(roster.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn register_does_not_sign_in() {
        let (_, _, p) = provider();
        p.register(&RegisterRequest { email: "new@mail.com".into(), password: "pw".into() }).await;
        assert!(!p.check().await.authenticated);
    }

    #[tokio::test]
    async fn password_flows_always_fail() {
        let (_, _, p) = provider();
        p.login(&login("john@mail.com", "")).await;
        let out = p.forgot_password(&ForgotPasswordRequest { email: "john@mail.com".into() }).await;
        assert!(!out.success);
        assert_eq!(out.error.as_ref().unwrap().message, "Forgot password error");
        assert_eq!(out.error.unwrap().name, "Email address does not exist");
        let out = p.update_password(&UpdatePasswordRequest { password: "new-password".into() }).await;
        assert!(!out.success);
        assert_eq!(out.error.as_ref().unwrap().message, "Update password error");
        assert_eq!(out.error.unwrap().name, "Invalid password");
        // neither flow touches the session
        assert!(p.check().await.authenticated);
    }

    #[tokio::test]
    async fn on_error_keeps_session_until_caller_logs_out() {
        let (_, _, p) = provider();
        p.login(&login("john@mail.com", "")).await;
        let err = HttpError::with_status(403, "forbidden");
        let out = p.on_error(&err).await;
        assert!(out.forces_logout());
        assert_eq!(out.error, Some(err));
        assert!(p.check().await.authenticated);
    }

    #[tokio::test]
    async fn raw_credential_slot_counts_as_signed_in() {
        let mem = MemoryStorage::new();
        mem.set(AUTH_KEY, "abc.def.ghi").unwrap();
        let session = SessionStore::open(Arc::new(mem.clone()), AUTH_KEY).unwrap();
        let p = LocalAuthProvider::new(Arc::new(InMemoryRoster::seeded()), session, &AuthConfig::default());

        let out = p.check().await;
        assert_eq!(out, CheckResponse { authenticated: true, ..Default::default() });
        assert_eq!(p.get_identity().await, None);
        assert_eq!(p.get_permissions().await, None);

        p.logout().await;
        assert!(!p.check().await.authenticated);
        assert!(mem.get(AUTH_KEY).unwrap().is_none());
    }

    #[test]
    fn http_error_from_auth_error() {
        let e = HttpError::from(&AuthError::renewal("refresh rejected"));
        assert_eq!(e.status, Some(401));
        assert_eq!(e.name, "RenewalFailed");
    }
}
