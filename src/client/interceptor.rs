use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, warn};

use super::renewal::RenewalGate;
use super::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::identity::{Credential, SessionStore};

/// Body of a successful `POST /auth/token/refresh`.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
}

struct Inner {
    transport: Arc<dyn HttpTransport>,
    session: SessionStore,
    refresh_path: String,
    renew_on_status: Vec<u16>,
    gate: RenewalGate,
}

/// HTTP client that carries the session credential on every request and recovers once from
/// a rejected credential. Cheap to clone; clones share the session and the renewal gate.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<Inner>,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn HttpTransport>, session: SessionStore, cfg: &AuthConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                session,
                refresh_path: cfg.refresh_path.clone(),
                renew_on_status: cfg.renew_on_status.clone(),
                gate: RenewalGate::new(),
            }),
        }
    }

    /// Client over `reqwest` pointed at `cfg.api_base`.
    pub fn from_config(cfg: &AuthConfig, session: SessionStore) -> AuthResult<Self> {
        let transport = ReqwestTransport::from_config(cfg)?;
        Ok(Self::new(Arc::new(transport), session, cfg))
    }

    pub fn session(&self) -> &SessionStore { &self.inner.session }

    pub fn renewals_started(&self) -> u64 { self.inner.gate.renewals_started() }

    /// Per-request hook: set `Authorization: Bearer <credential>`. Requests without a credential
    /// still go out (with an empty bearer); rejecting them is the server's call.
    /// Returns the credential that was attached.
    pub fn attach_credential(&self, req: &mut ApiRequest) -> Option<Credential> {
        let token = self.inner.session.credential();
        req.set_bearer(token.as_deref());
        debug!(target: "adminauth::client", "attach {} {} credential={}", req.method, req.path, token.is_some());
        token
    }

    /// Send `req` with the current credential. On an authorization failure the credential is
    /// renewed (single-flight, skipped when the session already holds a newer credential than
    /// the one sent) and the request is retried exactly once with the new one; the
    /// retry's response is returned whatever its status. A failed renewal deletes the stored
    /// session and fails the request with `RenewalFailed`.
    pub async fn send(&self, mut req: ApiRequest) -> AuthResult<ApiResponse> {
        let sent_with = self.attach_credential(&mut req);
        let resp = self.inner.transport.send(&req).await?;
        if req.skip_renewal || !self.inner.renew_on_status.contains(&resp.status) {
            return Ok(resp);
        }
        let token = match self.inner.session.credential() {
            Some(current) if sent_with.as_deref() != Some(current.as_str()) => {
                debug!(target: "adminauth::client", "{} {} rejected with a replaced credential, retrying", req.method, req.path);
                current
            }
            _ => {
                warn!(target: "adminauth::client", "{} {} rejected with HTTP {}, renewing credential", req.method, req.path, resp.status);
                self.renew_after_failure(sent_with.as_deref()).await?
            }
        };
        req.set_bearer(Some(&token));
        self.inner.transport.send(&req).await
    }

    /// Force a renewal of the current credential.
    pub async fn renew(&self) -> AuthResult<Credential> {
        let current = self.inner.session.credential();
        self.renew_after_failure(current.as_deref()).await
    }

    async fn renew_after_failure(&self, stale: Option<&str>) -> AuthResult<Credential> {
        let inner = self.inner.clone();
        let session = &self.inner.session;
        self.inner.gate.run(stale, || session.generation(), move || refresh(inner)).await
    }
}

/// One call to the refresh endpoint. Goes straight to the transport, so an authorization
/// failure here can never trigger another renewal.
async fn refresh(inner: Arc<Inner>) -> AuthResult<Credential> {
    let mut req = ApiRequest::post(&inner.refresh_path).without_renewal();
    req.set_bearer(inner.session.credential().as_deref());
    let outcome = match inner.transport.send(&req).await {
        Ok(resp) if resp.is_success() => match resp.json::<RefreshResponse>() {
            Ok(body) if !body.token.is_empty() => Ok(body.token),
            Ok(_) => Err(AuthError::renewal("refresh endpoint returned an empty token")),
            Err(e) => Err(AuthError::renewal(format!("refresh endpoint returned an unreadable body: {}", e.message()))),
        },
        Ok(resp) => Err(AuthError::renewal(format!("refresh endpoint returned HTTP {}", resp.status))),
        Err(e) => Err(AuthError::renewal(format!("refresh request failed: {}", e.message()))),
    };
    let outcome = match outcome {
        Ok(token) => inner
            .session
            .set_credential(&token)
            .map(|_| token)
            .map_err(|e| AuthError::renewal(format!("could not persist renewed credential: {}", e.message()))),
        Err(e) => Err(e),
    };
    match outcome {
        Ok(token) => {
            debug!(target: "adminauth::client", "credential renewed");
            Ok(token)
        }
        Err(e) => {
            warn!(target: "adminauth::client", "credential renewal failed: {}", e.message());
            if let Err(clear_err) = inner.session.clear() {
                error!(target: "adminauth::client", "could not delete stale credential: {}", clear_err);
            }
            Err(e)
        }
    }
}
