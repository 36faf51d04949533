//! Single-flight credential renewal.
//!
//! Callers that saw an authorization failure present the credential their request was sent
//! with. While a renewal is running every caller joins it. Once it settles, the outcome is
//! remembered against the credential it replaced and the session generation at that moment,
//! so late failures of requests that used the same stale credential reuse that outcome
//! instead of calling the refresh endpoint again. Requests sent without a credential never
//! reuse a settled outcome, and a sign-in or logout retires it.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::AuthResult;
use crate::identity::Credential;

type RenewalFuture = Shared<BoxFuture<'static, AuthResult<Credential>>>;

struct Settled {
    replaced: Credential,
    generation: u64,
    outcome: AuthResult<Credential>,
}

#[derive(Default)]
struct GateState {
    inflight: Option<(Option<Credential>, RenewalFuture)>,
    settled: Option<Settled>,
}

#[derive(Default)]
pub struct RenewalGate {
    state: Mutex<GateState>,
    started: AtomicU64,
}

impl RenewalGate {
    pub fn new() -> Self { Self::default() }

    /// Renew on behalf of a request that failed while carrying `stale`.
    /// `generation` reports the current session generation. `start` is only invoked when no
    /// renewal is running and none has settled for `stale` within the current generation.
    pub async fn run<G, F, Fut>(&self, stale: Option<&str>, generation: G, start: F) -> AuthResult<Credential>
    where
        G: Fn() -> u64,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AuthResult<Credential>> + Send + 'static,
    {
        let fut = {
            let mut st = self.state.lock();
            if let (Some(done), Some(stale)) = (&st.settled, stale) {
                if done.replaced == stale && done.generation == generation() {
                    return done.outcome.clone();
                }
            }
            let joined = st.inflight.as_ref().map(|(_, f)| f.clone());
            match joined {
                Some(f) => f,
                None => {
                    let f = start().boxed().shared();
                    st.inflight = Some((stale.map(str::to_string), f.clone()));
                    let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(target: "adminauth::renewal", "renewal.start n={}", n);
                    f
                }
            }
        };
        let outcome = fut.clone().await;
        let mut st = self.state.lock();
        let ours = st.inflight.as_ref().map(|(_, f)| f.ptr_eq(&fut)).unwrap_or(false);
        if ours {
            st.settled = match st.inflight.take() {
                Some((Some(replaced), _)) => Some(Settled { replaced, generation: generation(), outcome: outcome.clone() }),
                _ => None,
            };
        }
        outcome
    }

    pub fn in_flight(&self) -> bool { self.state.lock().inflight.is_some() }

    /// Number of renewals actually started (joined callers are not counted).
    pub fn renewals_started(&self) -> u64 { self.started.load(Ordering::SeqCst) }
}
