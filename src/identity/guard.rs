use std::sync::Arc;

use super::provider::{AuthProvider, LOGIN_PATH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(String),
}

/// Route guard for protected views, driven by [`AuthProvider::check`].
#[derive(Clone)]
pub struct RouteGuard {
    provider: Arc<dyn AuthProvider>,
}

impl RouteGuard {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self { Self { provider } }

    pub async fn is_authenticated(&self) -> bool { self.provider.check().await.authenticated }

    pub async fn decide(&self) -> GuardDecision {
        let out = self.provider.check().await;
        if out.authenticated {
            GuardDecision::Render
        } else {
            GuardDecision::Redirect(out.redirect_to.unwrap_or_else(|| LOGIN_PATH.to_string()))
        }
    }
}
