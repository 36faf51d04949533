use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// An outbound request before it reaches the wire. `path` is joined onto the transport's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    /// Opt out of transparent renewal for this request.
    pub skip_renewal: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self { method, path: path.to_string(), headers: HeaderMap::new(), body: None, skip_renewal: false }
    }

    pub fn get(path: &str) -> Self { Self::new(Method::GET, path) }
    pub fn post(path: &str) -> Self { Self::new(Method::POST, path) }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn without_renewal(mut self) -> Self {
        self.skip_renewal = true;
        self
    }

    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
    }

    /// Set `Authorization: Bearer <token>`; an absent token yields `Bearer ` with nothing after it.
    pub fn set_bearer(&mut self, token: Option<&str>) {
        let value = format!("Bearer {}", token.unwrap_or(""));
        match HeaderValue::from_str(&value) {
            Ok(v) => { self.headers.insert(AUTHORIZATION, v); }
            // a token with control characters cannot be sent; fall back to an empty bearer
            Err(_) => { self.headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer ")); }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into() }
    }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

    pub fn json<T: DeserializeOwned>(&self) -> AuthResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| AuthError::transport(format!("invalid response body: {}", e)))
    }

    pub fn text(&self) -> String { String::from_utf8_lossy(&self.body).into_owned() }
}

/// The HTTP layer under the interceptor. Non-2xx statuses are responses, not errors;
/// `Err` means the request never produced a response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, req: &ApiRequest) -> AuthResult<ApiResponse>;
}

/// Default transport over `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base: &str, timeout: Duration) -> AuthResult<Self> {
        let base = Url::parse(base).map_err(|e| AuthError::transport(format!("invalid base URL '{}': {}", base, e)))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base, client })
    }

    pub fn from_config(cfg: &AuthConfig) -> AuthResult<Self> {
        Self::new(&cfg.api_base, cfg.request_timeout())
    }

    pub fn base(&self) -> &Url { &self.base }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, req: &ApiRequest) -> AuthResult<ApiResponse> {
        let url = self.base.join(&req.path).map_err(|e| AuthError::transport(format!("invalid path '{}': {}", req.path, e)))?;
        let mut builder = self.client.request(req.method.clone(), url).headers(req.headers.clone());
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();
        Ok(ApiResponse { status, headers, body })
    }
}
