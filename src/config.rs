//! Runtime configuration for the auth subsystem.
//! Every field has a default; a JSON file or `ADMINAUTH_*` environment variables override them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::storage::{FileStorage, MemoryStorage, SharedSlots, AUTH_KEY};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct AuthConfig {
    /// Base URL every relative request path is joined onto.
    #[serde(default = "AuthConfig::default_api_base")]
    pub api_base: String,
    /// Renewal endpoint, relative to `api_base`.
    #[serde(default = "AuthConfig::default_refresh_path")]
    pub refresh_path: String,
    /// Key of the session slot in durable storage.
    #[serde(default = "AuthConfig::default_storage_key")]
    pub storage_key: String,
    /// Slot file; in-memory storage when absent.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    #[serde(default = "AuthConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Response statuses that trigger a credential renewal.
    #[serde(default = "AuthConfig::default_renew_on_status")]
    pub renew_on_status: Vec<u16>,
    #[serde(default = "AuthConfig::default_display_name")]
    pub display_name: String,
    #[serde(default = "AuthConfig::default_avatar_url")]
    pub avatar_url: String,
}

impl AuthConfig {
    fn default_api_base() -> String { "http://localhost:8080".to_string() }
    fn default_refresh_path() -> String { "/auth/token/refresh".to_string() }
    fn default_storage_key() -> String { AUTH_KEY.to_string() }
    fn default_request_timeout_ms() -> u64 { 10_000 }
    fn default_renew_on_status() -> Vec<u16> { vec![401] }
    fn default_display_name() -> String { "John Doe".to_string() }
    fn default_avatar_url() -> String { "https://i.pravatar.cc/300".to_string() }

    /// Load from a JSON file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("reading auth config {}", path.display()))?;
        let cfg = serde_json::from_slice::<AuthConfig>(&bytes).with_context(|| format!("parsing auth config {}", path.display()))?;
        Ok(cfg)
    }

    /// Defaults overridden by `ADMINAUTH_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = AuthConfig::default();
        if let Some(v) = get("ADMINAUTH_API_BASE") { cfg.api_base = v; }
        if let Some(v) = get("ADMINAUTH_REFRESH_PATH") { cfg.refresh_path = v; }
        if let Some(v) = get("ADMINAUTH_STORAGE_KEY") { cfg.storage_key = v; }
        if let Some(v) = get("ADMINAUTH_STORAGE_PATH") { cfg.storage_path = Some(PathBuf::from(v)); }
        if let Some(v) = get("ADMINAUTH_REQUEST_TIMEOUT_MS") {
            cfg.request_timeout_ms = v.trim().parse().with_context(|| format!("ADMINAUTH_REQUEST_TIMEOUT_MS='{}'", v))?;
        }
        if let Some(v) = get("ADMINAUTH_RENEW_ON_STATUS") {
            cfg.renew_on_status = v
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<u16>().with_context(|| format!("ADMINAUTH_RENEW_ON_STATUS entry '{}'", s)))
                .collect::<anyhow::Result<Vec<_>>>()?;
        }
        if let Some(v) = get("ADMINAUTH_DISPLAY_NAME") { cfg.display_name = v; }
        if let Some(v) = get("ADMINAUTH_AVATAR_URL") { cfg.avatar_url = v; }
        Ok(cfg)
    }

    pub fn request_timeout(&self) -> Duration { Duration::from_millis(self.request_timeout_ms) }

    /// Build the configured slot store.
    pub fn open_storage(&self) -> anyhow::Result<SharedSlots> {
        match &self.storage_path {
            Some(p) => Ok(Arc::new(FileStorage::open(p)?)),
            None => Ok(Arc::new(MemoryStorage::new())),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_base: Self::default_api_base(),
            refresh_path: Self::default_refresh_path(),
            storage_key: Self::default_storage_key(),
            storage_path: None,
            request_timeout_ms: Self::default_request_timeout_ms(),
            renew_on_status: Self::default_renew_on_status(),
            display_name: Self::default_display_name(),
            avatar_url: Self::default_avatar_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_console_endpoints() {
        let cfg = AuthConfig::default();
        assert_eq!(cfg.refresh_path, "/auth/token/refresh");
        assert_eq!(cfg.storage_key, "auth");
        assert_eq!(cfg.renew_on_status, vec![401]);
        assert_eq!(cfg.display_name, "John Doe");
        assert_eq!(cfg.avatar_url, "https://i.pravatar.cc/300");
    }

    #[test]
    fn partial_json_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("auth.json");
        std::fs::write(&p, br#"{"api_base":"https://admin.example.com","renew_on_status":[401,419]}"#).unwrap();
        let cfg = AuthConfig::load(&p).unwrap();
        assert_eq!(cfg.api_base, "https://admin.example.com");
        assert_eq!(cfg.renew_on_status, vec![401, 419]);
        assert_eq!(cfg.refresh_path, "/auth/token/refresh");
        assert_eq!(cfg.request_timeout_ms, 10_000);
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ADMINAUTH_API_BASE", "http://127.0.0.1:9000"),
            ("ADMINAUTH_RENEW_ON_STATUS", "401, 403"),
            ("ADMINAUTH_REQUEST_TIMEOUT_MS", "250"),
        ].into_iter().collect();
        let cfg = AuthConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.api_base, "http://127.0.0.1:9000");
        assert_eq!(cfg.renew_on_status, vec![401, 403]);
        assert_eq!(cfg.request_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.storage_key, "auth");
    }

    #[test]
    fn env_rejects_bad_numbers() {
        let bad = AuthConfig::from_lookup(|k| (k == "ADMINAUTH_REQUEST_TIMEOUT_MS").then(|| "soon".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn open_storage_uses_file_when_configured() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = AuthConfig { storage_path: Some(tmp.path().join("slots.json")), ..Default::default() };
        let slots = cfg.open_storage().unwrap();
        slots.set("auth", "t").unwrap();
        assert!(tmp.path().join("slots.json").exists());
    }
}
