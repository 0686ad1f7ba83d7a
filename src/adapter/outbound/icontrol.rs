//! Device connector for the appliance REST management API.
//!
//! Objects are addressed by their full path with `/` rewritten to `~`, e.g.
//! `/Common/web01` becomes `~Common~web01`. Enabled state lives in the
//! `session` attribute: `user-enabled` or `user-disabled`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::infrastructure::config::device::DeviceConfig;
use crate::port::outbound::device::{DeviceConnector, DeviceHandle};

const FAILOVER_STATUS: &str = "/mgmt/tm/cm/failover-status";
const SESSION_ENABLED: &str = "user-enabled";
const SESSION_DISABLED: &str = "user-disabled";

/// Rewrite an object path into its URL form.
fn object_path(name: &str) -> String {
    name.replace('/', "~")
}

fn session(enabled: bool) -> &'static str {
    if enabled {
        SESSION_ENABLED
    } else {
        SESSION_DISABLED
    }
}

#[derive(Debug, Deserialize)]
struct SessionState {
    #[serde(default)]
    session: Option<String>,
}

impl SessionState {
    fn enabled(&self) -> bool {
        self.session.as_deref() != Some(SESSION_DISABLED)
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: Option<String>,
}

/// Opens authenticated sessions with appliances.
pub struct IControlConnector {
    http: HttpClient,
    credentials: Credentials,
    scheme: String,
    port: u16,
}

impl IControlConnector {
    /// Build a connector from device settings.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &DeviceConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            credentials: Credentials {
                username: config.username.clone(),
                password: config.password.clone(),
            },
            scheme: config.scheme.clone(),
            port: config.port,
        })
    }

    async fn resolve(&self, hostname: &str) -> Result<()> {
        let mut addrs = tokio::net::lookup_host((hostname, self.port))
            .await
            .map_err(|_| Error::HostNotFound(hostname.to_string()))?;
        if addrs.next().is_none() {
            return Err(Error::HostNotFound(hostname.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceConnector for IControlConnector {
    async fn connect(&self, hostname: &str) -> Result<Arc<dyn DeviceHandle>> {
        self.resolve(hostname).await?;

        let base = Url::parse(&format!("{}://{}:{}", self.scheme, hostname, self.port))
            .map_err(|e| Error::Connection(format!("could not connect to {hostname}: {e}")))?;
        let handle = IControlHandle {
            http: self.http.clone(),
            credentials: self.credentials.clone(),
            hostname: hostname.to_string(),
            base_url: base.as_str().trim_end_matches('/').to_string(),
        };

        handle
            .probe()
            .await
            .map_err(|e| Error::Connection(format!("could not connect to {hostname}: {e}")))?;

        info!(device = %hostname, "Connected to device");
        Ok(Arc::new(handle))
    }
}

/// Authenticated session with one appliance.
pub struct IControlHandle {
    http: HttpClient,
    credentials: Credentials,
    hostname: String,
    base_url: String,
}

impl IControlHandle {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(path))
            .basic_auth(&self.credentials.username, self.credentials.password.as_ref())
    }

    fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .patch(self.url(path))
            .basic_auth(&self.credentials.username, self.credentials.password.as_ref())
    }

    async fn probe(&self) -> Result<()> {
        self.get(FAILOVER_STATUS).send().await?.error_for_status()?;
        Ok(())
    }

    async fn write_session(&self, path: &str, what: String, enabled: bool) -> Result<()> {
        let response = self
            .patch(path)
            .json(&json!({ "session": session(enabled) }))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{what} on {}", self.hostname)));
        }
        response.error_for_status()?;
        debug!(device = %self.hostname, object = %what, enabled, "Device session updated");
        Ok(())
    }
}

#[async_trait]
impl DeviceHandle for IControlHandle {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn is_alive(&self) -> bool {
        self.probe().await.is_ok()
    }

    async fn node_enabled(&self, node: &str) -> Result<bool> {
        let path = format!("/mgmt/tm/ltm/node/{}", object_path(node));
        let response = self.get(&path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("node {node} on {}", self.hostname)));
        }
        let state: SessionState = response.error_for_status()?.json().await?;
        Ok(state.enabled())
    }

    async fn set_node_enabled(&self, node: &str, enabled: bool) -> Result<()> {
        let path = format!("/mgmt/tm/ltm/node/{}", object_path(node));
        self.write_session(&path, format!("node {node}"), enabled).await
    }

    async fn set_poolmember_enabled(
        &self,
        node: &str,
        port: u16,
        pool: &str,
        enabled: bool,
    ) -> Result<()> {
        let path = format!(
            "/mgmt/tm/ltm/pool/{}/members/{}:{port}",
            object_path(pool),
            object_path(node)
        );
        self.write_session(&path, format!("poolmember {node}:{port} in {pool}"), enabled)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_paths_use_tildes() {
        assert_eq!(object_path("/Common/web01"), "~Common~web01");
        assert_eq!(object_path("plain"), "plain");
    }

    #[test]
    fn missing_session_counts_as_enabled() {
        let state: SessionState = serde_json::from_str("{}").unwrap();
        assert!(state.enabled());

        let state: SessionState =
            serde_json::from_str(r#"{"session":"monitor-enabled"}"#).unwrap();
        assert!(state.enabled());

        let state: SessionState = serde_json::from_str(r#"{"session":"user-disabled"}"#).unwrap();
        assert!(!state.enabled());
    }

    #[test]
    fn session_values() {
        assert_eq!(session(true), "user-enabled");
        assert_eq!(session(false), "user-disabled");
    }
}
