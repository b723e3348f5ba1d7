use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::{config::AppConfig, error::PermissionFetchError};

/// Grants every admin page.
pub const WILDCARD: &str = "*";

/// PermissionSet
///
/// Permission identifiers granted to the current session. On the wire it is a
/// plain JSON array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// 1. Permission Policy Contract
/// PermissionPolicy
///
/// The synchronous access predicate evaluated by the admin gate once the
/// permission set is available.
pub trait PermissionPolicy: Send + Sync {
    fn has_admin_permission(&self, permissions: &PermissionSet, route: &str) -> bool;
}

/// AdminPermissionPolicy
///
/// Grants a route when the set holds its name or the wildcard.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminPermissionPolicy;

impl PermissionPolicy for AdminPermissionPolicy {
    fn has_admin_permission(&self, permissions: &PermissionSet, route: &str) -> bool {
        permissions.contains(WILDCARD) || permissions.contains(route)
    }
}

pub type PolicyState = Arc<dyn PermissionPolicy>;

// 2. Permission Source Contract
/// PermissionSource
///
/// Where the session's permission set comes from. Swappable so the gate can be
/// tested without a network.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn fetch_permissions(&self) -> Result<PermissionSet, PermissionFetchError>;
}

pub type PermissionSourceState = Arc<dyn PermissionSource>;

// 3. The Real Implementation (HTTP API)
/// HttpPermissionSource
///
/// Fetches `GET {api_base_url}{permissions_path}`, which answers with a JSON array
/// of permission identifiers granted to the caller.
#[derive(Clone)]
pub struct HttpPermissionSource {
    client: reqwest::Client,
    url: String,
}

impl HttpPermissionSource {
    pub fn new(api_base_url: &str, permissions_path: &str) -> Self {
        Self::with_client(reqwest::Client::new(), api_base_url, permissions_path)
    }

    pub fn with_client(client: reqwest::Client, api_base_url: &str, permissions_path: &str) -> Self {
        let url = format!(
            "{}/{}",
            api_base_url.trim_end_matches('/'),
            permissions_path.trim_start_matches('/')
        );
        Self { client, url }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.api_base_url, &config.permissions_path)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PermissionSource for HttpPermissionSource {
    async fn fetch_permissions(&self) -> Result<PermissionSet, PermissionFetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PermissionFetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PermissionFetchError::Status(status.as_u16()));
        }

        let permissions = response
            .json::<Vec<String>>()
            .await
            .map_err(|e| PermissionFetchError::Payload(e.to_string()))?;

        tracing::debug!(count = permissions.len(), url = %self.url, "permissions fetched");
        Ok(permissions.into_iter().collect())
    }
}

// 4. The Mock Implementation (For Tests)
/// MockPermissionSource
///
/// Returns a fixed set (or a simulated failure) and counts how often it was asked,
/// so tests can assert how many fetches a scenario caused.
#[derive(Debug, Default)]
pub struct MockPermissionSource {
    permissions: PermissionSet,
    /// When true, every fetch returns a simulated transport failure.
    pub should_fail: bool,
    /// Artificial latency, to keep a fetch in flight while other navigations start.
    pub delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockPermissionSource {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionSource for MockPermissionSource {
    async fn fetch_permissions(&self) -> Result<PermissionSet, PermissionFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail {
            return Err(PermissionFetchError::Transport(
                "Mock Permission Error: Simulation requested".to_string(),
            ));
        }
        Ok(self.permissions.clone())
    }
}
