//! HTTP registry clients
//!
//! Existence lookups against the DataCite REST API and the Handle proxy. Both
//! map 200 to "registered", 404 to "free" and anything else to an error.

use super::RegistryClient;
use crate::codec::{GlobalId, Protocol};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

const DATACITE_API_BASE: &str = "https://api.datacite.org";
const HANDLE_PROXY_BASE: &str = "https://hdl.handle.net";
const REQUEST_TIMEOUT_SECS: u64 = 10;

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to create HTTP client")
}

fn lookup_url(base: &Url, route: &str, pid: &GlobalId) -> Result<Url> {
    let raw = format!(
        "{}/{}/{}",
        base.as_str().trim_end_matches('/'),
        route,
        pid.authority_path()
    );
    Url::parse(&raw).with_context(|| format!("Invalid registry lookup URL: {}", raw))
}

async fn status_exists(client: &Client, url: Url) -> Result<bool> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Registry lookup failed: {}", url))?;

    match response.status() {
        StatusCode::OK => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        other => bail!("Unexpected registry response {} for {}", other, url),
    }
}

// =============================================================================
// DATACITE
// =============================================================================

pub struct DataCiteClient {
    client: Client,
    base_url: Url,
}

impl DataCiteClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DATACITE_API_BASE)
    }

    /// Point the client at another DataCite deployment (e.g. the test API).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: Url::parse(base_url).context("Invalid DataCite base URL")?,
        })
    }

    fn doi_url(&self, pid: &GlobalId) -> Result<Url> {
        lookup_url(&self.base_url, "dois", pid)
    }
}

#[async_trait]
impl RegistryClient for DataCiteClient {
    async fn exists(&self, pid: &GlobalId) -> Result<bool> {
        if pid.protocol() != Protocol::Doi {
            bail!("DataCite only registers DOIs, got {}", pid);
        }
        let url = self.doi_url(pid)?;
        debug!("DataCite lookup: {}", url);
        status_exists(&self.client, url).await
    }
}

// =============================================================================
// HANDLE
// =============================================================================

pub struct HandleClient {
    client: Client,
    base_url: Url,
}

impl HandleClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(HANDLE_PROXY_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: Url::parse(base_url).context("Invalid Handle proxy base URL")?,
        })
    }

    fn handle_url(&self, pid: &GlobalId) -> Result<Url> {
        lookup_url(&self.base_url, "api/handles", pid)
    }
}

#[async_trait]
impl RegistryClient for HandleClient {
    async fn exists(&self, pid: &GlobalId) -> Result<bool> {
        if pid.protocol() != Protocol::Handle {
            bail!("Handle proxy only resolves handles, got {}", pid);
        }
        let url = self.handle_url(pid)?;
        debug!("Handle lookup: {}", url);
        status_exists(&self.client, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datacite_url() {
        let client = DataCiteClient::with_base_url("https://api.test.datacite.org/").unwrap();
        let pid = GlobalId::parse("doi:10.5072/FK2/ABC123").unwrap();
        assert_eq!(
            client.doi_url(&pid).unwrap().as_str(),
            "https://api.test.datacite.org/dois/10.5072/FK2/ABC123"
        );
    }

    #[test]
    fn test_handle_url() {
        let client = HandleClient::new().unwrap();
        let pid = GlobalId::parse("hdl:1902.1/XYZ").unwrap();
        assert_eq!(
            client.handle_url(&pid).unwrap().as_str(),
            "https://hdl.handle.net/api/handles/1902.1/XYZ"
        );
    }

    #[tokio::test]
    async fn test_protocol_mismatch_is_error() {
        let client = DataCiteClient::new().unwrap();
        let pid = GlobalId::parse("hdl:1902.1/XYZ").unwrap();
        assert!(client.exists(&pid).await.is_err());
    }
}
