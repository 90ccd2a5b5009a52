use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::load_config;
use crate::error::{Error, Result};
use crate::metadata::{self, ResourceMetadata};
use crate::table::Table;
use crate::transport::Transport;

/// Public data.gouv.fr API root.
pub const DEFAULT_BASE_URL: &str = "https://www.data.gouv.fr/api/1";

/// Deadline applied to every facade operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, typically `https://www.data.gouv.fr/api/1`.
    pub url: String,
    /// API key sent as `X-API-KEY`.
    pub key: String,
    /// Deadline shared by all requests of one operation.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
            key: key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
    timeout: Duration,
}

impl Client {
    /// Creates a client using environment variables and/or `.datagouvrc`.
    ///
    /// This is equivalent to `Client::from_sources(None, None)`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_sources(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`key` arguments
    /// - environment variables `DATAGOUV_URL` / `DATAGOUV_API_KEY`
    /// - config file from `DATAGOUV_RC` or `.datagouvrc`
    pub fn from_sources(url: Option<String>, key: Option<String>) -> anyhow::Result<Self> {
        let cfg = load_config(url, key)?;
        Ok(Self::with_config(cfg)?)
    }

    /// Client for the public API with the default deadline.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(key))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::builder().build()?;
        Self::with_http(http, config)
    }

    /// Uses an HTTP session owned by the host application.
    pub fn with_http(http: HttpClient, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(http, &config.url, &config.key)?,
            timeout: config.timeout,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Single-request access without a deadline.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn datasets(&self) -> Datasets<'_> {
        Datasets { client: self }
    }

    async fn with_deadline<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, timeout = ?self.timeout, "deadline elapsed");
                Err(Error::Timeout(self.timeout))
            }
        }
    }
}

/// Dataset and resource operations, each bounded by the client deadline.
///
/// Composite operations run their two requests back to back under one
/// deadline. If the metadata step fails, the uploaded file stays on the
/// server.
#[derive(Debug, Clone, Copy)]
pub struct Datasets<'a> {
    client: &'a Client,
}

impl Datasets<'_> {
    /// Fetches a dataset and returns its JSON as sent by the API.
    pub async fn get_dataset(&self, dataset_id: &str) -> Result<Value> {
        let transport = self.client.transport();
        self.client
            .with_deadline("get_dataset", transport.fetch_dataset(dataset_id))
            .await
    }

    /// Uploads `table` as a new CSV resource named `resource_name`, then sets
    /// its title, description and defaults.
    ///
    /// Returns the resource as updated by the metadata call.
    pub async fn upload_resource(
        &self,
        dataset_id: &str,
        table: &Table,
        resource_name: &str,
        resource_description: &str,
    ) -> Result<Value> {
        let transport = self.client.transport();
        self.client
            .with_deadline("upload_resource", async {
                let uploaded = transport
                    .upload_resource(dataset_id, resource_name, table)
                    .await?;
                let rid = metadata::resource_id(&uploaded).ok_or(Error::MissingResourceId)?;
                tracing::debug!(dataset_id, resource_id = rid, "resource uploaded");

                let metadata = ResourceMetadata::new(resource_name, resource_description);
                transport
                    .set_resource_metadata(dataset_id, rid, &metadata)
                    .await
            })
            .await
    }

    /// Replaces the file behind an existing resource, then resets its
    /// metadata the same way [`Datasets::upload_resource`] does.
    pub async fn update_resource(
        &self,
        dataset_id: &str,
        resource_id: &str,
        table: &Table,
        resource_name: &str,
        resource_description: &str,
    ) -> Result<Value> {
        let transport = self.client.transport();
        self.client
            .with_deadline("update_resource", async {
                let replaced = transport
                    .replace_resource(dataset_id, resource_id, table, resource_name)
                    .await?;
                // Replacing normally keeps the id; fall back if the body omits it.
                let rid = metadata::resource_id(&replaced).unwrap_or(resource_id);

                let metadata = ResourceMetadata::new(resource_name, resource_description);
                transport
                    .set_resource_metadata(dataset_id, rid, &metadata)
                    .await
            })
            .await
    }

    /// Updates dataset metadata; `metadata` is forwarded untouched.
    pub async fn update_dataset_metadata<T: Serialize + ?Sized>(
        &self,
        dataset_id: &str,
        metadata: &T,
    ) -> Result<Value> {
        let transport = self.client.transport();
        self.client
            .with_deadline(
                "update_dataset_metadata",
                transport.set_dataset_metadata(dataset_id, metadata),
            )
            .await
    }

    /// Deletes a resource. Returns `Value::Null` for the usual empty 204.
    pub async fn delete_resource(&self, dataset_id: &str, resource_id: &str) -> Result<Value> {
        let transport = self.client.transport();
        self.client
            .with_deadline(
                "delete_resource",
                transport.delete_resource(dataset_id, resource_id),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let cfg = ClientConfig::new("key");
        assert_eq!(cfg.url, DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout, Duration::from_secs(30));

        let cfg = cfg
            .with_url("https://demo.data.gouv.fr/api/1/")
            .with_timeout(Duration::from_secs(5));
        let client = Client::with_config(cfg).unwrap();
        assert_eq!(client.base_url(), "https://demo.data.gouv.fr/api/1");
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn timeout_override() {
        let client = Client::new("key")
            .unwrap()
            .with_timeout(Duration::from_millis(250));
        assert_eq!(client.timeout(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn deadline_maps_to_timeout_error() {
        let client = Client::new("key")
            .unwrap()
            .with_timeout(Duration::from_millis(20));
        let err = client
            .with_deadline("sleep", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(20)));
    }
}
