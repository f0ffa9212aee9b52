use crate::Result;
use serde::{Deserialize, Deserializer};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Status reported by ECS once a container has exited.
pub const STOPPED: &str = "STOPPED";

/// Task metadata as returned by `${ECS_CONTAINER_METADATA_URI}/task`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    #[serde(rename = "Containers", default, deserialize_with = "null_as_default")]
    pub containers: Vec<Container>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    #[serde(rename = "Name", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "KnownStatus", default, deserialize_with = "null_as_default")]
    pub known_status: String,
}

// The agent writes `null` for unset fields; treat it like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Container {
    pub fn is_stopped(&self) -> bool {
        self.known_status == STOPPED
    }
}

pub type TaskFuture = Pin<Box<dyn Future<Output = Result<Task>> + Send>>;

pub trait MetadataApi: Send + Sync {
    fn get_task(&self) -> TaskFuture;
}

/// Builds the task endpoint from the metadata base URI.
pub fn task_url(base: &str) -> String {
    format!("{}/task", base.trim_end_matches('/'))
}

#[derive(Debug, Clone)]
pub struct HttpMetadataClient {
    client: reqwest::Client,
    url: String,
}

impl HttpMetadataClient {
    pub fn new(base_uri: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpMetadataClient {
            client,
            url: task_url(base_uri),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl MetadataApi for HttpMetadataClient {
    fn get_task(&self) -> TaskFuture {
        let client = self.client.clone();
        let url = self.url.clone();
        Box::pin(async move {
            debug!("GET {}", url);
            let response = client.get(&url).send().await?.error_for_status()?;
            // Read the whole body first so the connection goes back to the pool
            // even when decoding fails.
            let body = response.bytes().await?;
            Ok(serde_json::from_slice::<Task>(&body)?)
        })
    }
}
