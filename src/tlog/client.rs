//! Transparency Log Client
//!
//! Talks to the log's v1 REST API. Every request is bounded by the client timeout
//! so a stalled log never blocks a scheduler tick.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{MonitorError, Result};
use crate::tlog::types::{CreatedEntry, LogEntryPayload, LogInfo, RawEntry, SignedCommitment};

/// HTTP client for a single transparency log
#[derive(Debug, Clone)]
pub struct LogClient {
    base_url: String,
    http_client: Client,
}

impl LogClient {
    /// Create new log client with the log's base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the PEM-encoded key the log signs its tree heads with
    pub async fn get_public_key(&self) -> Result<String> {
        let url = format!("{}/api/v1/log/publicKey", self.base_url);
        let response = self.http_client.get(&url).send().await?;
        let response = check_status(response, "get public key").await?;
        Ok(response.text().await?)
    }

    /// Fetch the log's current signed commitment. The result is not yet trusted.
    pub async fn get_log_info(&self) -> Result<SignedCommitment> {
        let url = format!("{}/api/v1/log", self.base_url);
        let response = self.http_client.get(&url).send().await?;
        let response = check_status(response, "get log info").await?;

        let info: LogInfo = response
            .json()
            .await
            .map_err(|e| MonitorError::malformed_commitment(format!("unparseable log info: {}", e)))?;
        SignedCommitment::from_wire(&info.signed_tree_head)
    }

    /// Fetch a single entry by its log index
    pub async fn get_entry_by_index(&self, index: u64) -> Result<RawEntry> {
        let url = format!("{}/api/v1/log/entries", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("logIndex", index)])
            .send()
            .await?;
        let response = check_status(response, "get entry").await?;

        // the response is a map with one element, a uuid -> entry mapping
        let entries: BTreeMap<String, LogEntryPayload> = read_json(response, "get entry").await?;
        let (uuid, payload) = entries.into_iter().next().ok_or_else(|| {
            MonitorError::LogServiceError(format!("no entry returned for index {}", index))
        })?;
        let body = payload.body.ok_or_else(|| {
            MonitorError::DecodeError(format!("entry {} at index {} has no body", uuid, index))
        })?;

        if let Some(reported) = payload.log_index {
            if reported != index {
                return Err(MonitorError::DecodeError(format!(
                    "entry {} requested at index {} reports index {}",
                    uuid, index, reported
                )));
            }
        }

        debug!("Fetched entry {} at index {}", uuid, index);
        Ok(RawEntry { uuid, index, body })
    }

    /// Submit a proposed entry and return what the log integrated
    pub async fn create_entry<T: Serialize>(&self, proposed: &T) -> Result<Vec<CreatedEntry>> {
        let url = format!("{}/api/v1/log/entries", self.base_url);
        let response = self.http_client.post(&url).json(proposed).send().await?;
        let response = check_status(response, "create entry").await?;

        let entries: BTreeMap<String, LogEntryPayload> = read_json(response, "create entry").await?;
        let created: Vec<CreatedEntry> = entries
            .into_iter()
            .map(|(uuid, payload)| CreatedEntry {
                uuid,
                log_index: payload.log_index,
            })
            .collect();

        for entry in &created {
            info!(
                "added log entry uuid={} index={}",
                entry.uuid,
                entry
                    .log_index
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            );
        }
        Ok(created)
    }
}

async fn check_status(response: reqwest::Response, operation: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MonitorError::LogServiceError(format!(
        "{} returned {}{}",
        operation,
        status,
        describe_body(status, &body)
    )))
}

/// Transport failures while reading stay network errors; a body that does not parse is a decode error
async fn read_json<T: DeserializeOwned>(response: reqwest::Response, operation: &str) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        MonitorError::DecodeError(format!("{} returned malformed JSON: {}", operation, e))
    })
}

fn describe_body(status: StatusCode, body: &str) -> String {
    if body.is_empty() || status == StatusCode::NOT_FOUND {
        String::new()
    } else {
        format!(": {}", body.chars().take(200).collect::<String>())
    }
}
