//! Timestamp Authority Client
//!
//! Submits RFC 3161 timestamp queries and returns the raw response token.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{MonitorError, Result};
use crate::tsa::request::TimestampRequest;

pub const TIMESTAMP_QUERY_CONTENT_TYPE: &str = "application/timestamp-query";

/// Proof from the authority that some data existed at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampToken {
    pub token: Vec<u8>,
    pub authority: String,
}

/// RFC 3161 client for a single timestamp authority
#[derive(Debug, Clone)]
pub struct TsaClient {
    authority_url: String,
    http_client: Client,
}

impl TsaClient {
    /// Create new TSA client with the authority URL
    pub fn new(authority_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            authority_url: authority_url.into(),
            http_client,
        })
    }

    pub fn authority_url(&self) -> &str {
        &self.authority_url
    }

    /// Submit data for timestamping
    pub async fn stamp(&self, data: &[u8]) -> Result<TimestampToken> {
        info!("Submitting {} bytes for timestamping", data.len());

        let request = TimestampRequest::for_data(data, rand::random());
        let response = self
            .http_client
            .post(&self.authority_url)
            .header(CONTENT_TYPE, TIMESTAMP_QUERY_CONTENT_TYPE)
            .body(request.to_der())
            .send()
            .await
            .map_err(|e| MonitorError::TimestampError(format!("request failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            return Err(MonitorError::TimestampError(format!(
                "unexpected status: {}",
                response.status()
            )));
        }

        let token = response
            .bytes()
            .await
            .map_err(|e| MonitorError::TimestampError(format!("failed to read response: {}", e)))?
            .to_vec();
        if token.is_empty() {
            return Err(MonitorError::TimestampError("empty timestamp response".into()));
        }

        debug!("Received {} byte timestamp token", token.len());
        Ok(TimestampToken {
            token,
            authority: self.authority_url.clone(),
        })
    }
}
