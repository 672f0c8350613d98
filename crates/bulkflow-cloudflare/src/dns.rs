//! Cloudflare DNS API client
//!
//! Direct Cloudflare API implementation for listing and deleting DNS
//! records, authenticated with a Bearer token.

use crate::error::{CloudflareError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default listing page size
pub const DEFAULT_PER_PAGE: u32 = 1000;

/// Cloudflare error code for a record id that does not exist
const RECORD_NOT_FOUND_CODE: i64 = 81044;

/// Longest response body echoed back in an error
const MAX_ERROR_BODY: usize = 200;

/// Cloudflare DNS client
///
/// Holds one `reqwest::Client` that is shared by every worker of a run.
#[derive(Debug, Clone)]
pub struct CloudflareDns {
    client: reqwest::Client,
    api_token: String,
    zone_id: String,
    api_base: String,
}

/// Configuration for the DNS client
#[derive(Debug, Clone)]
pub struct DnsConfig {
    pub api_token: String,
    pub zone_id: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl DnsConfig {
    pub fn new(api_token: impl Into<String>, zone_id: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            zone_id: zone_id.into(),
            api_base: CLOUDFLARE_API_BASE.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Point the client at another API endpoint (e.g., a local fake)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A DNS record in the zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    pub record_type: String,
    pub content: String,
    pub ttl: Option<u32>,
    pub proxied: bool,
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.record_type, self.name, self.id)
    }
}

/// One page of a DNS record listing
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<DnsRecord>,
    pub page: u32,
    pub total_pages: u32,
}

impl CloudflareDns {
    /// Create a new DNS client
    pub fn new(config: DnsConfig) -> Result<Self> {
        if config.api_token.trim().is_empty() {
            return Err(CloudflareError::InvalidConfig(
                "API token must not be empty".to_string(),
            ));
        }
        if config.zone_id.trim().is_empty() {
            return Err(CloudflareError::InvalidConfig(
                "zone id must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_token: config.api_token,
            zone_id: config.zone_id,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, self.zone_id)
    }

    /// List one page of DNS records, optionally only those of `record_type`
    pub async fn list_records_page(
        &self,
        page: u32,
        per_page: u32,
        record_type: Option<&str>,
    ) -> Result<RecordPage> {
        let mut query = vec![
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(record_type) = record_type {
            query.push(("type", record_type.to_string()));
        }

        let response = self
            .client
            .get(self.records_url())
            .bearer_auth(&self.api_token)
            .query(&query)
            .send()
            .await?;

        let api_response: ApiResponse<Vec<ApiDnsRecord>> = parse_response(response).await?;
        let total_pages = api_response
            .result_info
            .as_ref()
            .map(|info| info.total_pages)
            .unwrap_or(page);
        let records = api_response.into_result()?;

        Ok(RecordPage {
            records: records.into_iter().map(DnsRecord::from).collect(),
            page,
            total_pages,
        })
    }

    /// Delete a DNS record
    pub async fn delete_record(&self, record_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.records_url(), record_id);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        let api_response: ApiResponse<DeleteResult> = parse_response(response).await?;
        if api_response
            .errors
            .iter()
            .any(|e| e.code == RECORD_NOT_FOUND_CODE)
        {
            return Err(CloudflareError::DnsRecordNotFound(record_id.to_string()));
        }
        api_response.into_result()?;

        Ok(())
    }
}

/// Decode a Cloudflare envelope, falling back to the status for non-JSON errors
async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<ApiResponse<T>> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<ApiResponse<T>>(&body) {
        Ok(mut api_response) => {
            if !status.is_success() {
                api_response.success = false;
                if api_response.errors.is_empty() {
                    return Err(status_error(status.as_u16(), &body));
                }
            }
            Ok(api_response)
        }
        Err(_) if !status.is_success() => Err(status_error(status.as_u16(), &body)),
        Err(e) => Err(e.into()),
    }
}

fn status_error(status: u16, body: &str) -> CloudflareError {
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    CloudflareError::Status { status, body }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<ApiError>,
    result_info: Option<ResultInfo>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T> {
        if !self.success {
            let error_msg = self
                .errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(CloudflareError::ApiError(error_msg));
        }
        self.result
            .ok_or_else(|| CloudflareError::ApiError("response has no result".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct ApiDnsRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    r#type: String,
    content: String,
    ttl: Option<u32>,
    #[serde(default)]
    proxied: bool,
}

impl From<ApiDnsRecord> for DnsRecord {
    fn from(r: ApiDnsRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            record_type: r.r#type,
            content: r.content,
            ttl: r.ttl,
            proxied: r.proxied,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteResult {
    #[allow(dead_code)]
    id: String,
}
