//! Remote Manifest Access
//!
//! One-shot HTTPS GETs: the published manifest, the hosted manifest, and image
//! reachability probes. No retries.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::findings::Finding;
use crate::manifest::{normalize_domain, ManifestDocument, ManifestError};

pub const IMAGE_PROBE_RULE: &str = "image_reachability";
pub const HOSTED_MANIFEST_BASE: &str = "https://api.farcaster.xyz/miniapps/hosted-manifest";
pub const WELL_KNOWN_PATH: &str = "/.well-known/farcaster.json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const PROBED_IMAGE_FIELDS: [&str; 3] = ["iconUrl", "splashImageUrl", "imageUrl"];

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} did not return JSON: {source}")]
    Json { url: String, source: serde_json::Error },

    #[error("{url} did not return a manifest: {source}")]
    Manifest { url: String, source: ManifestError },
}

pub fn hosted_manifest_url(manifest_id: &str) -> String {
    format!("{}/{}", HOSTED_MANIFEST_BASE, manifest_id.trim())
}

pub fn published_manifest_url(domain: &str) -> String {
    format!("https://{}{}", normalize_domain(domain), WELL_KNOWN_PATH)
}

fn parse_json_body(url: &str, body: &str) -> Result<Value, RemoteError> {
    serde_json::from_str(body).map_err(|source| RemoteError::Json {
        url: url.to_string(),
        source,
    })
}

pub struct RemoteClient {
    client: Client,
}

impl RemoteClient {
    pub fn new() -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("miniapp-compliance/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::Client)?;
        Ok(Self { client })
    }

    pub fn fetch_json(&self, url: &str) -> Result<Value, RemoteError> {
        debug!(url, "fetching");
        let http_err = |source: reqwest::Error| RemoteError::Http {
            url: url.to_string(),
            source,
        };
        let resp = self.client.get(url).send().map_err(http_err)?;
        if !resp.status().is_success() {
            return Err(RemoteError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        let body = resp.text().map_err(http_err)?;
        parse_json_body(url, &body)
    }

    /// Accepts both `miniapp` and legacy `frame` nesting.
    pub fn fetch_manifest(&self, url: &str) -> Result<ManifestDocument, RemoteError> {
        let value = self.fetch_json(url)?;
        ManifestDocument::from_value(&value).map_err(|source| RemoteError::Manifest {
            url: url.to_string(),
            source,
        })
    }

    /// GETs each image URL in the manifest; anything but 200 is an error.
    pub fn probe_image_urls(&self, doc: &ManifestDocument) -> Vec<Finding> {
        let rule = IMAGE_PROBE_RULE;
        let mut findings = vec![];
        for field in PROBED_IMAGE_FIELDS {
            let Some(url) = doc.app_text(field) else {
                continue;
            };
            match self.client.get(url).send() {
                Ok(resp) if resp.status() == StatusCode::OK => findings.push(Finding::ok(
                    rule,
                    field,
                    format!("accessible ({})", resp.status().as_u16()),
                )),
                Ok(resp) => findings.push(Finding::error(
                    rule,
                    field,
                    format!("not accessible ({}): {}", resp.status().as_u16(), url),
                )),
                Err(e) => findings.push(Finding::error(
                    rule,
                    field,
                    format!("failed to load {}: {}", url, e),
                )),
            }
        }
        findings
    }
}
