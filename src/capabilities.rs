//! Service-provider capability discovery.
//!
//! The target's `/ServiceProviderConfig` declares which optional SCIM
//! features it supports. The harness fetches it once per run and resolves
//! each catalog entry's `expected_supported` flag against the snapshot.
//! Discovery is fail-open: if the fetch or any field is unusable, every flag
//! defaults to supported so missing metadata never silently removes coverage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{WireClient, WireRequest};

/// SCIM `ServiceProviderConfig` wire model (subset of RFC 7643 §5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceProviderConfig {
    pub schemas: Vec<String>,
    pub patch: FeatureSupport,
    pub bulk: BulkSupport,
    pub filter: FilterSupport,
    pub change_password: FeatureSupport,
    pub sort: FeatureSupport,
    pub etag: FeatureSupport,
}

/// Simple `{"supported": bool}` feature flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSupport {
    pub supported: bool,
}

impl Default for FeatureSupport {
    // Absent flags read as supported; see module docs.
    fn default() -> Self {
        Self { supported: true }
    }
}

/// Bulk support with its RFC limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkSupport {
    pub supported: bool,
    pub max_operations: i64,
    pub max_payload_size: i64,
}

impl Default for BulkSupport {
    fn default() -> Self {
        Self {
            supported: true,
            max_operations: 0,
            max_payload_size: 0,
        }
    }
}

/// Filter support with its result cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSupport {
    pub supported: bool,
    pub max_results: i64,
}

impl Default for FilterSupport {
    fn default() -> Self {
        Self {
            supported: true,
            max_results: 0,
        }
    }
}

/// Lazily-fetched snapshot of the target's declared optional features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub patch: bool,
    pub sort: bool,
    pub bulk: bool,
    pub filter: bool,
    pub etag: bool,
    pub change_password: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all_supported()
    }
}

impl Capabilities {
    /// The fail-open default: everything declared supported.
    pub fn all_supported() -> Self {
        Self {
            patch: true,
            sort: true,
            bulk: true,
            filter: true,
            etag: true,
            change_password: true,
        }
    }

    pub fn from_config(config: &ServiceProviderConfig) -> Self {
        Self {
            patch: config.patch.supported,
            sort: config.sort.supported,
            bulk: config.bulk.supported,
            filter: config.filter.supported,
            etag: config.etag.supported,
            change_password: config.change_password.supported,
        }
    }

    /// Fetch `{base}/ServiceProviderConfig` and snapshot the flags.
    ///
    /// Any transport failure, non-200 status or undecodable body yields
    /// [`Capabilities::all_supported`] rather than an error.
    pub async fn discover<C: WireClient>(client: &C, base_url: &str) -> CapabilitySnapshot {
        let url = format!("{}/ServiceProviderConfig", base_url.trim_end_matches('/'));
        let capabilities = match client.execute(WireRequest::get(&url)).await {
            Ok(response) if response.status == 200 => {
                match serde_json::from_str::<ServiceProviderConfig>(&response.body) {
                    Ok(config) => Self::from_config(&config),
                    Err(e) => {
                        log::warn!("undecodable ServiceProviderConfig from {url}: {e}");
                        Self::all_supported()
                    }
                }
            }
            Ok(response) => {
                log::warn!(
                    "ServiceProviderConfig fetch from {url} returned {}",
                    response.status
                );
                Self::all_supported()
            }
            Err(e) => {
                log::warn!("ServiceProviderConfig fetch from {url} failed: {e}");
                Self::all_supported()
            }
        };
        CapabilitySnapshot {
            capabilities,
            fetched_at: Utc::now(),
        }
    }
}

/// A capability snapshot with the time it was taken, for run reports.
#[derive(Debug, Clone)]
pub struct CapabilitySnapshot {
    pub capabilities: Capabilities,
    pub fetched_at: DateTime<Utc>,
}
