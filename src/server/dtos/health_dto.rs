use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub version: String,
    pub environment: String,
    pub relay: RelayDetails,
}

/// static deployment shape, handy when several relays sit behind one balancer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayDetails {
    pub target_mode: String,
    pub content_type_policy: String,
    pub insecure_upstream_tls: bool,
    pub forward_request_headers: bool,
}
