use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

use crate::config::AppConfig;

use super::relay_services::{DynRelayService, RelayOptions, RelayService};

/// everything a handler can reach, cloned into each request through an Extension.
/// nothing in here is mutable, requests never share state
#[derive(Clone)]
pub struct EdgeServices {
    pub relay: DynRelayService,
    pub metrics: Option<PrometheusHandle>,
    pub config: Arc<AppConfig>,
}

impl EdgeServices {
    pub fn new(config: Arc<AppConfig>, keep_alive: bool) -> anyhow::Result<Self> {
        info!("starting relay services...");

        let http = RelayService::build_client(&config).context("failed to build upstream client")?;
        let relay = Arc::new(RelayService::new(
            http,
            RelayOptions::from_config(&config, keep_alive),
        )) as DynRelayService;

        let metrics = if config.metrics {
            Self::install_metrics()
        } else {
            None
        };

        info!(
            "relay ok (mode: {:?}, content type policy: {:?})",
            config.target_mode, config.content_type_policy
        );

        Ok(Self {
            relay,
            metrics,
            config,
        })
    }

    /// swap in a different relay, mostly for tests
    pub fn with_relay(config: Arc<AppConfig>, relay: DynRelayService) -> Self {
        Self {
            relay,
            metrics: None,
            config,
        }
    }

    // the recorder is process global, a second install (another handler in the same process)
    // just runs without /metrics
    fn install_metrics() -> Option<PrometheusHandle> {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("metrics recorder not installed: {}", e);
                None
            }
        }
    }
}
