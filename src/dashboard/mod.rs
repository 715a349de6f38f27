//! Local Explanation Dashboard
//!
//! Ephemeral web server previewing registered explanations.
//! `DashboardRunner` owns the server thread and its lifecycle;
//! the router serves figures routed through `Visualizer`.

mod api;
mod error;
mod handlers;
mod port;
mod runner;
mod state;

pub use api::create_router;
pub use error::DashboardError;
pub use port::{find_free_port, port_available};
pub use runner::{DashboardRunner, RunnerState, RunnerStatus};
pub use state::{DashboardState, ExplanationRegistry, ExplanationSummary, ShutdownTrigger};

use std::ops::RangeInclusive;
use std::time::Duration;

/// IANA dynamic/private port range
pub const EPHEMERAL_PORTS: RangeInclusive<u16> = 49152..=65535;

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub host: String,
    /// Fixed port; `None` draws a free one from `port_range`
    pub port: Option<u16>,
    pub port_range: RangeInclusive<u16>,
    pub max_port_attempts: usize,
    pub ping_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("DASHBOARD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("DASHBOARD_PORT")
                .ok()
                .and_then(|p| p.parse().ok()),
            port_range: EPHEMERAL_PORTS,
            max_port_attempts: 10,
            ping_timeout: std::env::var("DASHBOARD_PING_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_secs(1)),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl DashboardConfig {
    /// Local-only config on a random free port
    pub fn local() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: None,
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Host to probe: wildcard binds are reached through loopback
    pub(crate) fn probe_host(&self) -> &str {
        match self.host.as_str() {
            "0.0.0.0" | "::" => "127.0.0.1",
            host => host,
        }
    }
}
