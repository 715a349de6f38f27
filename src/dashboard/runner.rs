//! Dashboard lifecycle: port allocation, background server thread, ping, stop

use std::fmt;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::api::create_router;
use super::port::{bind_listener, find_free_port};
use super::state::{DashboardState, ExplanationRegistry, ShutdownTrigger};
use super::DashboardConfig;
use crate::error::{ExplainError, Result};
use crate::explanation::ExplanationRecord;

/// Lifecycle state of a `DashboardRunner`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    NotRunning,
    Starting,
    Running,
    Stopped,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunnerState::NotRunning => "not running",
            RunnerState::Starting => "starting",
            RunnerState::Running => "running",
            RunnerState::Stopped => "stopped",
        })
    }
}

/// Snapshot returned by `DashboardRunner::status`
#[derive(Debug, Clone, Serialize)]
pub struct RunnerStatus {
    pub address: String,
    pub base_url: String,
    pub state: RunnerState,
    pub thread_alive: bool,
    pub explanations: usize,
    pub started_at: Option<DateTime<Utc>>,
}

struct ServerHandle {
    thread: JoinHandle<()>,
    shutdown: Arc<ShutdownTrigger>,
    /// Loopback health client; proxies from the environment are ignored
    client: reqwest::blocking::Client,
}

/// Owns one local dashboard server thread.
///
/// Lifecycle calls take `&mut self`: a single owner drives
/// `start` → `ping`* → `stop`. Independent runners need no coordination.
pub struct DashboardRunner {
    config: DashboardConfig,
    port: u16,
    fixed_port: bool,
    registry: Arc<ExplanationRegistry>,
    state: RunnerState,
    server: Option<ServerHandle>,
    started_at: Option<DateTime<Utc>>,
}

impl DashboardRunner {
    /// Create a runner in the `NotRunning` state.
    ///
    /// Without a configured port a free one is drawn from `config.port_range`.
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let (port, fixed_port) = match config.port {
            Some(port) => (port, true),
            None => (
                find_free_port(&config.host, config.port_range.clone(), config.max_port_attempts)?,
                false,
            ),
        };
        info!(host = %config.host, port, fixed_port, "Dashboard port allocated");

        Ok(Self {
            config,
            port,
            fixed_port,
            registry: Arc::new(ExplanationRegistry::new()),
            state: RunnerState::NotRunning,
            server: None,
            started_at: None,
        })
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.port)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.config.probe_host(), self.port)
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunnerState::Running
    }

    pub fn registry(&self) -> &Arc<ExplanationRegistry> {
        &self.registry
    }

    /// Host an explanation; works before and after `start`
    pub fn register(&self, record: impl Into<Arc<ExplanationRecord>>) -> String {
        let id = self.registry.register(record.into());
        debug!(id = %id, "Explanation registered with dashboard");
        id
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.registry.unregister(id)
    }

    /// URL of the figure for `key` of a registered explanation
    pub fn display_link(&self, id: &str, key: Option<usize>) -> String {
        let mut url = format!("{}/api/explanations/{}/figure", self.base_url(), id);
        if let Some(key) = key {
            url.push_str(&format!("?key={}", key));
        }
        url
    }

    /// Launch the server thread. Returns once the thread is spawned, without
    /// waiting for the server to accept connections.
    pub fn start(&mut self) -> Result<()> {
        if self.state != RunnerState::NotRunning {
            return Err(ExplainError::InvalidState {
                operation: "start",
                state: self.state.to_string(),
            });
        }

        self.state = RunnerState::Starting;
        match self.launch() {
            Ok(server) => {
                self.server = Some(server);
                self.state = RunnerState::Running;
                let started_at = Utc::now();
                self.started_at = Some(started_at);
                info!(
                    address = %self.address(),
                    url = %self.base_url(),
                    started_at = %started_at.to_rfc3339(),
                    "Dashboard started"
                );
                Ok(())
            }
            Err(e) => {
                self.state = RunnerState::NotRunning;
                error!(error = %e, "Dashboard failed to start");
                Err(e)
            }
        }
    }

    fn launch(&mut self) -> Result<ServerHandle> {
        let listener = bind_listener(
            &self.config.host,
            self.port,
            self.fixed_port,
            self.config.port_range.clone(),
            self.config.max_port_attempts,
        )?;
        listener.set_nonblocking(true)?;
        self.port = listener.local_addr()?.port();

        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.ping_timeout)
            .no_proxy()
            .build()
            .map_err(|e| ExplainError::Runtime(format!("ping client: {}", e)))?;

        let (trigger, shutdown_rx) = ShutdownTrigger::new();
        let shutdown = Arc::new(trigger);
        let state = Arc::new(DashboardState::new(
            Arc::clone(&self.registry),
            Arc::clone(&shutdown),
        ));
        let app = create_router(state);

        let thread = thread::Builder::new()
            .name(format!("explain-dashboard-{}", self.port))
            .spawn(move || serve_blocking(listener, app, shutdown_rx))?;

        Ok(ServerHandle {
            thread,
            shutdown,
            client,
        })
    }

    /// Bounded reachability probe against `/api/health`.
    ///
    /// Never errors: `false` covers "not yet ready", "not running" and
    /// timeouts alike. Blocks the calling thread for at most
    /// `config.ping_timeout`; do not call from async code.
    pub fn ping(&mut self) -> bool {
        if self.state != RunnerState::Running {
            debug!(state = %self.state, "Dashboard ping skipped");
            return false;
        }
        let url = format!("{}/api/health", self.base_url());
        let client = self
            .server
            .as_ref()
            .filter(|s| !s.thread.is_finished())
            .map(|s| s.client.clone());
        let Some(client) = client else {
            warn!(port = self.port, "Dashboard thread exited unexpectedly");
            self.reap();
            return false;
        };

        match client.get(&url).send() {
            Ok(response) if response.status().is_success() => {
                info!(url = %url, "Dashboard ping succeeded");
                true
            }
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Dashboard ping rejected");
                false
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Dashboard ping failed");
                false
            }
        }
    }

    /// Shut the server down and release the port.
    ///
    /// A no-op returning `true` when nothing is running. Returns `false`
    /// if the server thread outlived `config.shutdown_timeout`; that thread
    /// is detached and may keep holding the port.
    pub fn stop(&mut self) -> bool {
        let Some(server) = self.server.take() else {
            debug!(state = %self.state, "Dashboard not running, nothing to stop");
            return true;
        };

        info!(port = self.port, "Triggering dashboard shutdown");
        server.shutdown.fire();

        let deadline = Instant::now() + self.config.shutdown_timeout;
        while !server.thread.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        self.state = RunnerState::Stopped;

        if !server.thread.is_finished() {
            error!(port = self.port, "Dashboard thread still alive despite shutdown");
            return false;
        }
        if server.thread.join().is_err() {
            error!(port = self.port, "Dashboard thread panicked");
        }
        let uptime = self
            .started_at
            .map(|t| Utc::now().signed_duration_since(t).num_seconds())
            .unwrap_or(0);
        info!(port = self.port, uptime_secs = uptime, "Dashboard stopped");
        true
    }

    fn reap(&mut self) {
        if let Some(server) = self.server.take() {
            if server.thread.join().is_err() {
                error!(port = self.port, "Dashboard thread panicked");
            }
        }
        self.state = RunnerState::Stopped;
    }

    pub fn status(&self) -> RunnerStatus {
        RunnerStatus {
            address: self.address(),
            base_url: self.base_url(),
            state: self.state,
            thread_alive: self.server.as_ref().is_some_and(|s| !s.thread.is_finished()),
            explanations: self.registry.len(),
            started_at: self.started_at,
        }
    }
}

impl Drop for DashboardRunner {
    fn drop(&mut self) {
        if self.server.is_some() {
            self.stop();
        }
    }
}

/// Body of the server thread: a current-thread runtime serving until shutdown
fn serve_blocking(listener: TcpListener, app: axum::Router, shutdown: oneshot::Receiver<()>) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to build dashboard runtime");
            return;
        }
    };

    runtime.block_on(async move {
        let listener = match tokio::net::TcpListener::from_std(listener) {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = %e, "Failed to register dashboard listener");
                return;
            }
        };
        if let Ok(addr) = listener.local_addr() {
            info!(address = %addr, "Dashboard listening");
        }

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.await;
            })
            .await;

        match result {
            Ok(()) => info!("Dashboard shut down cleanly"),
            Err(e) => error!(error = %e, "Dashboard server error"),
        }
    });
}
