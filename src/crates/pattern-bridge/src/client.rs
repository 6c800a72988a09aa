//! HTTP client for the pattern worker.
//!
//! The worker exposes three endpoints:
//!
//! - `GET /health` returning `{"status": "healthy"}`
//! - `GET /version` returning a map of component versions
//! - `POST /execute` taking an [`RpcRequest`] and returning an [`RpcResponse`]
//!
//! # Example
//!
//! ```rust,ignore
//! use pattern_bridge::{BridgeConfig, IpcBridge, RpcRequest};
//!
//! let bridge = IpcBridge::new(BridgeConfig::from_env()?)?;
//! bridge.start().await?;
//!
//! let response = bridge.execute(RpcRequest::new("translate", "bonjour")).await?;
//! println!("{:?}", response.output);
//! ```

use crate::config::{BridgeConfig, WireFormat};
use crate::error::{BridgeError, Result};
use crate::messages::{HealthResponse, RpcRequest, RpcResponse};
use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};

/// Keys every `/version` reply must contain
pub const REQUIRED_VERSION_KEYS: [&str; 2] = ["python", "backend"];

/// Lifecycle of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Stopped,
    Starting,
    Running,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeState::Stopped => write!(f, "stopped"),
            BridgeState::Starting => write!(f, "starting"),
            BridgeState::Running => write!(f, "running"),
        }
    }
}

/// Client for an out-of-process pattern worker
///
/// Cloning is cheap and every clone shares the same connection pool and
/// lifecycle state. Requests are only sent while the bridge is running.
#[derive(Clone)]
pub struct IpcBridge {
    config: Arc<BridgeConfig>,
    client: Client,
    state: Arc<RwLock<BridgeState>>,
    lifecycle: Arc<Mutex<()>>,
}

impl fmt::Debug for IpcBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpcBridge")
            .field("base_url", &self.config.base_url)
            .field("state", &self.state())
            .finish()
    }
}

impl IpcBridge {
    /// Create a stopped bridge
    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| BridgeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            client,
            state: Arc::new(RwLock::new(BridgeState::Stopped)),
            lifecycle: Arc::new(Mutex::new(())),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn state(&self) -> BridgeState {
        *self.state.read()
    }

    pub fn is_running(&self) -> bool {
        self.state() == BridgeState::Running
    }

    /// Move to the running state
    ///
    /// Probes `/health` up to `startup_attempts` times first. If every
    /// probe fails the bridge returns to stopped. Calling `start` on a
    /// running bridge does nothing.
    pub async fn start(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        if self.is_running() {
            debug!("Worker bridge already running");
            return Ok(());
        }

        *self.state.write() = BridgeState::Starting;
        info!(base_url = %self.config.base_url, "Starting worker bridge");

        let attempts = self.config.startup_attempts;
        if attempts > 0 && !self.wait_until_healthy(attempts).await {
            *self.state.write() = BridgeState::Stopped;
            warn!(base_url = %self.config.base_url, attempts, "Worker never reported healthy");
            return Err(BridgeError::NotRunning(format!(
                "worker at {} failed {} health probe(s)",
                self.config.base_url, attempts
            )));
        }

        *self.state.write() = BridgeState::Running;
        info!("Worker bridge running");
        Ok(())
    }

    /// Move to the stopped state. Idempotent.
    pub async fn stop(&self) {
        let _guard = self.lifecycle.lock().await;
        let mut state = self.state.write();
        if *state != BridgeState::Stopped {
            *state = BridgeState::Stopped;
            info!("Worker bridge stopped");
        }
    }

    /// Whether the worker is reachable and reports itself healthy
    ///
    /// Always `false` while the bridge is not running. Never fails.
    pub async fn health_check(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.probe().await
    }

    /// Send one execution request
    pub async fn execute(&self, request: RpcRequest) -> Result<RpcResponse> {
        self.ensure_running()?;

        let span = info_span!(
            "bridge_execute",
            request_id = %request.request_id,
            pattern_id = %request.pattern_id
        );
        self.send_execute(request).instrument(span).await
    }

    /// Send many requests concurrently
    ///
    /// Responses come back in input order. The first failure aborts the
    /// requests still in flight and is returned as the batch's error.
    pub async fn execute_batch(&self, requests: Vec<RpcRequest>) -> Result<Vec<RpcResponse>> {
        self.ensure_running()?;

        let total = requests.len();
        let mut tasks = JoinSet::new();

        for (index, request) in requests.into_iter().enumerate() {
            let bridge = self.clone();
            tasks.spawn(async move { (index, bridge.execute(request).await) });
        }

        let mut responses: Vec<Option<RpcResponse>> = (0..total).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined.map_err(|e| BridgeError::CommunicationFailed {
                status: None,
                message: format!("Batch task failed: {}", e),
            })?;

            match outcome {
                Ok(response) => responses[index] = Some(response),
                Err(e) => {
                    warn!(index, error = %e, "Batch request failed, aborting remaining requests");
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        Ok(responses.into_iter().flatten().collect())
    }

    /// Component versions reported by the worker
    ///
    /// # Returns
    ///
    /// A map that always contains `python` and `backend`, or
    /// `InvalidResponse` when the reply does not have that shape.
    pub async fn get_version(&self) -> Result<BTreeMap<String, String>> {
        self.ensure_running()?;

        let bytes = self.exchange(self.client.get(self.endpoint("version"))).await?;
        parse_versions(&bytes)
    }

    fn ensure_running(&self) -> Result<()> {
        match self.state() {
            BridgeState::Running => Ok(()),
            state => Err(BridgeError::NotRunning(format!("bridge is {}", state))),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send_execute(&self, request: RpcRequest) -> Result<RpcResponse> {
        let body = match self.config.wire_format {
            WireFormat::Correlated => serde_json::to_vec(&request)?,
            WireFormat::Legacy => serde_json::to_vec(&request.to_legacy_body())?,
        };

        debug!(bytes = body.len(), "Sending execute request");
        let started = Instant::now();

        let builder = self
            .client
            .post(self.endpoint("execute"))
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let bytes = self.exchange(builder).await?;

        let mut response: RpcResponse = serde_json::from_slice(&bytes)
            .map_err(|e| BridgeError::InvalidResponse(format!("undecodable execute reply: {}", e)))?;

        if response.request_id.is_empty() {
            response.request_id = request.request_id;
        } else if response.request_id != request.request_id {
            return Err(BridgeError::InvalidResponse(format!(
                "reply for request {} does not match request {}",
                response.request_id, request.request_id
            )));
        }

        debug!(
            success = response.success,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Execute reply received"
        );
        Ok(response)
    }

    /// Send a request under the configured deadline and return the body
    /// of a successful reply
    async fn exchange(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let deadline = self.config.timeout();

        let call = async {
            let response = request
                .send()
                .await
                .map_err(|e| BridgeError::transport(e, deadline))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = if body.trim().is_empty() {
                    status.to_string()
                } else {
                    body
                };
                return Err(BridgeError::CommunicationFailed {
                    status: Some(status.as_u16()),
                    message,
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| BridgeError::transport(e, deadline))?;
            Ok::<_, BridgeError>(bytes.to_vec())
        };

        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = deadline.as_millis() as u64, "Worker request timed out");
                Err(BridgeError::Timeout(deadline))
            }
        }
    }

    /// Probe `/health` up to `attempts` times, pausing `startup_interval`
    /// between probes
    async fn wait_until_healthy(&self, attempts: u32) -> bool {
        for attempt in 1..=attempts {
            if self.probe().await {
                debug!(attempt, "Worker reported healthy");
                return true;
            }
            debug!(attempt, attempts, "Worker not healthy yet");
            if attempt < attempts {
                tokio::time::sleep(self.config.startup_interval()).await;
            }
        }
        false
    }

    /// Ungated `/health` probe used by both `start` and `health_check`
    async fn probe(&self) -> bool {
        let url = self.endpoint("health");

        let call = async {
            let response = self.client.get(&url).send().await.ok()?;
            if !response.status().is_success() {
                return None;
            }
            response.json::<HealthResponse>().await.ok()
        };

        match tokio::time::timeout(self.config.health_timeout(), call).await {
            Ok(Some(health)) => health.is_healthy(),
            Ok(None) => false,
            Err(_) => {
                debug!(url = %url, "Health probe timed out");
                false
            }
        }
    }
}

/// Decode a `/version` reply
///
/// Required components must be strings. Optional ones reported as numbers
/// or booleans are stringified; nulls and nested values are dropped.
fn parse_versions(bytes: &[u8]) -> Result<BTreeMap<String, String>> {
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(bytes)
        .map_err(|e| BridgeError::InvalidResponse(format!("undecodable version reply: {}", e)))?;

    for key in REQUIRED_VERSION_KEYS {
        match raw.get(key) {
            Some(serde_json::Value::String(_)) => {}
            Some(other) => {
                return Err(BridgeError::InvalidResponse(format!(
                    "version reply has non-string '{}': {}",
                    key, other
                )))
            }
            None => {
                return Err(BridgeError::InvalidResponse(format!(
                    "version reply missing '{}'",
                    key
                )))
            }
        }
    }

    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::String(v) => Some((key, v)),
            serde_json::Value::Number(n) => Some((key, n.to_string())),
            serde_json::Value::Bool(b) => Some((key, b.to_string())),
            _ => None,
        })
        .collect())
}
