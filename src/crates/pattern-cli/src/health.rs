//! Health reporting for the `health` command

use crate::app::App;
use pattern_core::PatternKind;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Everything configured is usable
    Healthy,
    /// Local patterns work but the worker does not
    Degraded,
    /// No patterns can run
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Worker section of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHealth {
    pub base_url: String,
    pub state: String,
    pub healthy: bool,
    pub response_time_ms: u64,
}

/// Overall health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub local_patterns: usize,
    pub remote_patterns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<WorkerHealth>,
}

pub async fn check(app: &App) -> HealthReport {
    let local_patterns = app.registry.list_by_kind(PatternKind::Local).len();
    let remote_patterns = app.registry.list_by_kind(PatternKind::RemoteWorker).len();

    let worker = match &app.bridge {
        Some(bridge) => {
            let started = Instant::now();
            let healthy = bridge.health_check().await;
            Some(WorkerHealth {
                base_url: bridge.config().base_url.clone(),
                state: bridge.state().to_string(),
                healthy,
                response_time_ms: started.elapsed().as_millis() as u64,
            })
        }
        None => None,
    };

    let status = match &worker {
        _ if app.registry.count() == 0 => HealthStatus::Unhealthy,
        Some(w) if !w.healthy && local_patterns == 0 => HealthStatus::Unhealthy,
        Some(w) if !w.healthy => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    };

    HealthReport {
        status,
        local_patterns,
        remote_patterns,
        worker,
    }
}
