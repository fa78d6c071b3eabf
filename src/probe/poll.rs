//! Readiness polling for the probe container
//!
//! Re-fetches the pod on a fixed tick until the probe container shows up as
//! running or terminated. Cancellation and the outer deadline are checked
//! while sleeping and while a fetch is in flight, not only between ticks.

use std::fmt;

use k8s_openapi::api::core::v1::Pod;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::classify::{classify, Classification};
use crate::cluster::PodClient;
use crate::config::PollConfig;
use crate::{Error, Result};

/// Lifecycle state reported by the cluster for a probe container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeContainerStatus {
    Waiting,
    Running,
    Terminated,
}

impl ProbeContainerStatus {
    /// Whether the container's logs can be read
    pub fn is_observable(&self) -> bool {
        matches!(self, ProbeContainerStatus::Running | ProbeContainerStatus::Terminated)
    }
}

impl fmt::Display for ProbeContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeContainerStatus::Waiting => write!(f, "Waiting"),
            ProbeContainerStatus::Running => write!(f, "Running"),
            ProbeContainerStatus::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Status of the named ephemeral container, if the pod reports one yet
pub fn container_status(pod: &Pod, container: &str) -> Option<ProbeContainerStatus> {
    let status = pod
        .status
        .as_ref()?
        .ephemeral_container_statuses
        .as_ref()?
        .iter()
        .find(|s| s.name == container)?;

    let state = status.state.as_ref();
    if state.and_then(|s| s.running.as_ref()).is_some() {
        Some(ProbeContainerStatus::Running)
    } else if state.and_then(|s| s.terminated.as_ref()).is_some() {
        Some(ProbeContainerStatus::Terminated)
    } else {
        Some(ProbeContainerStatus::Waiting)
    }
}

/// Wait until `container` is running or has already exited
///
/// The first fetch happens immediately. A failed fetch is returned at once
/// rather than retried on the next tick.
pub async fn await_ready<C>(
    client: &C,
    namespace: &str,
    pod: &str,
    container: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<ProbeContainerStatus>
where
    C: PodClient + ?Sized,
{
    let started = Instant::now();
    let deadline = started + config.deadline;
    let timeout = || Error::Timeout {
        container: container.to_string(),
        waited: config.deadline,
    };

    let mut ticker = time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Canceled),
            _ = time::sleep_until(deadline) => return Err(timeout()),
            _ = ticker.tick() => {}
        }

        let snapshot = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Canceled),
            _ = time::sleep_until(deadline) => return Err(timeout()),
            fetched = client.get(namespace, pod) => fetched.map_err(|err| match classify(&err) {
                Classification::NotFound => Error::PodNotFound {
                    name: pod.to_string(),
                    namespace: namespace.to_string(),
                },
                _ => Error::Transport(err),
            })?,
        };

        match container_status(&snapshot, container) {
            Some(status) if status.is_observable() => {
                tracing::info!(
                    container = %container,
                    status = %status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Ephemeral container ready"
                );
                return Ok(status);
            }
            status => {
                tracing::debug!(container = %container, status = ?status, "Waiting for ephemeral container");
            }
        }
    }
}
