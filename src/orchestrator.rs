//! Orchestrator for a single connectivity probe
//!
//! Runs resolve, inject, poll and stream in order and stops at the first
//! failure. Once the probe container exists every later failure is wrapped
//! in [`Error::ProbeIncomplete`], since the container stays on the pod.

use futures::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

use crate::cluster::PodClient;
use crate::config::{PollConfig, ProbeRequest};
use crate::probe::{self, ProbeContainerStatus};
use crate::{Error, Result};

/// Sequences the probe stages against one cluster
pub struct Orchestrator<C> {
    client: C,
    poll: PollConfig,
}

impl<C: PodClient> Orchestrator<C> {
    /// Create an orchestrator with default poll timing
    pub fn new(client: C) -> Self {
        Self {
            client,
            poll: PollConfig::default(),
        }
    }

    /// Create an orchestrator with custom poll timing
    pub fn with_config(client: C, poll: PollConfig) -> Result<Self> {
        poll.validate()?;
        Ok(Self { client, poll })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run one probe, relaying the probe container's output into `sink`
    ///
    /// `cancel` is observed only from the readiness wait onward: pod
    /// resolution and injection always run to completion, so a canceled run
    /// can still leave a probe container on the pod.
    pub async fn run<W>(
        &self,
        request: &ProbeRequest,
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> Result<ProbeReport>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let namespace = request.namespace();
        let pod_name = request.pod();

        let pod = probe::resolve(&self.client, namespace, pod_name).await?;
        let container = probe::inject(&self.client, &pod, request).await?;

        let status = probe::await_ready(&self.client, namespace, pod_name, &container, &self.poll, cancel)
            .await
            .map_err(|e| Error::incomplete(&container, e))?;

        let bytes_relayed = probe::stream_logs(&self.client, namespace, pod_name, &container, sink, cancel)
            .await
            .map_err(|e| Error::incomplete(&container, e))?;

        tracing::info!(
            pod = %pod_name,
            container = %container,
            bytes = bytes_relayed,
            "Probe completed"
        );

        Ok(ProbeReport {
            container,
            ready_status: status,
            bytes_relayed,
        })
    }
}

/// Outcome of a successful probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Generated name of the ephemeral container, left on the pod
    pub container: String,
    /// Status that ended the readiness wait
    pub ready_status: ProbeContainerStatus,
    pub bytes_relayed: u64,
}
