//! kubectl-reach
//!
//! Tests network connectivity from a running pod to an arbitrary `host:port`
//! without restarting the pod's containers. A short-lived ephemeral container
//! running `nc -zv` is attached to the pod, and its output is relayed back
//! once the cluster reports it as started.
//!
//! # Pipeline
//!
//! 1. Parse the destination ([`ConnectivityTarget`])
//! 2. Fetch the source pod
//! 3. Append a uniquely named probe container through the
//!    `ephemeralcontainers` sub-resource
//! 4. Poll the pod status until the probe is running or has exited
//! 5. Follow the probe container's log until it closes
//!
//! The probe container is left on the pod afterwards; Kubernetes does not
//! allow removing ephemeral containers.
//!
//! # Example
//!
//! ```no_run
//! use kubectl_reach::{ClusterOptions, ConnectivityTarget, Orchestrator, ProbeRequest};
//! use tokio_util::compat::TokioAsyncWriteCompatExt;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn probe() -> kubectl_reach::Result<()> {
//! let (client, namespace) = ClusterOptions::default().connect().await?;
//! let target = ConnectivityTarget::parse("google.com:443")?;
//! let request = ProbeRequest::builder("myapp-abc123", namespace, target).build();
//!
//! let mut stdout = tokio::io::stdout().compat_write();
//! let report = Orchestrator::new(client)
//!     .run(&request, &mut stdout, &CancellationToken::new())
//!     .await?;
//! println!("probe container: {}", report.container);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod probe;
pub mod target;

#[cfg(test)]
pub(crate) mod test_support;

pub use cluster::{ClusterOptions, KubePodClient, PodClient};
pub use config::{PollConfig, ProbeRequest};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, ProbeReport};
pub use target::ConnectivityTarget;
