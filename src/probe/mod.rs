//! Probe pipeline stages
//!
//! Each stage is a free function over a [`PodClient`](crate::cluster::PodClient):
//! resolve the source pod, inject the probe container, wait for it to start,
//! then relay its output.

pub mod inject;
pub mod logs;
pub mod poll;
pub mod resolve;

pub use inject::{inject, next_container_name};
pub use logs::stream_logs;
pub use poll::{await_ready, container_status, ProbeContainerStatus};
pub use resolve::resolve;
