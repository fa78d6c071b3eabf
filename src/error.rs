//! Error types for kubectl-reach

use std::time::Duration;

use thiserror::Error;

/// Minimum Kubernetes version with stable ephemeral containers.
pub const MIN_EPHEMERAL_CONTAINERS_VERSION: &str = "1.25";

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid target {raw:?}: {reason}")]
    InvalidTarget { raw: String, reason: String },

    #[error("pod {name:?} not found in namespace {namespace:?}")]
    PodNotFound { name: String, namespace: String },

    #[error(
        "ephemeral containers are not supported by this cluster \
         (requires Kubernetes {min_version}+): {source}"
    )]
    UnsupportedFeature {
        min_version: &'static str,
        #[source]
        source: kube::Error,
    },

    #[error("adding ephemeral container: {0}")]
    Injection(#[source] kube::Error),

    #[error("timeout waiting for ephemeral container {container:?} to start after {}", humanize(.waited))]
    Timeout { container: String, waited: Duration },

    #[error("streaming logs from ephemeral container: {0}")]
    Stream(#[source] std::io::Error),

    #[error("talking to the cluster: {0}")]
    Transport(#[source] kube::Error),

    #[error("canceled")]
    Canceled,

    #[error("probe container {container:?} was created but could not complete: {source}")]
    ProbeIncomplete {
        container: String,
        #[source]
        source: Box<Error>,
    },

    #[error("cluster configuration: {0}")]
    ClusterConfig(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn humanize(d: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*d)
}

impl Error {
    /// The failure underneath any post-injection wrapper
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::ProbeIncomplete { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Check if the cluster lacks ephemeral container support
    pub fn is_unsupported_feature(&self) -> bool {
        matches!(self.root_cause(), Error::UnsupportedFeature { .. })
    }

    /// Process exit code for this failure. Success is the only zero.
    pub fn exit_code(&self) -> i32 {
        match self.root_cause() {
            Error::InvalidTarget { .. } => 2,
            Error::Canceled => 130,
            _ => 1,
        }
    }

    /// Wrap a failure that happened after the probe container was added
    pub(crate) fn incomplete(container: impl Into<String>, source: Error) -> Self {
        Error::ProbeIncomplete {
            container: container.into(),
            source: Box::new(source),
        }
    }
}

impl From<kube::config::KubeconfigError> for Error {
    fn from(err: kube::config::KubeconfigError) -> Self {
        Error::ClusterConfig(err.to_string())
    }
}

impl From<kube::config::InferConfigError> for Error {
    fn from(err: kube::config::InferConfigError) -> Self {
        Error::ClusterConfig(err.to_string())
    }
}
