//! Probe configuration with builder pattern

use std::time::Duration;

use crate::target::ConnectivityTarget;

/// Image used for the probe container unless overridden
pub const DEFAULT_IMAGE: &str = "busybox";

/// Connection timeout handed to the probe command unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Prefix of every generated ephemeral container name
pub const CONTAINER_NAME_PREFIX: &str = "reach-debug";

/// One connectivity probe, fixed for the whole invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pod: String,
    namespace: String,
    target: ConnectivityTarget,
    image: String,
    timeout: Duration,
}

impl ProbeRequest {
    pub fn builder(
        pod: impl Into<String>,
        namespace: impl Into<String>,
        target: ConnectivityTarget,
    ) -> ProbeRequestBuilder {
        ProbeRequestBuilder {
            request: ProbeRequest {
                pod: pod.into(),
                namespace: namespace.into(),
                target,
                image: DEFAULT_IMAGE.to_string(),
                timeout: DEFAULT_TIMEOUT,
            },
        }
    }

    pub fn pod(&self) -> &str {
        &self.pod
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn target(&self) -> &ConnectivityTarget {
        &self.target
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Timeout as given by the user, before normalization
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whole seconds passed to the probe command, never less than 1
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs().max(1)
    }

    /// Command and arguments run inside the probe container
    pub fn probe_command(&self) -> (Vec<String>, Vec<String>) {
        let command = vec!["nc".to_string()];
        let args = vec![
            "-zv".to_string(),
            "-w".to_string(),
            self.timeout_secs().to_string(),
            self.target.host().to_string(),
            self.target.port().to_string(),
        ];
        (command, args)
    }
}

pub struct ProbeRequestBuilder {
    request: ProbeRequest,
}

impl ProbeRequestBuilder {
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.request.image = image.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }

    pub fn build(self) -> ProbeRequest {
        self.request
    }

    pub fn build_validated(self) -> crate::Result<ProbeRequest> {
        let request = self.build();
        if request.pod.is_empty() {
            return Err(crate::Error::Config("source pod name cannot be empty".into()));
        }
        if request.namespace.is_empty() {
            return Err(crate::Error::Config("namespace cannot be empty".into()));
        }
        if request.image.is_empty() {
            return Err(crate::Error::Config("image cannot be empty".into()));
        }
        Ok(request)
    }
}

/// Timing of the readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between status fetches
    pub interval: Duration,
    /// Overall bound on the wait, independent of the connection timeout
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            deadline: Duration::from_secs(120),
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.interval.is_zero() {
            return Err(crate::Error::Config("poll interval must be positive".into()));
        }
        if self.deadline < self.interval {
            return Err(crate::Error::Config(
                "poll deadline must be at least one interval".into(),
            ));
        }
        Ok(())
    }
}
