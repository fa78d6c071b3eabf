//! Command-line surface of the `kubectl reach` plugin

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches, Parser};

use crate::cluster::ClusterOptions;
use crate::config::{ProbeRequest, DEFAULT_IMAGE};
use crate::target::ConnectivityTarget;
use crate::Result;

const EXAMPLES: &str = "\
Examples:
  kubectl reach myapp-abc123 --to google.com:443
  kubectl reach myapp-abc123 --to 10.0.0.5:8080 -n myns
  kubectl reach myapp-abc123 --to myservice:80 --image busybox --timeout 10";

#[derive(Parser, Debug)]
#[command(name = "kubectl-reach")]
#[command(about = "Test network connectivity from a pod to a target using an ephemeral debug container")]
#[command(
    long_about = "Test network connectivity from an existing Pod to a target (IP, DNS, or Service) \
by injecting an ephemeral debug container into the source Pod. Useful for verifying \
if NetworkPolicies or Service Meshes are blocking traffic.\n\n\
Requires Kubernetes 1.25+ (EphemeralContainers is stable). Does not restart existing \
application containers."
)]
#[command(version, after_help = EXAMPLES)]
pub struct Cli {
    /// Pod to run the connectivity check from
    #[arg(value_name = "SOURCE_POD")]
    pub pod: String,

    /// Target destination as host:port (e.g. google.com:443 or 10.0.0.5:8080)
    #[arg(long, value_name = "HOST:PORT")]
    pub to: String,

    /// Debug container image
    #[arg(long, default_value = DEFAULT_IMAGE)]
    pub image: String,

    /// Timeout for the connection check (e.g. 10, 5s, 1500ms)
    #[arg(long, default_value = "5s", value_parser = parse_timeout)]
    pub timeout: Duration,

    /// Namespace of the source pod
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Kubeconfig cluster to use
    #[arg(long)]
    pub cluster: Option<String>,

    /// Kubeconfig user to use
    #[arg(long)]
    pub user: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,
}

impl Cli {
    /// Parse the process arguments, naming the command after how it was invoked
    pub fn parse_from_env() -> Self {
        let mut command = Cli::command();
        if let Some(name) = std::env::args().next().as_deref().and_then(plugin_bin_name) {
            command = command.bin_name(name);
        }
        let matches = command.get_matches();
        Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions {
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            user: self.user.clone(),
            namespace: self.namespace.clone(),
        }
    }

    pub fn target(&self) -> Result<ConnectivityTarget> {
        ConnectivityTarget::parse(&self.to)
    }

    /// Build the probe request once the namespace is resolved
    pub fn probe_request(&self, namespace: &str, target: ConnectivityTarget) -> Result<ProbeRequest> {
        ProbeRequest::builder(&self.pod, namespace, target)
            .image(&self.image)
            .timeout(self.timeout)
            .build_validated()
    }
}

/// Accept bare seconds (`10`) as well as human durations (`5s`, `1m30s`)
pub fn parse_timeout(raw: &str) -> std::result::Result<Duration, String> {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| e.to_string());
    }
    humantime::parse_duration(raw).map_err(|e| e.to_string())
}

/// `kubectl reach` when run as a kubectl plugin binary
pub fn plugin_bin_name(argv0: &str) -> Option<String> {
    let base = Path::new(argv0).file_stem()?.to_str()?;
    let plugin = base.strip_prefix("kubectl-")?;
    if plugin.is_empty() {
        return None;
    }
    Some(format!("kubectl {}", plugin.replace('-', " ").replace('_', "-")))
}
