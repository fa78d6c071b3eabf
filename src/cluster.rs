//! Cluster access
//!
//! [`PodClient`] is the only way the probe pipeline talks to the API server.
//! It returns raw `kube::Error`s so callers can classify them, and is mocked
//! in tests so the pipeline runs without a cluster.

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use futures::io::AsyncBufRead;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, LogParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use crate::{Error, Result};

/// Name of the pod sub-resource that holds ephemeral containers
pub const EPHEMERAL_CONTAINERS_SUBRESOURCE: &str = "ephemeralcontainers";

/// Byte stream of a container's output
pub type LogStream = Pin<Box<dyn AsyncBufRead + Send>>;

/// Pod operations needed by a probe
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PodClient: Send + Sync {
    /// Fetch the current state of a pod
    async fn get(&self, namespace: &str, name: &str) -> std::result::Result<Pod, kube::Error>;

    /// Replace the pod's ephemeral container list with the one in `pod`
    async fn replace_ephemeral_containers(
        &self,
        namespace: &str,
        name: &str,
        pod: &Pod,
    ) -> std::result::Result<Pod, kube::Error>;

    /// Follow the output of a single container
    async fn log_stream(
        &self,
        namespace: &str,
        name: &str,
        container: &str,
    ) -> std::result::Result<LogStream, kube::Error>;
}

/// [`PodClient`] backed by a live API server
#[derive(Clone)]
pub struct KubePodClient {
    client: Client,
}

impl KubePodClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl PodClient for KubePodClient {
    async fn get(&self, namespace: &str, name: &str) -> std::result::Result<Pod, kube::Error> {
        self.pods(namespace).get(name).await
    }

    async fn replace_ephemeral_containers(
        &self,
        namespace: &str,
        name: &str,
        pod: &Pod,
    ) -> std::result::Result<Pod, kube::Error> {
        let body = serde_json::to_vec(pod).map_err(kube::Error::SerdeError)?;
        self.pods(namespace)
            .replace_subresource(EPHEMERAL_CONTAINERS_SUBRESOURCE, name, &PostParams::default(), body)
            .await
    }

    async fn log_stream(
        &self,
        namespace: &str,
        name: &str,
        container: &str,
    ) -> std::result::Result<LogStream, kube::Error> {
        let params = LogParams {
            container: Some(container.to_string()),
            follow: true,
            previous: false,
            timestamps: false,
            ..LogParams::default()
        };
        let stream = self.pods(namespace).log_stream(name, &params).await?;
        Ok(Box::pin(stream))
    }
}

/// Where to find the cluster, as selected on the command line
#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub cluster: Option<String>,
    pub user: Option<String>,
    pub namespace: Option<String>,
}

impl ClusterOptions {
    fn kubeconfig_options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            user: self.user.clone(),
        }
    }

    fn has_overrides(&self) -> bool {
        self.kubeconfig.is_some()
            || self.context.is_some()
            || self.cluster.is_some()
            || self.user.is_some()
    }

    /// Resolve the client configuration
    ///
    /// Without overrides this is kube's usual inference (`KUBECONFIG`,
    /// `~/.kube/config`, then in-cluster).
    pub async fn load_config(&self) -> Result<Config> {
        let config = match &self.kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &self.kubeconfig_options()).await?
            }
            None if self.has_overrides() => {
                Config::from_kubeconfig(&self.kubeconfig_options()).await?
            }
            None => Config::infer().await?,
        };
        tracing::debug!(
            cluster_url = %config.cluster_url,
            default_namespace = %config.default_namespace,
            "Loaded cluster configuration"
        );
        Ok(config)
    }

    /// Namespace to probe in: the flag, else the kubeconfig context's
    pub fn resolve_namespace(&self, config: &Config) -> String {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ if !config.default_namespace.is_empty() => config.default_namespace.clone(),
            _ => "default".to_string(),
        }
    }

    /// Build an authenticated client and the namespace to use
    pub async fn connect(&self) -> Result<(KubePodClient, String)> {
        let config = self.load_config().await?;
        let namespace = self.resolve_namespace(&config);
        let client = Client::try_from(config)
            .map_err(|e| Error::ClusterConfig(format!("creating kubernetes client: {e}")))?;
        Ok((KubePodClient::new(client), namespace))
    }
}
