//! Source pod lookup

use k8s_openapi::api::core::v1::Pod;

use crate::classify::{classify, Classification};
use crate::cluster::PodClient;
use crate::{Error, Result};

/// Fetch a fresh snapshot of the source pod
///
/// One request, no retries. A 404 becomes [`Error::PodNotFound`]; anything
/// else is a transport failure.
pub async fn resolve<C>(client: &C, namespace: &str, name: &str) -> Result<Pod>
where
    C: PodClient + ?Sized,
{
    tracing::debug!(pod = %name, namespace = %namespace, "Fetching source pod");

    client.get(namespace, name).await.map_err(|err| match classify(&err) {
        Classification::NotFound => Error::PodNotFound {
            name: name.to_string(),
            namespace: namespace.to_string(),
        },
        _ => Error::Transport(err),
    })
}
