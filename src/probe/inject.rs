//! Ephemeral container injection
//!
//! The fetched pod is cloned, the probe container appended to the clone's
//! ephemeral container list, and the clone submitted through the
//! `ephemeralcontainers` sub-resource. Containers already on the list,
//! including probes from earlier runs, are sent back untouched.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use k8s_openapi::api::core::v1::{EphemeralContainer, Pod};

use crate::classify::{classify, Classification};
use crate::cluster::PodClient;
use crate::config::{ProbeRequest, CONTAINER_NAME_PREFIX};
use crate::error::MIN_EPHEMERAL_CONTAINERS_VERSION;
use crate::{Error, Result};

static LAST_SUFFIX: AtomicI64 = AtomicI64::new(0);

/// Generate a probe container name unique within this process
///
/// The suffix is the current time in nanoseconds, bumped past the last
/// handed-out value when the clock has not moved.
pub fn next_container_name() -> String {
    let now = Utc::now();
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000));

    let mut last = LAST_SUFFIX.load(Ordering::Relaxed);
    let suffix = loop {
        let candidate = nanos.max(last.saturating_add(1));
        match LAST_SUFFIX.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => break candidate,
            Err(current) => last = current,
        }
    };

    format!("{CONTAINER_NAME_PREFIX}-{suffix}")
}

/// Build the probe container for `request`
pub fn probe_container(name: &str, request: &ProbeRequest) -> EphemeralContainer {
    let (command, args) = request.probe_command();
    EphemeralContainer {
        name: name.to_string(),
        image: Some(request.image().to_string()),
        command: Some(command),
        args: Some(args),
        ..Default::default()
    }
}

/// Copy of `pod` with `container` appended to its ephemeral containers
pub fn with_probe_container(pod: &Pod, container: EphemeralContainer) -> Pod {
    let mut copy = pod.clone();
    copy.spec
        .get_or_insert_with(Default::default)
        .ephemeral_containers
        .get_or_insert_with(Vec::new)
        .push(container);
    copy
}

/// Add a probe container to the source pod, returning its generated name
///
/// This is the only call that changes cluster state. It is not undone if a
/// later stage fails.
pub async fn inject<C>(client: &C, pod: &Pod, request: &ProbeRequest) -> Result<String>
where
    C: PodClient + ?Sized,
{
    let name = next_container_name();
    let updated = with_probe_container(pod, probe_container(&name, request));

    tracing::info!(
        pod = %request.pod(),
        namespace = %request.namespace(),
        container = %name,
        image = %request.image(),
        target = %request.target(),
        "Adding ephemeral container"
    );

    client
        .replace_ephemeral_containers(request.namespace(), request.pod(), &updated)
        .await
        .map_err(|err| match classify(&err) {
            Classification::UnsupportedFeature => Error::UnsupportedFeature {
                min_version: MIN_EPHEMERAL_CONTAINERS_VERSION,
                source: err,
            },
            Classification::NotFound => Error::PodNotFound {
                name: request.pod().to_string(),
                namespace: request.namespace().to_string(),
            },
            Classification::Generic => Error::Injection(err),
        })?;

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use crate::cluster::MockPodClient;
    use crate::target::ConnectivityTarget;
    use crate::test_support::{api_error, running_pod};

    fn request() -> ProbeRequest {
        ProbeRequest::builder("web-0", "shop", ConnectivityTarget::parse("db:5432").unwrap())
            .build()
    }

    fn ephemeral_names(pod: &Pod) -> Vec<String> {
        pod.spec
            .as_ref()
            .and_then(|s| s.ephemeral_containers.as_ref())
            .map(|list| list.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_container_names_are_unique() {
        let names: HashSet<_> = (0..1000).map(|_| next_container_name()).collect();
        assert_eq!(names.len(), 1000);
        assert!(names.iter().all(|n| n.starts_with("reach-debug-")));
    }

    #[test]
    fn test_probe_container_spec() {
        let container = probe_container("reach-debug-1", &request());

        assert_eq!(container.name, "reach-debug-1");
        assert_eq!(container.image.as_deref(), Some("busybox"));
        assert_eq!(container.command, Some(vec!["nc".to_string()]));
        assert_eq!(
            container.args,
            Some(vec![
                "-zv".to_string(),
                "-w".to_string(),
                "5".to_string(),
                "db".to_string(),
                "5432".to_string(),
            ])
        );
    }

    #[test]
    fn test_fetched_snapshot_untouched() {
        let pod = running_pod("web-0");
        let updated = with_probe_container(&pod, probe_container("reach-debug-1", &request()));

        assert!(ephemeral_names(&pod).is_empty());
        assert_eq!(ephemeral_names(&updated), vec!["reach-debug-1"]);
        assert_eq!(
            updated.spec.as_ref().unwrap().containers,
            pod.spec.as_ref().unwrap().containers
        );
        assert_eq!(updated.metadata, pod.metadata);
    }

    #[tokio::test]
    async fn test_inject_submits_full_pod() {
        let mut client = MockPodClient::new();
        client
            .expect_replace_ephemeral_containers()
            .withf(|ns, name, pod| {
                ns == "shop"
                    && name == "web-0"
                    && pod.spec.as_ref().map(|s| s.containers.len()) == Some(1)
                    && ephemeral_names(pod).len() == 1
            })
            .times(1)
            .returning(|_, _, pod| Ok(pod.clone()));

        let name = inject(&client, &running_pod("web-0"), &request()).await.unwrap();
        assert!(name.starts_with("reach-debug-"));
    }

    #[tokio::test]
    async fn test_repeated_injections_keep_earlier_probes() {
        let live = Arc::new(Mutex::new(running_pod("web-0")));

        let mut client = MockPodClient::new();
        let state = Arc::clone(&live);
        client
            .expect_get()
            .returning(move |_, _| Ok(state.lock().unwrap().clone()));
        let state = Arc::clone(&live);
        client
            .expect_replace_ephemeral_containers()
            .times(2)
            .returning(move |_, _, pod| {
                *state.lock().unwrap() = pod.clone();
                Ok(pod.clone())
            });

        let snapshot = client.get("shop", "web-0").await.unwrap();
        let first = inject(&client, &snapshot, &request()).await.unwrap();
        let snapshot = client.get("shop", "web-0").await.unwrap();
        let second = inject(&client, &snapshot, &request()).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(ephemeral_names(&live.lock().unwrap()), vec![first, second]);
    }

    #[tokio::test]
    async fn test_inject_unsupported_feature() {
        let mut client = MockPodClient::new();
        client.expect_replace_ephemeral_containers().returning(|_, _, _| {
            Err(api_error(
                404,
                "NotFound",
                "the server could not find the requested resource (put pods ephemeralcontainers)",
            ))
        });

        let err = inject(&client, &running_pod("web-0"), &request()).await.unwrap_err();
        assert!(err.is_unsupported_feature());
        assert!(err.to_string().contains("requires Kubernetes 1.25+"));
    }

    #[tokio::test]
    async fn test_inject_generic_failure() {
        let mut client = MockPodClient::new();
        client.expect_replace_ephemeral_containers().returning(|_, _, _| {
            Err(api_error(
                409,
                "Conflict",
                "Operation cannot be fulfilled on pods \"web-0\": the object has been modified",
            ))
        });

        let err = inject(&client, &running_pod("web-0"), &request()).await.unwrap_err();
        assert!(matches!(err, Error::Injection(_)));
    }

    #[tokio::test]
    async fn test_inject_pod_deleted() {
        let mut client = MockPodClient::new();
        client
            .expect_replace_ephemeral_containers()
            .returning(|_, _, _| Err(api_error(404, "NotFound", "pods \"web-0\" not found")));

        let err = inject(&client, &running_pod("web-0"), &request()).await.unwrap_err();
        assert!(matches!(err, Error::PodNotFound { .. }));
    }
}
