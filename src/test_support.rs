//! Pod fixtures shared by unit tests

use k8s_openapi::api::core::v1::Pod;
use kube::error::ErrorResponse;
use serde_json::json;

pub fn api_error(code: u16, reason: &str, message: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".into(),
        message: message.into(),
        reason: reason.into(),
        code,
    })
}

/// A running pod with one application container and no ephemeral containers
pub fn running_pod(name: &str) -> Pod {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": { "name": name, "namespace": "shop", "resourceVersion": "100" },
        "spec": {
            "containers": [{ "name": "app", "image": "nginx:1.27" }]
        },
        "status": {
            "phase": "Running",
            "containerStatuses": [{
                "name": "app",
                "image": "nginx:1.27",
                "imageID": "",
                "ready": true,
                "restartCount": 0,
                "state": { "running": { "startedAt": "2026-10-17T09:00:00Z" } }
            }]
        }
    }))
    .unwrap()
}

/// `pod` with an ephemeral container status in the given state
///
/// `state` is one of `waiting`, `running` or `terminated`.
pub fn with_ephemeral_status(mut pod: Pod, container: &str, state: &str) -> Pod {
    let state = match state {
        "waiting" => json!({ "waiting": { "reason": "ContainerCreating" } }),
        "running" => json!({ "running": { "startedAt": "2026-10-17T09:01:00Z" } }),
        "terminated" => json!({
            "terminated": { "exitCode": 0, "reason": "Completed" }
        }),
        other => panic!("unknown state {other}"),
    };
    let status = serde_json::from_value(json!({
        "name": container,
        "image": "busybox",
        "imageID": "",
        "ready": false,
        "restartCount": 0,
        "state": state
    }))
    .unwrap();

    let pod_status = pod.status.get_or_insert_with(Default::default);
    pod_status
        .ephemeral_container_statuses
        .get_or_insert_with(Vec::new)
        .push(status);
    pod
}
