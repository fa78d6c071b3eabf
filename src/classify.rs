//! Classification of cluster API failures
//!
//! Two layers: a structural one that looks at the HTTP status of an API
//! error, and a best-effort textual one that looks for markers the API
//! server uses when the `ephemeralcontainers` sub-resource is missing.
//! The textual layer can be dropped once servers report a structured cause.

/// What a failed API call means for the probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The server has no ephemeral container support
    UnsupportedFeature,
    /// The named object does not exist
    NotFound,
    /// Anything else: transport, authorization, conflicts
    Generic,
}

const UNSUPPORTED_MARKERS: &[&str] = &[
    "ephemeralcontainers",
    "subresource",
    "methodnotallowed",
    "method not allowed",
];

/// Message the API server returns for an unknown resource path
const UNKNOWN_RESOURCE_MESSAGE: &str = "could not find the requested resource";

/// Wording of a rejected request that names a missing capability
const CAPABILITY_MARKERS: &[&str] = &["not supported", "feature gate"];

/// Admission denials and per-field validation failures on a supported server
const REJECTION_MARKERS: &[&str] = &["denied the request", "spec.ephemeralcontainers["];

/// Classify a failed cluster call
///
/// An API response only counts as missing support when its status says so
/// (404 on the sub-resource path, 405) or when a 400/422 rejection names a
/// missing capability. Authorization, conflict, admission and field
/// validation responses stay generic even when they name the sub-resource.
pub fn classify(err: &kube::Error) -> Classification {
    match err {
        kube::Error::Api(response) => match response.code {
            405 => Classification::UnsupportedFeature,
            404 if response.message.contains(UNKNOWN_RESOURCE_MESSAGE)
                || classify_message(Some(&response.message))
                    == Classification::UnsupportedFeature =>
            {
                Classification::UnsupportedFeature
            }
            404 => Classification::NotFound,
            400 | 422 if describes_missing_capability(&response.message) => {
                Classification::UnsupportedFeature
            }
            _ => Classification::Generic,
        },
        other => classify_message(Some(&other.to_string())),
    }
}

fn describes_missing_capability(message: &str) -> bool {
    let lowered = message.to_lowercase();
    if REJECTION_MARKERS.iter().any(|m| lowered.contains(m)) {
        return false;
    }
    CAPABILITY_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Textual heuristic over an error message; `None` means no error
pub fn classify_message(message: Option<&str>) -> Classification {
    let Some(message) = message else {
        return Classification::Generic;
    };
    let lowered = message.to_lowercase();
    if UNSUPPORTED_MARKERS.iter().any(|m| lowered.contains(m)) {
        Classification::UnsupportedFeature
    } else {
        Classification::Generic
    }
}
