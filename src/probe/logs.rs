//! Log relay from the probe container

use futures::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::cluster::PodClient;
use crate::{Error, Result};

/// Copy the probe container's output into `sink` until the stream ends
///
/// The probe command exits on its own after its connection timeout, which
/// closes the stream, so there is no separate timeout here. Returns the
/// number of bytes relayed.
pub async fn stream_logs<C, W>(
    client: &C,
    namespace: &str,
    pod: &str,
    container: &str,
    sink: &mut W,
    cancel: &CancellationToken,
) -> Result<u64>
where
    C: PodClient + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    tracing::debug!(container = %container, "Opening log stream");

    let stream = client
        .log_stream(namespace, pod, container)
        .await
        .map_err(Error::Transport)?;

    let copied = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Canceled),
        copied = futures::io::copy_buf(stream, &mut *sink) => copied.map_err(Error::Stream)?,
    };
    sink.flush().await.map_err(Error::Stream)?;

    tracing::debug!(container = %container, bytes = copied, "Log stream closed");
    Ok(copied)
}
