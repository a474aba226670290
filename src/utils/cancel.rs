//! Cancellation for result streams.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::streaming::ChatResultStream;

/// Requests cancellation of a stream. Clones share the same signal.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the wrapped stream. The inner stream is dropped, which closes the
    /// HTTP connection so the provider stops generating.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Wrap `stream` so it ends as soon as the returned handle is cancelled,
/// even while waiting for the next item.
pub fn make_cancellable_stream(stream: ChatResultStream) -> (ChatResultStream, CancelHandle) {
    let handle = CancelHandle::new();
    let token = handle.token.clone();
    let mut inner = stream;

    let wrapped = async_stream::stream! {
        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                item = inner.next() => item,
            };
            match next {
                Some(item) => yield item,
                None => break,
            }
        }
        drop(inner);
    };
    (Box::pin(wrapped), handle)
}
