//! Result stream types.

use std::pin::Pin;

use futures::Stream;

use crate::error::LlmError;
use crate::types::ChatResult;
use crate::utils::cancel::CancelHandle;

/// Incremental chat results. Finite and forward-only; an `Err` item is
/// always the last one.
pub type ChatResultStream = Pin<Box<dyn Stream<Item = Result<ChatResult, LlmError>> + Send>>;

/// A result stream paired with the handle that cancels it.
pub struct ChatResultStreamHandle {
    pub stream: ChatResultStream,
    pub cancel: CancelHandle,
}

impl ChatResultStreamHandle {
    pub fn into_parts(self) -> (ChatResultStream, CancelHandle) {
        (self.stream, self.cancel)
    }
}

impl std::fmt::Debug for ChatResultStreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatResultStreamHandle")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
