//! Utilities.

pub mod cancel;

pub use cancel::{CancelHandle, make_cancellable_stream};
