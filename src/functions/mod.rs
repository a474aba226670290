//! Function calling: callbacks and the registry that resolves them.

pub mod callback;
pub mod registry;

pub use callback::{FunctionCallback, FunctionCallbackWrapper, FunctionCallbackWrapperBuilder};
pub use registry::{FunctionCallbackRegistry, FunctionCallbackResolver, ResolutionMode};
