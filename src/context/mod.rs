//! # Job contexts.
//!
//! - [`JobContext`] per-job liveness, cancellation tree, result and deadline
//! - [`ResultReceiver`] observer of a context's single terminal value
//! - [`WaitGroup`] completion counter released by contexts when they finish

mod context;
mod receiver;
mod wait_group;

pub use context::JobContext;
pub use receiver::ResultReceiver;
pub use wait_group::WaitGroup;
