//! # Actions: pluggable units of work.
//!
//! - [`ActionHandler`] trait with `call` / `cancel` capabilities
//! - [`HandlerFn`] closure-backed handler
//! - [`HandlerRef`] shared handle (`Arc<dyn ActionHandler>`)
//! - [`Registry`], [`ActionFactory`], [`Plugin`] name → constructor lookup

mod handler;
mod handler_fn;
mod registry;

pub use handler::{ActionHandler, HandlerRef};
pub use handler_fn::HandlerFn;
pub use registry::{ActionFactory, Actions, Plugin, Registry};
