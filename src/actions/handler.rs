//! # Action handler trait.
//!
//! An [`ActionHandler`] is built fresh for each job invocation by a registered
//! [`ActionFactory`](crate::ActionFactory). The runner drives it through two
//! capabilities:
//!
//! - [`call`](ActionHandler::call) performs the work
//! - [`cancel`](ActionHandler::cancel) is invoked **concurrently** with an
//!   in-flight `call` once the job context is cancelled (explicitly, through a
//!   parent, or by its deadline)
//!
//! The runner reports the value returned by `call` on the job context; handlers
//! do not need to call `result` themselves.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use jobvisor::{ActionHandler, JobContext, JobError, JobRunner};
//!
//! struct Wait;
//!
//! #[async_trait]
//! impl ActionHandler for Wait {
//!     async fn call(&self, ctx: &JobContext, _runner: &dyn JobRunner) -> Result<(), JobError> {
//!         ctx.cancelled().await;
//!         Err(JobError::Canceled)
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::JobContext;
use crate::error::JobError;
use crate::runner::JobRunner;

/// Runnable unit of work bound to one job invocation.
#[async_trait]
pub trait ActionHandler: Send + Sync + 'static {
    /// Runs the action.
    ///
    /// `runner` is scoped to the job and may be used to dispatch nested jobs.
    async fn call(&self, ctx: &JobContext, runner: &dyn JobRunner) -> Result<(), JobError>;

    /// Stops the action.
    ///
    /// Must be safe to run while `call` is still executing. The default does
    /// nothing and relies on `call` observing [`JobContext::cancelled`].
    async fn cancel(&self, ctx: &JobContext) -> Result<(), JobError> {
        let _ = ctx;
        Ok(())
    }
}

/// Shared handle to an action handler.
pub type HandlerRef = Arc<dyn ActionHandler>;
