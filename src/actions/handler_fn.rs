//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(JobContext) -> Fut`, producing a fresh
//! future per call. Cancellation is cooperative: the closure receives an owned
//! context and should watch [`JobContext::cancelled`].
//!
//! ## Example
//! ```rust
//! use jobvisor::{HandlerFn, HandlerRef, JobContext, JobError};
//!
//! let h: HandlerRef = HandlerFn::arc(|ctx: JobContext| async move {
//!     if !ctx.is_alive() {
//!         return Err(JobError::Canceled);
//!     }
//!     // do work...
//!     Ok(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::actions::handler::{ActionHandler, HandlerRef};
use crate::context::JobContext;
use crate::error::JobError;
use crate::runner::JobRunner;

/// Function-backed handler implementation.
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Fut> HandlerFn<F>
where
    F: Fn(JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    /// Creates a new function-backed handler.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared [`HandlerRef`].
    pub fn arc(f: F) -> HandlerRef {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> ActionHandler for HandlerFn<F>
where
    F: Fn(JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    async fn call(&self, ctx: &JobContext, _runner: &dyn JobRunner) -> Result<(), JobError> {
        (self.f)(ctx.clone()).await
    }
}
