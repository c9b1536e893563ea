//! # Job model.
//!
//! - [`Job`] a single declarative step of a task
//! - [`JobExecType`] what a job runs (action, mixin, task or nothing)
//! - [`Period`] millisecond durations used by `delay` / `deadline`
//! - [`ActionParams`] opaque params decoded by the action that receives them

mod job;
mod params;

pub use job::{Job, JobExecType, Period};
pub use params::ActionParams;
