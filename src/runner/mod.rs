//! # Job runner.
//!
//! - [`Runner`] dispatches jobs and tasks, publishes lifecycle events
//! - [`RunnerBuilder`] wires configuration, registry, tasks and subscribers
//! - [`JobRunner`] dispatch capability handed to action handlers
//! - [`TaskSource`] / [`TaskSet`] task definitions by name

mod builder;
mod condition;
mod inflight;
mod job_runner;
mod runner;
mod tasks;

pub use builder::RunnerBuilder;
pub use job_runner::JobRunner;
pub use runner::Runner;
pub use tasks::{TaskSet, TaskSource};
