//! # jobvisor
//!
//! **Jobvisor** is a job execution and context-propagation engine for
//! declarative task automation.
//!
//! A task is an ordered list of jobs. Each job names an action, a mixin or
//! another task to run, plus optional metadata: a shell condition, a start
//! delay, a deadline, local variables and params. The crate resolves jobs to
//! handlers, runs them sync or async, and propagates cancellation, deadlines
//! and results through a tree of job contexts.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   TaskSource ("build" ─► [Job, Job, Job])        Registry (name ─► ActionFactory)
//!          │                                              │
//!          ▼                                              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner                                                           │
//! │  - Scope (globals + locals, {{ var }} expansion)                  │
//! │  - run_task: jobs in order, async jobs tracked by a WaitGroup     │
//! │  - run_job:  deadline, delay, vars, condition, handler call       │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   JobContext         JobContext         JobContext        (child_context per job)
//!   token ◄── parent   result (once)      deadline timer
//!        │
//!        │ Publishes Events: DelayScheduled, JobSkipped, JobStarting,
//!        │                   JobFinished | JobFailed | JobCanceled | DeadlineHit
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                (capacity: RunnerConfig::bus_capacity)             │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          listener ─► SubscriberSet
//!                                  ┌─────────┼─────────┐
//!                                  ▼         ▼         ▼
//!                              LogWriter  worker2   workerN
//! ```
//!
//! ### Context tree
//! ```text
//! root (Runner::context)
//!  └─ task "build"
//!      ├─ child: job "fmt"      sync, awaited before the next job
//!      ├─ child: job "test"     async, released into the task WaitGroup
//!      └─ child: job "publish"  task ─► children ...
//!
//! cancel(root) ─► every descendant is cancelled, handlers get `cancel()`
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Jobs**          | Declarative job model, serde-deserializable.                  | [`Job`], [`JobExecType`], [`ActionParams`] |
//! | **Contexts**      | Cancellation tree, single-shot result, wait-groups, deadlines.| [`JobContext`], [`WaitGroup`]              |
//! | **Scopes**        | Layered variables and `{{ name }}` expansion.                 | [`Scope`], [`Vars`]                        |
//! | **Actions**       | Pluggable handlers constructed by name.                       | [`ActionHandler`], [`Registry`], [`Plugin`]|
//! | **Runner**        | Dispatches jobs and tasks.                                    | [`Runner`], [`JobRunner`], [`TaskSource`]  |
//! | **Subscriber API**| Hook into job lifecycle events.                               | [`Subscribe`], [`Event`]                   |
//! | **Errors**        | Typed job and runtime errors.                                 | [`JobError`], [`RuntimeError`]             |
//! | **Configuration** | Centralize runner settings.                                   | [`RunnerConfig`]                           |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use jobvisor::{ActionParams, HandlerFn, Job, Registry, Runner, RunnerConfig, TaskSet};
//!
//! #[derive(serde::Deserialize)]
//! struct Echo {
//!     msg: String,
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = Registry::new();
//!     registry.register_action("echo", |scope, params: ActionParams, _log| {
//!         let cfg: Echo = params.unmarshal()?;
//!         let msg = scope.expand_variables(&cfg.msg)?;
//!         Ok(HandlerFn::arc(move |_ctx| {
//!             let msg = msg.clone();
//!             async move {
//!                 println!("{msg}");
//!                 Ok(())
//!             }
//!         }))
//!     })?;
//!
//!     let tasks = TaskSet::new().with_task(
//!         "hello",
//!         vec![Job::action("echo").with_params(ActionParams::new().with("msg", "hi"))],
//!     );
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn jobvisor::Subscribe>> = vec![Arc::new(jobvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn jobvisor::Subscribe>> = Vec::new();
//!
//!     let runner = Runner::builder(RunnerConfig::default())
//!         .with_registry(registry)
//!         .with_tasks(tasks)
//!         .with_subscribers(subs)
//!         .build();
//!
//!     runner.run("hello").await?;
//!     runner.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod actions;
mod config;
mod context;
mod error;
mod events;
mod jobs;
mod runner;
mod scope;
mod subscribers;

// ---- Public re-exports ----

pub use actions::{ActionFactory, ActionHandler, Actions, HandlerFn, HandlerRef, Plugin, Registry};
pub use config::RunnerConfig;
pub use context::{JobContext, ResultReceiver, WaitGroup};
pub use error::{JobError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use jobs::{ActionParams, Job, JobExecType, Period};
pub use runner::{JobRunner, Runner, RunnerBuilder, TaskSet, TaskSource};
pub use scope::{ProjectEnvironment, Scope, Vars};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
