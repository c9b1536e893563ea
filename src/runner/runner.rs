//! # Runner: dispatches jobs and tasks.
//!
//! [`Runner`] resolves a job to its handler, drives it on a [`JobContext`] and
//! publishes lifecycle events to the [`Bus`].
//!
//! ## Job flow
//! ```text
//! run_job(job, ctx)
//!   ├─ ctx.timeout(job.deadline | cfg.default_deadline)
//!   ├─ async?  tracker.spawn(execute) ──► return
//!   └─ sync    execute ──► return
//!
//! execute
//!   ├─ delay          DelayScheduled, sleep (cancellable)
//!   ├─ vars           expand job vars, layer onto scope
//!   ├─ condition      shell exit != 0 ──► JobSkipped, success (cancellable)
//!   ├─ JobStarting
//!   ├─ Action/Mixin   registry ──► factory ──► call
//!   │                 ctx cancelled ──► cancel() and call, each bounded by grace
//!   │  Task           run_task on child contexts
//!   │  Empty          EmptyJob
//!   └─ ctx.result(..) ──► exactly one of JobFinished/JobFailed/JobCanceled/DeadlineHit
//! ```
//!
//! ## Task flow
//! ```text
//! run_task(name, scope, ctx)
//!   for job in task:
//!     child = ctx.child_context()
//!     async: wg.add(1); child.set_wait_group(wg); run_job
//!     sync:  run_job; child.wait()? ── error ──► cancel async siblings, stop
//!   wg.wait()
//!   first error: failed sync job, else first failed async job
//! ```
//!
//! ## Rules
//! - Every dispatched job reports exactly one result on its context
//! - Cancelling a task context cancels all of its jobs
//! - Configuration errors (unknown names, params, nesting) fail the job before its handler runs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::actions::{ActionFactory, Registry};
use crate::config::RunnerConfig;
use crate::context::{JobContext, WaitGroup};
use crate::error::{JobError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::jobs::{ActionParams, Job, JobExecType};
use crate::runner::condition;
use crate::runner::inflight::InFlight;
use crate::runner::job_runner::JobRunner;
use crate::runner::tasks::TaskSource;
use crate::scope::Scope;

/// State shared by a runner and every scoped copy of it.
pub(crate) struct Inner {
    pub(crate) cfg: RunnerConfig,
    pub(crate) registry: Registry,
    pub(crate) tasks: Arc<dyn TaskSource>,
    pub(crate) bus: Bus,
    /// Parent of every context created by [`Runner::context`].
    pub(crate) token: CancellationToken,
    pub(crate) tracker: TaskTracker,
    pub(crate) inflight: InFlight,
    pub(crate) listener_stop: CancellationToken,
    pub(crate) listener: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn listener(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Job runner.
///
/// Cheap to clone; clones share registry, task source, event bus and
/// shutdown state. Build one with [`RunnerBuilder`](crate::RunnerBuilder).
#[derive(Clone)]
pub struct Runner {
    inner: Arc<Inner>,
    scope: Scope,
    depth: usize,
}

impl Runner {
    pub(crate) fn new_internal(inner: Arc<Inner>, scope: Scope) -> Self {
        Self {
            inner,
            scope,
            depth: 0,
        }
    }

    /// Creates a [`RunnerBuilder`](crate::RunnerBuilder) with the given configuration.
    pub fn builder(cfg: RunnerConfig) -> crate::runner::RunnerBuilder {
        crate::runner::RunnerBuilder::new(cfg)
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.inner.cfg
    }

    /// Returns the action registry.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Returns the event bus jobs publish to.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Returns a copy of the runner dispatching into `scope`.
    pub fn with_scope(&self, scope: Scope) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            scope,
            depth: self.depth,
        }
    }

    /// Creates a root context cancelled by [`Runner::shutdown`].
    pub fn context(&self) -> JobContext {
        JobContext::with_token(
            self.inner.token.child_token(),
            tracing::info_span!("jobvisor"),
        )
    }

    /// Runs task `name` in the runner's scope on a fresh root context.
    pub async fn run(&self, name: &str) -> Result<(), JobError> {
        let ctx = self.context();
        let res = self.run_task(name, &self.scope, &ctx).await;
        ctx.result(res.clone());
        res
    }

    /// Cancels every context created by [`Runner::context`] and waits up to
    /// [`RunnerConfig::grace`] for running async jobs.
    ///
    /// Subscribers are drained afterwards.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.inner.token.cancel();
        self.inner.tracker.close();

        let grace = self.inner.cfg.grace;
        let res = match time::timeout(grace, self.inner.tracker.wait()).await {
            Ok(()) => Ok(()),
            Err(_elapsed) => Err(RuntimeError::GraceExceeded {
                grace,
                stuck: self.inner.inflight.snapshot(),
            }),
        };

        self.inner.listener_stop.cancel();
        let listener = self.inner.listener().take();
        if let Some(handle) = listener {
            let _ = time::timeout(grace, handle).await;
        }
        res
    }

    /// Runs one job on `ctx` and reports its outcome. Never fails itself.
    async fn execute(&self, job: Job, ctx: JobContext) {
        let desc: Arc<str> = Arc::from(job.format_description());
        let span = tracing::info_span!(
            parent: ctx.log(),
            "job",
            job = %desc,
            kind = job.exec_type().as_label()
        );
        let ctx = ctx.fork_with_span(span);

        let res = self.dispatch(&job, &desc, &ctx).await;
        ctx.result(res.clone());

        // A deadline may have finished the context first.
        let outcome = ctx.errors().try_recv().unwrap_or(res);
        publish_terminal(&self.inner.bus, &desc, &outcome);
    }

    async fn dispatch(&self, job: &Job, desc: &Arc<str>, ctx: &JobContext) -> Result<(), JobError> {
        if !job.delay.is_zero() {
            let delay = job.delay.to_duration();
            self.inner.bus.publish(
                Event::new(EventKind::DelayScheduled)
                    .with_job(Arc::clone(desc))
                    .with_delay(delay),
            );
            tokio::select! {
                _ = ctx.cancelled() => return Err(JobError::Canceled),
                _ = time::sleep(delay) => {}
            }
        }

        let vars = self.scope.expand_vars(&job.vars)?;
        let scope = self.scope.append_variables(vars);

        if !job.condition.is_empty() {
            let expr = scope.expand_variables(&job.condition)?;
            let holds = tokio::select! {
                _ = ctx.cancelled() => return Err(JobError::Canceled),
                holds = condition::holds(&self.inner.cfg, &scope, &expr, ctx.log()) => holds,
            };
            if !holds {
                self.inner.bus.publish(
                    Event::new(EventKind::JobSkipped)
                        .with_job(Arc::clone(desc))
                        .with_reason(expr),
                );
                return Ok(());
            }
        }

        let kind = job.exec_type();
        self.inner.bus.publish(
            Event::new(EventKind::JobStarting)
                .with_job(Arc::clone(desc))
                .with_reason(kind.as_label()),
        );

        let runner = self.with_scope(scope);
        match kind {
            JobExecType::Action => {
                let factory = self.inner.registry.action(&job.action_name)?;
                runner
                    .call_handler(&job.action_name, &factory, job.params.clone(), ctx)
                    .await
            }
            JobExecType::Mixin => {
                let factory = self.inner.registry.mixin(&job.mixin_name)?;
                runner
                    .call_handler(&job.mixin_name, &factory, job.params.clone(), ctx)
                    .await
            }
            JobExecType::Task => runner.run_task(&job.task_name, &runner.scope, ctx).await,
            JobExecType::Empty => Err(JobError::EmptyJob {
                job: desc.to_string(),
            }),
        }
    }

    /// Builds a handler and drives its `call` until it returns or `ctx` is cancelled.
    async fn call_handler(
        &self,
        name: &str,
        factory: &ActionFactory,
        params: ActionParams,
        ctx: &JobContext,
    ) -> Result<(), JobError> {
        let handler =
            factory(self.scope.clone(), params, ctx.log().clone()).map_err(|e| match e {
                JobError::Fail { error } => JobError::Construct {
                    name: name.to_string(),
                    error,
                },
                other => other,
            })?;

        if ctx.token().is_cancelled() {
            return Err(JobError::Canceled);
        }

        let call = handler.call(ctx, self);
        tokio::pin!(call);

        // Cancellation is polled first so `cancel` runs even when `call`
        // itself reacts to the token.
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {}
            res = &mut call => return res,
        }

        tracing::debug!(parent: ctx.log(), "cancelling handler");
        let grace = self.inner.cfg.grace;
        let (stopped, late) = tokio::join!(
            time::timeout(grace, handler.cancel(ctx)),
            time::timeout(grace, &mut call),
        );
        match stopped {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(parent: ctx.log(), error = %e, "handler cancel failed"),
            Err(_elapsed) => tracing::warn!(parent: ctx.log(), ?grace, "handler cancel timed out"),
        }
        match late {
            Ok(Err(e)) if e.is_cancellation() => Err(e),
            Ok(_) => Err(JobError::Canceled),
            Err(_elapsed) => {
                tracing::warn!(parent: ctx.log(), ?grace, "handler ignored cancellation");
                Err(JobError::Canceled)
            }
        }
    }

    fn deadline_for(&self, job: &Job) -> Option<Duration> {
        if job.deadline.is_zero() {
            self.inner.cfg.default_deadline()
        } else {
            Some(job.deadline.to_duration())
        }
    }
}

#[async_trait]
impl JobRunner for Runner {
    fn action_by_name(&self, name: &str) -> Result<ActionFactory, JobError> {
        self.inner.registry.action(name)
    }

    fn scope(&self) -> &Scope {
        &self.scope
    }

    async fn run_job(&self, job: Job, ctx: JobContext) {
        if let Some(deadline) = self.deadline_for(&job) {
            ctx.timeout(deadline);
        }

        if job.is_async {
            let guard = self.inner.inflight.enter(Arc::from(job.format_description()));
            let runner = self.clone();
            self.inner.tracker.spawn(async move {
                let _guard = guard;
                runner.execute(job, ctx).await;
            });
        } else {
            self.execute(job, ctx).await;
        }
    }

    async fn run_task(&self, name: &str, scope: &Scope, ctx: &JobContext) -> Result<(), JobError> {
        let depth = self.depth + 1;
        if let Some(limit) = self.inner.cfg.depth_limit() {
            if depth > limit {
                return Err(JobError::RecursionLimit {
                    task: name.to_string(),
                    depth: limit,
                });
            }
        }

        let jobs = self
            .inner
            .tasks
            .task(name)
            .ok_or_else(|| JobError::UnknownTask {
                name: name.to_string(),
            })?;

        let runner = Self {
            inner: Arc::clone(&self.inner),
            scope: scope.clone(),
            depth,
        };
        tracing::debug!(parent: ctx.log(), task = name, jobs = jobs.len(), depth, "running task");

        let wg = WaitGroup::new();
        let mut pending: Vec<JobContext> = Vec::new();
        let mut failure = None;

        for job in jobs {
            if ctx.token().is_cancelled() {
                failure = Some(JobError::Canceled);
                break;
            }

            let child = ctx.child_context();
            if job.is_async {
                wg.add(1);
                child.set_wait_group(wg.clone());
                runner.run_job(job, child.clone()).await;
                pending.push(child);
            } else {
                runner.run_job(job, child.clone()).await;
                if let Err(e) = child.wait().await {
                    failure = Some(e);
                    break;
                }
            }
        }

        if failure.is_some() {
            for child in &pending {
                child.cancel();
            }
        }
        wg.wait().await;

        if let Some(e) = failure {
            return Err(e);
        }
        pending
            .iter()
            .find_map(|child| child.errors().try_recv().and_then(Result::err))
            .map_or(Ok(()), Err)
    }
}

/// Publishes the single terminal event matching `outcome`.
fn publish_terminal(bus: &Bus, job: &Arc<str>, outcome: &Result<(), JobError>) {
    let ev = match outcome {
        Ok(()) => Event::new(EventKind::JobFinished),
        Err(JobError::Canceled) => Event::new(EventKind::JobCanceled),
        Err(JobError::DeadlineExceeded { deadline }) => {
            Event::new(EventKind::DeadlineHit).with_deadline(*deadline)
        }
        Err(e) => Event::new(EventKind::JobFailed)
            .with_reason(e.to_string())
            .with_label(e.as_label()),
    };
    bus.publish(ev.with_job(Arc::clone(job)));
}
