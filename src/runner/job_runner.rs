use async_trait::async_trait;

use crate::actions::ActionFactory;
use crate::context::JobContext;
use crate::error::JobError;
use crate::jobs::Job;
use crate::scope::Scope;

/// Dispatch capability handed to action handlers.
///
/// Handlers use it to look up other actions or to run nested jobs and tasks
/// within their own job's scope.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Returns the action constructor registered under `name`.
    fn action_by_name(&self, name: &str) -> Result<ActionFactory, JobError>;

    /// Scope new jobs are dispatched in.
    fn scope(&self) -> &Scope;

    /// Runs a job and reports its result on `ctx`.
    ///
    /// Async jobs are started in the background and the call returns at once;
    /// otherwise it returns after `ctx` has reported.
    async fn run_job(&self, job: Job, ctx: JobContext);

    /// Runs the jobs of task `name` in `scope`, each on a child of `ctx`.
    ///
    /// Returns after every job (async ones included) has reported.
    async fn run_task(&self, name: &str, scope: &Scope, ctx: &JobContext) -> Result<(), JobError>;
}
