//! Error types used by the job runner, contexts and scopes.
//!
//! - [`RuntimeError`]: errors raised by the runner itself (shutdown).
//! - [`JobError`]: errors reported by individual jobs.
//!
//! [`JobError`] is the single terminal error a job can report. Its variants fall
//! into four groups:
//!
//! - **configuration**: unknown or duplicate action/mixin, unknown task, empty job, params decoding,
//!   handler construction, task nesting limit. Detected at dispatch, never retried.
//! - **execution**: the handler's `call` failed ([`JobError::Fail`]).
//! - **cancellation**: explicit cancel or deadline expiry.
//! - **variable resolution**: an `{{ name }}` reference could not be resolved.
//!
//! The type is `Clone` so that the terminal value can be held by a job context
//! and observed by any number of waiters.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the runner itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// In-flight async jobs did not stop within the grace period.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Descriptions of the jobs still running.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck jobs={stuck:?}")
            }
        }
    }
}

/// # Errors produced while running a job.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// No action constructor is registered under the given name.
    #[error("unknown action '{name}'")]
    UnknownAction {
        /// Requested action name.
        name: String,
    },

    /// No mixin constructor is registered under the given name.
    #[error("unknown mixin '{name}'")]
    UnknownMixin {
        /// Requested mixin name.
        name: String,
    },

    /// An action or mixin with this name is already registered.
    #[error("'{name}' is already registered")]
    DuplicateAction {
        /// Conflicting name.
        name: String,
    },

    /// The task source has no task with the given name.
    #[error("unknown task '{name}'")]
    UnknownTask {
        /// Requested task name.
        name: String,
    },

    /// Job declares neither an action, a mixin nor a task.
    #[error("job '{job}' has no action, mixin or task to run")]
    EmptyJob {
        /// Job description (may be empty).
        job: String,
    },

    /// Job params could not be decoded into the action's structure.
    #[error("failed to unmarshal plugin params, {error}")]
    Params {
        /// Decoder error message.
        error: String,
    },

    /// Action constructor rejected the job.
    #[error("failed to create handler for '{name}': {error}")]
    Construct {
        /// Action or mixin name.
        name: String,
        /// Constructor error message.
        error: String,
    },

    /// Task nesting went deeper than the configured limit.
    #[error("task '{task}' exceeds max nesting depth {depth}")]
    RecursionLimit {
        /// Task that would have been entered.
        task: String,
        /// Configured limit.
        depth: usize,
    },

    /// A `{{ name }}` reference has no binding in scope.
    #[error("unresolved variable '{name}'")]
    UnresolvedVariable {
        /// Variable name as written in the expression.
        name: String,
    },

    /// Handler execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Job was cancelled (explicitly or through a parent context).
    #[error("context cancelled")]
    Canceled,

    /// Job ran out of its deadline.
    #[error("context deadline exceeded after {deadline:?}")]
    DeadlineExceeded {
        /// Installed deadline.
        deadline: Duration,
    },
}

impl JobError {
    /// Builds a [`JobError::Fail`] from any displayable error.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        JobError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::JobError;
    ///
    /// let err = JobError::UnknownAction { name: "deploy".into() };
    /// assert_eq!(err.as_label(), "job_unknown_action");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::UnknownAction { .. } => "job_unknown_action",
            JobError::UnknownMixin { .. } => "job_unknown_mixin",
            JobError::DuplicateAction { .. } => "job_duplicate_action",
            JobError::UnknownTask { .. } => "job_unknown_task",
            JobError::EmptyJob { .. } => "job_empty",
            JobError::Params { .. } => "job_params",
            JobError::Construct { .. } => "job_construct",
            JobError::RecursionLimit { .. } => "job_recursion_limit",
            JobError::UnresolvedVariable { .. } => "job_unresolved_variable",
            JobError::Fail { .. } => "job_failed",
            JobError::Canceled => "job_canceled",
            JobError::DeadlineExceeded { .. } => "job_deadline_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            JobError::Fail { error } => format!("error: {error}"),
            JobError::Canceled => "context cancelled".to_string(),
            JobError::DeadlineExceeded { deadline } => format!("deadline: {deadline:?}"),
            other => other.to_string(),
        }
    }

    /// Indicates a configuration problem detected before the handler ran.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            JobError::UnknownAction { .. }
                | JobError::UnknownMixin { .. }
                | JobError::DuplicateAction { .. }
                | JobError::UnknownTask { .. }
                | JobError::EmptyJob { .. }
                | JobError::Params { .. }
                | JobError::Construct { .. }
                | JobError::RecursionLimit { .. }
        )
    }

    /// Distinguishes "aborted" from "failed".
    ///
    /// Returns `true` for [`JobError::Canceled`] and [`JobError::DeadlineExceeded`].
    ///
    /// # Example
    /// ```
    /// use jobvisor::JobError;
    ///
    /// assert!(JobError::Canceled.is_cancellation());
    /// assert!(!JobError::fail("boom").is_cancellation());
    /// ```
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            JobError::Canceled | JobError::DeadlineExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let unknown = JobError::UnknownMixin { name: "m".into() };
        assert!(unknown.is_config());
        assert!(!unknown.is_cancellation());

        let deadline = JobError::DeadlineExceeded {
            deadline: Duration::from_millis(10),
        };
        assert!(deadline.is_cancellation());
        assert!(!deadline.is_config());

        let unresolved = JobError::UnresolvedVariable { name: "x".into() };
        assert!(!unresolved.is_config());
        assert!(!unresolved.is_cancellation());
    }

    #[test]
    fn test_runtime_error_label() {
        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_secs(1),
            stuck: vec!["sleep".into()],
        };
        assert_eq!(err.as_label(), "runtime_grace_exceeded");
        assert!(err.as_message().contains("sleep"));
    }

    #[test]
    fn test_messages() {
        assert_eq!(JobError::fail("boom").to_string(), "execution failed: boom");
        assert_eq!(JobError::fail("boom").as_message(), "error: boom");
        assert_eq!(
            JobError::Params { error: "bad".into() }.to_string(),
            "failed to unmarshal plugin params, bad"
        );
    }
}
