//! # Job definition.
//!
//! A [`Job`] is one step in a task. It names exactly one thing to run
//! (an action, a mixin or another task) plus optional metadata:
//! a shell guard, a start delay, a deadline, local variables and params.
//!
//! Jobs usually come from a manifest loader; the serde field names match the
//! manifest keys (`if`, `action`, `task`/`run`, `mixin`, `async`, ...).
//!
//! ## Example
//! ```rust
//! use jobvisor::{Job, JobExecType};
//!
//! let job: Job = serde_json::from_value(serde_json::json!({
//!     "action": "shell",
//!     "async": true,
//!     "delay": 100,
//!     "params": { "command": "echo hi" }
//! })).unwrap();
//!
//! assert_eq!(job.exec_type(), JobExecType::Action);
//! assert_eq!(job.format_description(), "shell");
//! assert!(job.is_async);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::jobs::params::ActionParams;
use crate::scope::Vars;

/// What a job executes.
///
/// Resolved by [`Job::exec_type`] with precedence `Action > Mixin > Task > Empty`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobExecType {
    /// Job has no `action`, `mixin` or `task` declaration.
    Empty,
    /// Job runs a registered action.
    Action,
    /// Job runs a registered mixin.
    Mixin,
    /// Job runs another task.
    Task,
}

impl JobExecType {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            JobExecType::Empty => "empty",
            JobExecType::Action => "action",
            JobExecType::Mixin => "mixin",
            JobExecType::Task => "task",
        }
    }
}

/// Job period in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(pub u64);

impl Period {
    /// Returns the period as a [`Duration`].
    #[inline]
    pub fn to_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// `0` means "not set".
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Period {
    fn from(ms: u64) -> Self {
        Period(ms)
    }
}

/// A single step in a task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    /// Shell command that must succeed for the job to run.
    #[serde(rename = "if", skip_serializing_if = "String::is_empty")]
    pub condition: String,

    /// Human readable description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Task to run.
    #[serde(rename = "task", alias = "run", skip_serializing_if = "String::is_empty")]
    pub task_name: String,

    /// Action to run.
    #[serde(rename = "action", skip_serializing_if = "String::is_empty")]
    pub action_name: String,

    /// Mixin to run. Cannot be combined with `action_name`.
    #[serde(rename = "mixin", skip_serializing_if = "String::is_empty")]
    pub mixin_name: String,

    /// Run without blocking the caller.
    #[serde(rename = "async", skip_serializing_if = "std::ops::Not::not")]
    pub is_async: bool,

    /// Delay before start.
    #[serde(skip_serializing_if = "Period::is_zero")]
    pub delay: Period,

    /// Time quota for the job, delay included.
    #[serde(skip_serializing_if = "Period::is_zero")]
    pub deadline: Period,

    /// Variables defined for this job.
    #[serde(skip_serializing_if = "Vars::is_empty")]
    pub vars: Vars,

    /// Arguments for the job's action.
    #[serde(skip_serializing_if = "ActionParams::is_empty")]
    pub params: ActionParams,
}

impl Job {
    /// Creates a job running the given action.
    pub fn action(name: impl Into<String>) -> Self {
        Self {
            action_name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a job running the given mixin.
    pub fn mixin(name: impl Into<String>) -> Self {
        Self {
            mixin_name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a job running the given task.
    pub fn task(name: impl Into<String>) -> Self {
        Self {
            task_name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a job with the given params.
    pub fn with_params(mut self, params: ActionParams) -> Self {
        self.params = params;
        self
    }

    /// Returns a job with the given local variables.
    pub fn with_vars(mut self, vars: Vars) -> Self {
        self.vars = vars;
        self
    }

    /// Returns a job that does not block its caller.
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Returns a job with a start delay in milliseconds.
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay = Period(ms);
        self
    }

    /// Returns a job with a deadline in milliseconds.
    pub fn with_deadline(mut self, ms: u64) -> Self {
        self.deadline = Period(ms);
        self
    }

    /// Returns a job guarded by a shell condition.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    /// Returns a job with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Checks if description is available.
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }

    /// Returns the description, or the first non-empty of action, task and
    /// mixin name. Empty if none is set.
    pub fn format_description(&self) -> &str {
        if self.has_description() {
            return &self.description;
        }

        [&self.action_name, &self.task_name, &self.mixin_name]
            .into_iter()
            .find(|v| !v.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Returns the job execution type.
    pub fn exec_type(&self) -> JobExecType {
        if !self.action_name.is_empty() {
            JobExecType::Action
        } else if !self.mixin_name.is_empty() {
            JobExecType::Mixin
        } else if !self.task_name.is_empty() {
            JobExecType::Task
        } else {
            JobExecType::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(action: &str, mixin: &str, task: &str) -> Job {
        Job {
            action_name: action.into(),
            mixin_name: mixin.into(),
            task_name: task.into(),
            ..Job::default()
        }
    }

    #[test]
    fn test_exec_type_single_name() {
        assert_eq!(job("a", "", "").exec_type(), JobExecType::Action);
        assert_eq!(job("", "m", "").exec_type(), JobExecType::Mixin);
        assert_eq!(job("", "", "t").exec_type(), JobExecType::Task);
        assert_eq!(job("", "", "").exec_type(), JobExecType::Empty);
    }

    #[test]
    fn test_exec_type_precedence() {
        assert_eq!(job("a", "m", "t").exec_type(), JobExecType::Action);
        assert_eq!(job("a", "", "t").exec_type(), JobExecType::Action);
        assert_eq!(job("", "m", "t").exec_type(), JobExecType::Mixin);
    }

    #[test]
    fn test_format_description_fallback() {
        let mut j = job("a", "m", "t");
        j.description = "explicit".into();
        assert_eq!(j.format_description(), "explicit");

        assert_eq!(job("a", "m", "t").format_description(), "a");
        // task wins over mixin in the description fallback
        assert_eq!(job("", "m", "t").format_description(), "t");
        assert_eq!(job("", "m", "").format_description(), "m");
        assert_eq!(job("", "", "").format_description(), "");
    }

    #[test]
    fn test_zero_periods_are_not_serialized() {
        let value = serde_json::to_value(Job::action("sleep").with_delay(100)).unwrap();
        assert_eq!(value, serde_json::json!({ "action": "sleep", "delay": 100 }));
    }

    #[test]
    fn test_deserialize_manifest_keys() {
        let j: Job = serde_json::from_value(serde_json::json!({
            "if": "test -f Cargo.toml",
            "run": "build",
            "deadline": 2500,
            "vars": { "target": "release" }
        }))
        .unwrap();

        assert_eq!(j.condition, "test -f Cargo.toml");
        assert_eq!(j.exec_type(), JobExecType::Task);
        assert_eq!(j.deadline.to_duration(), Duration::from_millis(2500));
        assert_eq!(j.vars.get("target").map(String::as_str), Some("release"));
        assert!(!j.is_async);
        assert!(j.delay.is_zero());
    }
}
