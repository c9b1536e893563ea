//! # Task definitions.
//!
//! The runner looks tasks up by name through a [`TaskSource`]. Manifest loaders
//! implement it on their own types; [`TaskSet`] is the in-memory variant.

use std::collections::HashMap;

use crate::jobs::Job;

/// Provides the jobs of a named task.
pub trait TaskSource: Send + Sync + 'static {
    /// Returns the jobs of task `name` in declaration order.
    fn task(&self, name: &str) -> Option<Vec<Job>>;
}

/// In-memory task definitions.
#[derive(Clone, Debug, Default)]
pub struct TaskSet {
    tasks: HashMap<String, Vec<Job>>,
}

impl TaskSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set with task `name` defined as `jobs`.
    ///
    /// Redefining a task replaces its jobs.
    pub fn with_task(mut self, name: impl Into<String>, jobs: Vec<Job>) -> Self {
        self.insert(name, jobs);
        self
    }

    /// Defines task `name` as `jobs`.
    pub fn insert(&mut self, name: impl Into<String>, jobs: Vec<Job>) {
        self.tasks.insert(name.into(), jobs);
    }

    /// Returns the number of defined tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` when no task is defined.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskSource for TaskSet {
    fn task(&self, name: &str) -> Option<Vec<Job>> {
        self.tasks.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_keeps_job_order() {
        let set = TaskSet::new()
            .with_task("build", vec![Job::action("fmt"), Job::action("compile")])
            .with_task("noop", vec![]);

        let jobs = set.task("build").unwrap();
        let names: Vec<&str> = jobs.iter().map(|j| j.action_name.as_str()).collect();
        assert_eq!(names, ["fmt", "compile"]);
        assert_eq!(set.task("noop").map(|j| j.len()), Some(0));
        assert!(set.task("deploy").is_none());
        assert_eq!(set.len(), 2);
    }
}
