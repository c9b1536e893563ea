//! # Runner configuration.
//!
//! Provides [`RunnerConfig`] centralized settings for the job runner.
//!
//! ## Sentinel values
//! - `default_deadline = 0s` → jobs without their own deadline run unbounded
//! - `max_depth = 0` → task nesting is not limited
//! - `grace = 0s` → a cancelled handler's `call` is abandoned immediately

use std::time::Duration;

/// Global configuration for the job runner.
///
/// ## Field semantics
/// - `grace`: how long a cancelled `call` may keep running before it is dropped;
///   also bounds [`Runner::shutdown`](crate::Runner::shutdown)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `default_deadline`: deadline applied to jobs that declare none (`0s` = none)
/// - `max_depth`: maximum task nesting (`0` = unlimited)
/// - `shell` / `shell_flag`: interpreter used for job conditions
///
/// All fields are public; prefer the helper accessors over sentinel checks.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Maximum time to wait for a cancelled handler to return from `call`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Deadline for jobs that do not declare one.
    pub default_deadline: Duration,

    /// Maximum nesting of task-in-task execution.
    pub max_depth: usize,

    /// Shell program used to evaluate job conditions.
    pub shell: String,

    /// Flag passing the condition string to [`RunnerConfig::shell`].
    pub shell_flag: String,
}

impl RunnerConfig {
    /// Returns the default job deadline as an `Option`.
    #[inline]
    pub fn default_deadline(&self) -> Option<Duration> {
        if self.default_deadline == Duration::ZERO {
            None
        } else {
            Some(self.default_deadline)
        }
    }

    /// Returns the nesting limit as an `Option`.
    #[inline]
    pub fn depth_limit(&self) -> Option<usize> {
        if self.max_depth == 0 {
            None
        } else {
            Some(self.max_depth)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for RunnerConfig {
    /// Default configuration:
    ///
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `default_deadline = 0s` (none)
    /// - `max_depth = 32`
    /// - `shell = "sh"`, `shell_flag = "-c"`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            default_deadline: Duration::ZERO,
            max_depth: 32,
            shell: "sh".to_string(),
            shell_flag: "-c".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let mut cfg = RunnerConfig::default();
        assert_eq!(cfg.default_deadline(), None);
        assert_eq!(cfg.depth_limit(), Some(32));

        cfg.max_depth = 0;
        cfg.bus_capacity = 0;
        cfg.default_deadline = Duration::from_millis(250);
        assert_eq!(cfg.depth_limit(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.default_deadline(), Some(Duration::from_millis(250)));
    }
}
