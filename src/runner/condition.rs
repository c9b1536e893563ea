//! # Job conditions.
//!
//! A condition is a shell expression: the job runs only if it exits with
//! status 0.
//!
//! ```text
//! {{ var }} expanded ──► <shell> <shell_flag> "<expr>"
//!                          env = Scope::environ_pairs()
//!                          cwd = project directory (if set)
//!   exit 0         → run job
//!   exit != 0      → skip
//!   spawn failure  → skip (logged)
//! ```

use std::process::Stdio;

use tokio::process::Command;
use tracing::Span;

use crate::config::RunnerConfig;
use crate::scope::Scope;

/// Evaluates an already expanded condition.
///
/// Returns `true` if the job should run.
pub(crate) async fn holds(cfg: &RunnerConfig, scope: &Scope, expr: &str, log: &Span) -> bool {
    let mut cmd = Command::new(&cfg.shell);
    cmd.arg(&cfg.shell_flag)
        .arg(expr)
        .env_clear()
        .envs(scope.environ_pairs())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let dir = &scope.environment().project_directory;
    if !dir.as_os_str().is_empty() {
        cmd.current_dir(dir);
    }

    match cmd.status().await {
        Ok(status) if status.success() => true,
        Ok(status) => {
            tracing::debug!(parent: log, condition = expr, code = status.code(), "condition not met");
            false
        }
        Err(e) => {
            tracing::warn!(parent: log, condition = expr, error = %e, "condition failed to start");
            false
        }
    }
}
