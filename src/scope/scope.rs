//! # Scope: layered variable resolution.
//!
//! A [`Scope`] holds global and local variables plus the project environment.
//! It is immutable: [`Scope::append_variables`] and [`Scope::append_globals`]
//! return a new scope layered over the current one. Jobs running in parallel
//! each get their own forked scope and never need locking.
//!
//! ## Example
//! ```rust
//! use jobvisor::{Scope, Vars};
//!
//! let globals: Vars = [("x".to_string(), "g".to_string())].into();
//! let locals: Vars = [("x".to_string(), "local".to_string())].into();
//!
//! let scope = Scope::default().append_globals(globals);
//! let job_scope = scope.append_variables(locals);
//!
//! assert_eq!(job_scope.var("x"), Some((true, "local")));
//! assert_eq!(scope.var("x"), Some((false, "g")));
//! assert_eq!(job_scope.expand_variables("x={{ x }}").unwrap(), "x=local");
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::JobError;
use crate::scope::Vars;
use crate::scope::expand::expand;
use crate::scope::layers::Layers;

/// Information about the project a scope belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectEnvironment {
    /// Root directory of the project (where the manifest lives).
    pub project_directory: PathBuf,
}

/// Set of globals and variables related to a specific job.
#[derive(Clone, Default)]
pub struct Scope {
    globals: Layers,
    locals: Layers,
    environment: Arc<ProjectEnvironment>,
}

impl Scope {
    /// Creates an empty scope for the given project.
    pub fn new(environment: ProjectEnvironment) -> Self {
        Self {
            globals: Layers::default(),
            locals: Layers::default(),
            environment: Arc::new(environment),
        }
    }

    /// Returns a new scope with `vars` layered over the local variables.
    #[must_use]
    pub fn append_variables(&self, vars: Vars) -> Self {
        Self {
            globals: self.globals.clone(),
            locals: self.locals.push(vars),
            environment: Arc::clone(&self.environment),
        }
    }

    /// Returns a new scope with `vars` layered over the global variables.
    #[must_use]
    pub fn append_globals(&self, vars: Vars) -> Self {
        Self {
            globals: self.globals.push(vars),
            locals: self.locals.clone(),
            environment: Arc::clone(&self.environment),
        }
    }

    /// Returns a global variable value by its name.
    pub fn global(&self, name: &str) -> Option<&str> {
        self.globals.get(name)
    }

    /// Returns a variable value by its name, locals first.
    ///
    /// The flag is `true` when the value came from a local binding.
    pub fn var(&self, name: &str) -> Option<(bool, &str)> {
        if let Some(v) = self.locals.get(name) {
            return Some((true, v));
        }
        self.globals.get(name).map(|v| (false, v))
    }

    /// Returns all declared local variables.
    pub fn vars(&self) -> Vars {
        self.locals.flatten()
    }

    /// Returns all declared global variables.
    pub fn globals(&self) -> Vars {
        self.globals.flatten()
    }

    /// Expands every `{{ name }}` reference in `expression`.
    ///
    /// Unresolved names yield [`JobError::UnresolvedVariable`].
    pub fn expand_variables(&self, expression: &str) -> Result<String, JobError> {
        expand(expression, |name| self.var(name).map(|(_, v)| v))
    }

    /// Expands each value in place.
    ///
    /// Stops at the first error; values before it stay expanded.
    ///
    /// ```rust
    /// use jobvisor::{Scope, Vars};
    ///
    /// let scope = Scope::default().append_variables(Vars::from([("v".into(), "1".into())]));
    /// let (mut a, mut b) = ("{{ v }}".to_string(), "v{{v}}".to_string());
    /// scope.scan(&mut [&mut a, &mut b]).unwrap();
    /// assert_eq!((a.as_str(), b.as_str()), ("1", "v1"));
    /// ```
    pub fn scan(&self, values: &mut [&mut String]) -> Result<(), JobError> {
        for value in values.iter_mut() {
            let expanded = self.expand_variables(value.as_str())?;
            **value = expanded;
        }
        Ok(())
    }

    /// Expands the values of `vars` against this scope.
    pub fn expand_vars(&self, vars: &Vars) -> Result<Vars, JobError> {
        vars.iter()
            .map(|(k, v)| Ok((k.clone(), self.expand_variables(v)?)))
            .collect()
    }

    /// Returns information about the project environment.
    pub fn environment(&self) -> &ProjectEnvironment {
        &self.environment
    }

    /// Returns OS environment variables merged with globals.
    ///
    /// Globals replace OS variables of the same name. Non-unicode OS entries
    /// are skipped.
    pub fn environ_pairs(&self) -> Vec<(String, String)> {
        let globals = self.globals();
        let mut env: Vec<(String, String)> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .filter(|(k, _)| !globals.contains_key(k))
            .collect();
        env.extend(globals);
        env
    }

    /// Returns OS environment variables merged with globals as `KEY=VALUE`
    /// strings, ready for process spawning APIs.
    pub fn environ(&self) -> Vec<String> {
        self.environ_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("globals", &self.globals())
            .field("locals", &self.vars())
            .field("environment", &self.environment)
            .finish()
    }
}
