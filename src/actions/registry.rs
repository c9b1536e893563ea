//! # Action registry.
//!
//! Maps unique names to [`ActionFactory`] constructors. Actions and mixins
//! live in separate namespaces; plugins contribute actions under
//! `"<plugin>:<action>"` names.
//!
//! ```text
//! Job { action: "docker:build", params } ──► Registry::action("docker:build")
//!                                               └─► factory(scope, params, span) ──► HandlerRef
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::Span;

use crate::actions::handler::HandlerRef;
use crate::error::JobError;
use crate::jobs::ActionParams;
use crate::scope::Scope;

/// Action handler constructor.
///
/// Receives the job's scope, its raw params and the job span as logger.
pub type ActionFactory =
    Arc<dyn Fn(Scope, ActionParams, Span) -> Result<HandlerRef, JobError> + Send + Sync>;

/// Actions map: action name → constructor.
pub type Actions = HashMap<String, ActionFactory>;

/// Named set of actions provided by one plugin.
#[derive(Clone, Default)]
pub struct Plugin {
    /// Plugin name, used as the action name prefix.
    pub name: String,
    /// Actions provided by the plugin.
    pub actions: Actions,
}

impl Plugin {
    /// Creates a plugin without actions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Actions::new(),
        }
    }

    /// Returns the plugin with one more action.
    pub fn with_action<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Scope, ActionParams, Span) -> Result<HandlerRef, JobError> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(factory));
        self
    }
}

/// Name → constructor registry for actions and mixins.
#[derive(Clone, Default)]
pub struct Registry {
    actions: Actions,
    mixins: Actions,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action constructor under a unique name.
    pub fn register_action<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), JobError>
    where
        F: Fn(Scope, ActionParams, Span) -> Result<HandlerRef, JobError> + Send + Sync + 'static,
    {
        insert_unique(&mut self.actions, name.into(), Arc::new(factory))
    }

    /// Registers a mixin constructor under a unique name.
    pub fn register_mixin<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), JobError>
    where
        F: Fn(Scope, ActionParams, Span) -> Result<HandlerRef, JobError> + Send + Sync + 'static,
    {
        insert_unique(&mut self.mixins, name.into(), Arc::new(factory))
    }

    /// Registers every plugin action as `"<plugin>:<action>"`.
    ///
    /// Nothing is registered if any of the names is already taken.
    pub fn import_plugin(&mut self, plugin: Plugin) -> Result<(), JobError> {
        let qualified: Vec<(String, ActionFactory)> = plugin
            .actions
            .into_iter()
            .map(|(action, factory)| (format!("{}:{}", plugin.name, action), factory))
            .collect();

        if let Some((name, _)) = qualified.iter().find(|(n, _)| self.actions.contains_key(n)) {
            return Err(JobError::DuplicateAction { name: name.clone() });
        }
        self.actions.extend(qualified);
        Ok(())
    }

    /// Returns the action constructor registered under `name`.
    pub fn action(&self, name: &str) -> Result<ActionFactory, JobError> {
        self.actions
            .get(name)
            .cloned()
            .ok_or_else(|| JobError::UnknownAction {
                name: name.to_string(),
            })
    }

    /// Returns the mixin constructor registered under `name`.
    pub fn mixin(&self, name: &str) -> Result<ActionFactory, JobError> {
        self.mixins
            .get(name)
            .cloned()
            .ok_or_else(|| JobError::UnknownMixin {
                name: name.to_string(),
            })
    }

    /// Returns sorted list of registered action names.
    pub fn action_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

fn insert_unique(map: &mut Actions, name: String, factory: ActionFactory) -> Result<(), JobError> {
    if map.contains_key(&name) {
        return Err(JobError::DuplicateAction { name });
    }
    map.insert(name, factory);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::HandlerFn;

    fn noop(_: Scope, _: ActionParams, _: Span) -> Result<HandlerRef, JobError> {
        Ok(HandlerFn::arc(|_ctx| async { Ok(()) }))
    }

    #[test]
    fn test_lookup_and_unknown_names() {
        let mut reg = Registry::new();
        reg.register_action("echo", noop).unwrap();
        reg.register_mixin("lint", noop).unwrap();

        assert!(reg.action("echo").is_ok());
        assert!(reg.mixin("lint").is_ok());
        assert!(matches!(
            reg.action("lint"),
            Err(JobError::UnknownAction { name }) if name == "lint"
        ));
        assert!(matches!(
            reg.mixin("echo"),
            Err(JobError::UnknownMixin { name }) if name == "echo"
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut reg = Registry::new();
        reg.register_action("echo", noop).unwrap();
        assert_eq!(
            reg.register_action("echo", noop).unwrap_err(),
            JobError::DuplicateAction {
                name: "echo".into()
            }
        );
    }

    #[test]
    fn test_import_plugin_prefixes_names() {
        let mut reg = Registry::new();
        reg.register_action("go:build", noop).unwrap();

        let plugin = Plugin::new("go").with_action("test", noop);
        reg.import_plugin(plugin).unwrap();
        assert_eq!(reg.action_names(), vec!["go:build", "go:test"]);

        let clash = Plugin::new("go").with_action("build", noop).with_action("vet", noop);
        assert!(reg.import_plugin(clash).is_err());
        assert_eq!(reg.action_names(), vec!["go:build", "go:test"]);
    }

    #[test]
    fn test_factory_params_errors_surface() {
        #[derive(serde::Deserialize)]
        #[allow(dead_code)]
        struct Needs {
            path: String,
        }

        let mut reg = Registry::new();
        reg.register_action("needs", |_scope, params: ActionParams, _log| {
            let _cfg: Needs = params.unmarshal()?;
            noop(Scope::default(), ActionParams::new(), Span::none())
        })
        .unwrap();

        let factory = reg.action("needs").unwrap();
        let err = factory(Scope::default(), ActionParams::new(), Span::none()).err();
        assert!(matches!(err, Some(JobError::Params { .. })));
    }
}
