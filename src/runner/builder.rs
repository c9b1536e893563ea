use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::actions::Registry;
use crate::config::RunnerConfig;
use crate::events::Bus;
use crate::scope::Scope;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::inflight::InFlight;
use super::runner::{Inner, Runner};
use super::tasks::{TaskSet, TaskSource};

/// Builder for constructing a [`Runner`].
pub struct RunnerBuilder {
    cfg: RunnerConfig,
    registry: Registry,
    tasks: Arc<dyn TaskSource>,
    scope: Scope,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RunnerBuilder {
    /// Creates a new builder with the given configuration, no actions and no tasks.
    pub fn new(cfg: RunnerConfig) -> Self {
        Self {
            cfg,
            registry: Registry::new(),
            tasks: Arc::new(TaskSet::new()),
            scope: Scope::default(),
            subscribers: Vec::new(),
        }
    }

    /// Sets the action registry.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the source of task definitions.
    pub fn with_tasks(mut self, tasks: impl TaskSource) -> Self {
        self.tasks = Arc::new(tasks);
        self
    }

    /// Sets the root scope (globals, project environment).
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive job lifecycle events through dedicated workers
    /// with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the runner.
    ///
    /// Must be called inside a Tokio runtime when subscribers are set.
    pub fn build(self) -> Runner {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener_stop = CancellationToken::new();

        let listener = if self.subscribers.is_empty() {
            None
        } else {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            Some(spawn_listener(set, &bus, listener_stop.clone()))
        };

        let inner = Arc::new(Inner {
            cfg: self.cfg,
            registry: self.registry,
            tasks: self.tasks,
            bus,
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            inflight: InFlight::default(),
            listener_stop,
            listener: Mutex::new(listener),
        });
        Runner::new_internal(inner, self.scope)
    }
}

/// Forwards bus events to the subscriber set until `stop` fires, then drains
/// what is already queued and shuts the set down.
fn spawn_listener(
    set: SubscriberSet,
    bus: &Bus,
    stop: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                ev = rx.recv() => match ev {
                    Ok(ev) => set.emit(ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    while let Ok(ev) = rx.try_recv() {
                        set.emit(ev);
                    }
                    break;
                }
            }
        }
        set.shutdown().await;
    })
}
