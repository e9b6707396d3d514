//! Application state management.

use crate::config::Config;
use crate::console::Console;
use crate::events::SubscriberRegistry;
use crate::scheduler::{self, EngineHandle};
use crate::transmitter::Transmitter;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Command channel into the engine task
    engine: EngineHandle,
    /// Outbound event subscribers (WebSocket sessions)
    subscribers: SubscriberRegistry,
}

impl AppState {
    /// Wrap an already running engine.
    pub fn new(engine: EngineHandle, subscribers: SubscriberRegistry) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                engine,
                subscribers,
            }),
        }
    }

    /// Spawn the engine task for `config` and build the state around it.
    ///
    /// Must be called from within a tokio runtime. The engine task ends once
    /// the last clone of the returned state is dropped.
    pub fn spawn(config: &Config, transmitter: Box<dyn Transmitter>) -> (Self, JoinHandle<()>) {
        let subscribers = SubscriberRegistry::default();
        let console = Console::new(config.universe_size, transmitter);
        let (engine, task) = scheduler::spawn(console, subscribers.clone(), config.tick_interval);
        (Self::new(engine, subscribers), task)
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.inner.engine
    }

    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.inner.subscribers
    }
}
