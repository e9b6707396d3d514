//! The engine task.
//!
//! A single task owns the [`Console`]. Commands arrive over a channel and
//! are applied strictly between ticks; the tick loop measures the time
//! that really passed since the previous tick so late wake-ups never
//! stretch a fade.

use crate::console::Console;
use crate::events::{SubscriberId, SubscriberRegistry};
use cuelight_types::api::ErrorResponse;
use cuelight_types::{ConsoleCommand, ConsoleEvent};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Depth of the command queue.
const COMMAND_QUEUE_SIZE: usize = 256;

/// The engine task has stopped.
#[derive(Debug, Error)]
#[error("Engine is not running")]
pub struct EngineUnavailable;

/// Where the payloads of a command go.
#[derive(Debug)]
enum Origin {
    /// Broadcast to every subscriber.
    Broadcast,
    /// Broadcast, with a rejection reported back to this subscriber only.
    Session(SubscriberId),
    /// Returned to the caller only.
    Reply(oneshot::Sender<Vec<ConsoleEvent>>),
}

#[derive(Debug)]
struct EngineRequest {
    command: ConsoleCommand,
    origin: Origin,
}

/// Cloneable handle for sending commands to the engine task.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Queue a command whose payloads are broadcast to all subscribers.
    pub async fn submit(&self, command: ConsoleCommand) -> Result<(), EngineUnavailable> {
        self.send(command, Origin::Broadcast).await
    }

    /// Like [`submit`](Self::submit), but an error payload goes back to
    /// `subscriber` if the command is rejected.
    pub async fn submit_from(
        &self,
        subscriber: SubscriberId,
        command: ConsoleCommand,
    ) -> Result<(), EngineUnavailable> {
        self.send(command, Origin::Session(subscriber)).await
    }

    async fn send(&self, command: ConsoleCommand, origin: Origin) -> Result<(), EngineUnavailable> {
        self.tx
            .send(EngineRequest { command, origin })
            .await
            .map_err(|_| EngineUnavailable)
    }

    /// Apply a command and return its payloads without broadcasting them.
    pub async fn query(&self, command: ConsoleCommand) -> Result<Vec<ConsoleEvent>, EngineUnavailable> {
        let (reply, rx) = oneshot::channel();
        self.send(command, Origin::Reply(reply)).await?;
        rx.await.map_err(|_| EngineUnavailable)
    }
}

/// Spawn the engine task. It runs until every [`EngineHandle`] is dropped.
pub fn spawn(
    console: Console,
    subscribers: SubscriberRegistry,
    tick_interval: Duration,
) -> (EngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_SIZE);
    let scheduler = Scheduler {
        console,
        requests: rx,
        subscribers,
        tick_interval,
    };
    let task = tokio::spawn(scheduler.run());
    (EngineHandle { tx }, task)
}

fn rejection(kind: &str, error: &impl std::fmt::Display) -> ConsoleEvent {
    ConsoleEvent::Error(ErrorResponse::with_details(
        format!("Rejected {}", kind),
        error.to_string(),
    ))
}

struct Scheduler {
    console: Console,
    requests: mpsc::Receiver<EngineRequest>,
    subscribers: SubscriberRegistry,
    tick_interval: Duration,
}

impl Scheduler {
    async fn run(mut self) {
        info!(
            tick_interval_ms = self.tick_interval.as_millis() as u64,
            "Engine started"
        );

        let mut ticker = time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                request = self.requests.recv() => {
                    match request {
                        Some(request) => self.handle(request).await,
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let elapsed = now - last_tick;
                    last_tick = now;

                    let events = self.console.tick(elapsed);
                    self.publish(&events).await;
                }
            }
        }

        info!("Engine stopped");
    }

    async fn handle(&mut self, request: EngineRequest) {
        let EngineRequest { command, origin } = request;
        let kind = command.kind();

        let result = self.console.apply(command);
        if let Err(e) = &result {
            warn!(kind, "Command failed: {}", e);
        }

        match (origin, result) {
            (Origin::Broadcast | Origin::Session(_), Ok(events)) => self.publish(&events).await,
            (Origin::Broadcast, Err(_)) => {}
            (Origin::Session(subscriber), Err(e)) => {
                let event = rejection(kind, &e);
                if !self.subscribers.send_to(subscriber, &event).await {
                    debug!(kind, %subscriber, "Session gone before its error was reported");
                }
            }
            (Origin::Reply(reply), result) => {
                let events = result.unwrap_or_else(|e| vec![rejection(kind, &e)]);
                if reply.send(events).is_err() {
                    debug!(kind, "Query caller went away");
                }
            }
        }
    }

    async fn publish(&self, events: &[ConsoleEvent]) {
        for event in events {
            self.subscribers.broadcast(event).await;
        }
    }
}
