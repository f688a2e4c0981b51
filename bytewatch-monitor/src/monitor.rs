//! Single-writer monitor task.
//!
//! The accumulator lives on one tokio task and drains a command queue in
//! order. Producers (the feed reader, the CLI) only hold a cheap
//! [`MonitorHandle`].

use bytewatch_core::{Clock, NetworkObservation, UsageCounters};
use bytewatch_store::KeyValueStore;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::accumulator::UsageAccumulator;
use crate::bus::{Message, MessageBus, Request, Response, respond};
use crate::error::MonitorError;

/// Commands buffered before producers wait.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Work item for the monitor task.
#[derive(Debug)]
pub enum Command {
    /// Account one observation.
    Observe(NetworkObservation),
    /// Liveness probe.
    Ping(oneshot::Sender<Response>),
    /// Read the current counters.
    Snapshot(oneshot::Sender<UsageCounters>),
    /// Manual reset.
    Reset(oneshot::Sender<UsageCounters>),
    /// Flush and stop.
    Shutdown,
}

/// Cloneable handle to a running monitor.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<Command>,
    bus: MessageBus,
}

impl MonitorHandle {
    /// Queues an observation.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Closed` if the task has stopped.
    pub async fn observe(&self, observation: NetworkObservation) -> Result<(), MonitorError> {
        self.tx.send(Command::Observe(observation)).await?;
        Ok(())
    }

    /// Sends a subscriber request and waits for the reply.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Closed` if the task has stopped.
    pub async fn request(&self, request: Request) -> Result<Response, MonitorError> {
        match request {
            Request::Ping => {
                let (reply, rx) = oneshot::channel();
                self.tx.send(Command::Ping(reply)).await?;
                Ok(rx.await?)
            }
        }
    }

    /// Pings the task.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Closed` if the task has stopped.
    pub async fn ping(&self) -> Result<Response, MonitorError> {
        self.request(Request::Ping).await
    }

    /// Counters after every queued command ahead of this one.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Closed` if the task has stopped.
    pub async fn snapshot(&self) -> Result<UsageCounters, MonitorError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Snapshot(reply)).await?;
        Ok(rx.await?)
    }

    /// Zeroes the counters.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Closed` if the task has stopped.
    pub async fn reset(&self) -> Result<UsageCounters, MonitorError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Reset(reply)).await?;
        Ok(rx.await?)
    }

    /// Asks the task to flush and stop after the queued commands.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Closed` if the task has already stopped.
    pub async fn shutdown(&self) -> Result<(), MonitorError> {
        self.tx.send(Command::Shutdown).await?;
        Ok(())
    }

    /// Opens a push-update receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.bus.subscribe()
    }

    /// The bus this monitor publishes to.
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }
}

/// Spawns the monitor task.
///
/// The task runs the startup rollover, then handles commands until
/// [`Command::Shutdown`] or until every handle is dropped.
pub fn spawn<S, C>(accumulator: UsageAccumulator<S, C>) -> (MonitorHandle, JoinHandle<()>)
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    spawn_with_capacity(accumulator, DEFAULT_QUEUE_CAPACITY)
}

/// Spawns the monitor task with a custom queue size.
pub fn spawn_with_capacity<S, C>(
    accumulator: UsageAccumulator<S, C>,
    capacity: usize,
) -> (MonitorHandle, JoinHandle<()>)
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = MonitorHandle {
        tx,
        bus: accumulator.bus().clone(),
    };
    let task = tokio::spawn(run(accumulator, rx));
    (handle, task)
}

async fn run<S: KeyValueStore, C: Clock>(
    accumulator: UsageAccumulator<S, C>,
    mut rx: mpsc::Receiver<Command>,
) {
    let counters = accumulator.start().await;
    info!(daily = counters.daily, "Monitor started");

    let mut observed: u64 = 0;
    while let Some(command) = rx.recv().await {
        match command {
            Command::Observe(observation) => {
                if accumulator.handle(&observation).await.is_some() {
                    observed += 1;
                }
            }
            Command::Ping(reply) => {
                let _ = reply.send(respond(Request::Ping));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(accumulator.snapshot().await);
            }
            Command::Reset(reply) => {
                let _ = reply.send(accumulator.reset().await);
            }
            Command::Shutdown => {
                debug!("Shutdown requested");
                break;
            }
        }
    }

    if let Err(e) = accumulator.store().flush().await {
        warn!(error = %e, "Usage record still unsaved at shutdown");
    }
    info!(observed, "Monitor stopped");
}
