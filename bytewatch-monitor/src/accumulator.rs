//! Usage accumulator.
//!
//! Wires estimates into the counter store and pushes every change to the
//! bus. The rollover check is folded into the same store transaction as the
//! increment, so a counter is never bumped after its period ended.

use std::sync::Arc;

use bytewatch_core::{Clock, NetworkObservation, UsageCounters, estimate};
use bytewatch_store::{CounterStore, KeyValueStore};
use tracing::{debug, trace};

use crate::bus::MessageBus;

/// Orchestrates estimator, store and bus.
pub struct UsageAccumulator<S: KeyValueStore, C: Clock> {
    store: Arc<CounterStore<S>>,
    clock: C,
    bus: MessageBus,
}

impl<S: KeyValueStore, C: Clock> UsageAccumulator<S, C> {
    /// Creates an accumulator.
    pub fn new(store: Arc<CounterStore<S>>, clock: C, bus: MessageBus) -> Self {
        Self { store, clock, bus }
    }

    /// Startup check: rolls persisted counters over to today and broadcasts
    /// the corrected snapshot.
    pub async fn start(&self) -> UsageCounters {
        let today = self.clock.today();
        let (counters, archived) = self.store.apply_rollover(today).await;
        if let Some(entry) = archived {
            debug!(date = %entry.date, usage = entry.usage, "Archived day on startup");
        }
        self.bus.publish_usage(counters);
        counters
    }

    /// Accounts one observation.
    ///
    /// Returns `None` when the estimate is zero; nothing is written or
    /// broadcast in that case.
    pub async fn handle(&self, observation: &NetworkObservation) -> Option<UsageCounters> {
        let bytes = estimate(observation);
        if bytes == 0 {
            trace!(url = %observation.url, "Zero-byte observation skipped");
            return None;
        }
        trace!(url = %observation.url, category = %observation.category, bytes, "Observation");
        Some(self.record_bytes(bytes).await)
    }

    /// Adds an already-estimated byte count.
    pub async fn record_bytes(&self, bytes: u64) -> UsageCounters {
        let counters = self.store.observe(self.clock.today(), bytes).await;
        self.bus.publish_usage(counters);
        counters
    }

    /// Manual reset. History is kept.
    pub async fn reset(&self) -> UsageCounters {
        let counters = self.store.reset_all(self.clock.today()).await;
        self.bus.publish_usage(counters);
        counters
    }

    /// Current counters without touching the store.
    pub async fn snapshot(&self) -> UsageCounters {
        self.store.snapshot().await
    }

    /// The counter store.
    pub fn store(&self) -> &Arc<CounterStore<S>> {
        &self.store
    }

    /// The bus updates go to.
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }
}
