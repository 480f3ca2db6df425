//! Host key stream → decoder → single registered consumer.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use stockscan_core::{Clock, Sku};

use crate::decoder::{DecoderConfig, ScanDecoder};
use crate::key::{HostKeyEvent, KeyEvent, KeyOrigin};

type ScanConsumer = Box<dyn FnMut(&Sku) + Send>;

/// What the host should do with the key it just delivered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyDisposition {
    /// Suppress the host's default action (page scroll, form submit).
    pub prevent_default: bool,
    /// SKU completed by this key, already handed to the consumer.
    pub decoded: Option<Sku>,
}

#[derive(Default)]
struct ConsumerSlot {
    generation: u64,
    consumer: Option<ScanConsumer>,
}

/// Registration of the active scan consumer.
///
/// Dropping the guard unregisters the consumer, unless a newer registration has
/// already replaced it.
#[must_use = "dropping the guard unregisters the consumer"]
pub struct ConsumerGuard {
    slot: Arc<Mutex<ConsumerSlot>>,
    generation: u64,
}

impl core::fmt::Debug for ConsumerGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConsumerGuard")
            .field("generation", &self.generation)
            .finish()
    }
}

impl ConsumerGuard {
    /// Whether this registration still receives scans.
    pub fn is_active(&self) -> bool {
        match self.slot.lock() {
            Ok(slot) => slot.generation == self.generation && slot.consumer.is_some(),
            Err(_) => false,
        }
    }
}

impl Drop for ConsumerGuard {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            if slot.generation == self.generation {
                slot.consumer = None;
            }
        }
    }
}

/// Filters host key events, drives the decoder and forwards decoded SKUs.
///
/// Exactly one consumer receives scans at a time; registering a new one
/// replaces the previous registration and starts a fresh burst.
pub struct ScanSource<C> {
    decoder: ScanDecoder,
    clock: C,
    slot: Arc<Mutex<ConsumerSlot>>,
}

impl<C> core::fmt::Debug for ScanSource<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScanSource")
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}

impl<C: Clock> ScanSource<C> {
    pub fn new(config: DecoderConfig, clock: C) -> Self {
        Self {
            decoder: ScanDecoder::new(config),
            clock,
            slot: Arc::new(Mutex::new(ConsumerSlot::default())),
        }
    }

    pub fn decoder(&self) -> &ScanDecoder {
        &self.decoder
    }

    /// Make `consumer` the only receiver of decoded SKUs.
    pub fn register_consumer<F>(&mut self, consumer: F) -> ConsumerGuard
    where
        F: FnMut(&Sku) + Send + 'static,
    {
        self.decoder.reset();

        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.consumer.is_some() {
            debug!(generation = slot.generation, "replacing scan consumer");
        }
        slot.generation += 1;
        slot.consumer = Some(Box::new(consumer));

        ConsumerGuard {
            slot: Arc::clone(&self.slot),
            generation: slot.generation,
        }
    }

    /// Run one host key event through the filter and decoder.
    pub fn handle(&mut self, event: HostKeyEvent) -> KeyDisposition {
        if event.origin == KeyOrigin::TextEntry {
            return KeyDisposition::default();
        }

        let prevent_default = event.key.suppresses_default();
        let stamped = KeyEvent::new(event.key, self.clock.now());
        let decoded = self.decoder.feed(&stamped);

        if let Some(sku) = &decoded {
            self.dispatch(sku);
        }

        KeyDisposition {
            prevent_default,
            decoded,
        }
    }

    fn dispatch(&self, sku: &Sku) {
        // Take the consumer out so it may re-register without deadlocking.
        let (generation, consumer) = match self.slot.lock() {
            Ok(mut slot) => (slot.generation, slot.consumer.take()),
            Err(_) => {
                warn!("scan consumer slot poisoned; dropping scan");
                return;
            }
        };

        let Some(mut consumer) = consumer else {
            debug!(sku = %sku, "scan decoded with no consumer registered");
            return;
        };

        consumer(sku);

        if let Ok(mut slot) = self.slot.lock() {
            if slot.generation == generation && slot.consumer.is_none() {
                slot.consumer = Some(consumer);
            }
        }
    }
}
