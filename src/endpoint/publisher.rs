use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    codec::Envelope,
    error::{BindError, SendError},
    transport::{self, Hub},
};

/// Default outbound high-water-mark. Tunable, see `Settings`.
pub const DEFAULT_SEND_HWM: usize = 1000;

enum PublisherState {
    Unbound,
    Bound {
        address: Arc<str>,
        hub: Arc<Hub>,
        queue: mpsc::Sender<Envelope>,
    },
    Closed,
}

/// Publisher endpoint: owns one bound address and emits topic-tagged
/// envelopes to it.
///
/// `send` never blocks. Envelopes go into a bounded outbound queue of
/// `send_hwm` entries drained by a pump task; when the queue is full the
/// new envelope is dropped, `dropped_count` is bumped and `send` still
/// returns `Ok` — deterministic drop-newest under overload.
pub struct Publisher {
    send_hwm: usize,
    state: PublisherState,
    /// Envelopes dropped because the outbound queue was full.
    pub dropped_count: Arc<AtomicUsize>,
}

impl Publisher {
    pub fn new() -> Self {
        Self::with_high_water_mark(DEFAULT_SEND_HWM)
    }

    /// Sets the outbound high-water-mark. The mark takes effect at `bind`,
    /// so configure before traffic starts.
    pub fn with_high_water_mark(send_hwm: usize) -> Self {
        Self {
            send_hwm: send_hwm.max(1),
            state: PublisherState::Unbound,
            dropped_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Binds the endpoint to `address` and starts the outbound pump.
    ///
    /// Binding twice is an error, as is binding an address another
    /// publisher holds.
    pub fn bind(&mut self, address: &str) -> Result<(), BindError> {
        match &self.state {
            PublisherState::Bound { address, .. } => {
                return Err(BindError::AlreadyBound(address.to_string()))
            }
            PublisherState::Closed => return Err(BindError::Closed),
            PublisherState::Unbound => {}
        }
        if address.trim().is_empty() {
            return Err(BindError::InvalidAddress);
        }

        let hub = transport::lookup(address);
        if !hub.bind() {
            return Err(BindError::AddressInUse(address.to_string()));
        }

        let (queue, mut outbound) = mpsc::channel::<Envelope>(self.send_hwm);
        let pump_hub = Arc::clone(&hub);
        // Ends on its own once the queue side is dropped in `close`.
        tokio::spawn(async move {
            while let Some(envelope) = outbound.recv().await {
                pump_hub.publish(envelope);
            }
        });

        debug!(address, "publisher bound");
        self.state = PublisherState::Bound {
            address: Arc::from(address),
            hub,
            queue,
        };
        Ok(())
    }

    /// Encodes `message` and queues the envelope for transmission.
    ///
    /// An over-high-water-mark queue drops the new envelope (counted, not
    /// an error); an unbound or closed endpoint is an error.
    pub fn send<T: Serialize>(&self, topic: &str, message: &T) -> Result<(), SendError> {
        let queue = match &self.state {
            PublisherState::Bound { queue, .. } => queue,
            PublisherState::Closed => return Err(SendError::Closed),
            PublisherState::Unbound => return Err(SendError::NotBound),
        };

        let envelope = Envelope::encode(topic, message)?;
        match queue.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                self.dropped_count.fetch_add(1, Ordering::Relaxed);
                warn!(topic = dropped.topic(), "outbound queue full, envelope dropped");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SendError::Closed),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, PublisherState::Bound { .. })
    }

    /// Releases the bound address. Idempotent: closing an already-closed
    /// endpoint is a no-op; every later `send` fails with `Closed`.
    pub fn close(&mut self) {
        if let PublisherState::Bound {
            address,
            hub,
            queue,
        } = std::mem::replace(&mut self.state, PublisherState::Closed)
        {
            // Dropping the queue lets the pump drain what was accepted,
            // then finish.
            drop(queue);
            hub.unbind();
            debug!(address = %address, "publisher closed");
        }
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.close();
    }
}
