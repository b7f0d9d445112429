use std::{sync::Arc, time::Duration};

use serde::de::DeserializeOwned;
use tokio::{
    sync::broadcast,
    time::{self, Instant},
};
use tracing::{debug, warn};

use crate::{
    codec::Envelope,
    error::{ConnectError, RecvError, SubscribeError},
    transport::{self, Hub},
};

/// Default receive-side high-water-mark. Tunable, see `Settings`.
pub const DEFAULT_RECEIVE_HWM: usize = 1000;

enum SubscriberState {
    Unconnected,
    Connected {
        address: Arc<str>,
        hub: Arc<Hub>,
        port: u64,
        rx: broadcast::Receiver<Envelope>,
    },
    Closed,
}

/// Subscriber endpoint: owns one connection and its topic filters.
///
/// `try_receive` is the single blocking point, bounded by an explicit
/// timeout — that timeout is the cancellation-responsiveness granularity of
/// whatever loop drives this endpoint.
pub struct Subscriber {
    receive_hwm: usize,
    state: SubscriberState,
}

impl Subscriber {
    pub fn new() -> Self {
        Self::with_high_water_mark(DEFAULT_RECEIVE_HWM)
    }

    /// Bounds the number of unconsumed matching envelopes buffered for this
    /// subscriber; past the mark the transport drops the oldest.
    pub fn with_high_water_mark(receive_hwm: usize) -> Self {
        Self {
            receive_hwm: receive_hwm.max(1),
            state: SubscriberState::Unconnected,
        }
    }

    /// Connects to `address`. A publisher does not have to be bound there
    /// yet; envelopes published before this call are simply never seen
    /// (late joiner).
    pub fn connect(&mut self, address: &str) -> Result<(), ConnectError> {
        match &self.state {
            SubscriberState::Connected { address, .. } => {
                return Err(ConnectError::AlreadyConnected(address.to_string()))
            }
            SubscriberState::Closed => return Err(ConnectError::Closed),
            SubscriberState::Unconnected => {}
        }
        if address.trim().is_empty() {
            return Err(ConnectError::InvalidAddress);
        }

        let hub = transport::lookup(address);
        let (port, rx) = hub.attach(self.receive_hwm);
        debug!(address, port, "subscriber connected");
        self.state = SubscriberState::Connected {
            address: Arc::from(address),
            hub,
            port,
            rx,
        };
        Ok(())
    }

    /// Registers interest in topics the filter prefixes. May be called
    /// repeatedly to widen the subscription.
    pub fn subscribe(&mut self, topic_filter: &str) -> Result<(), SubscribeError> {
        let (hub, port) = match &self.state {
            SubscriberState::Connected { hub, port, .. } => (hub, *port),
            SubscriberState::Closed => return Err(SubscribeError::Closed),
            SubscriberState::Unconnected => return Err(SubscribeError::NotConnected),
        };
        if topic_filter.is_empty() {
            return Err(SubscribeError::EmptyFilter);
        }
        hub.add_filter(port, topic_filter);
        Ok(())
    }

    /// Waits up to `timeout` for a matching envelope.
    ///
    /// `Ok(None)` means nothing arrived in time — not an error, and the
    /// caller's chance to check for cancellation. A decode failure is
    /// surfaced per message; the endpoint stays usable for the next call.
    pub async fn try_receive<T: DeserializeOwned>(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<(String, T)>, RecvError> {
        let rx = match &mut self.state {
            SubscriberState::Connected { rx, .. } => rx,
            SubscriberState::Closed => return Err(RecvError::Closed),
            SubscriberState::Unconnected => return Err(RecvError::NotConnected),
        };

        let deadline = Instant::now() + timeout;
        loop {
            match time::timeout_at(deadline, rx.recv()).await {
                Err(_elapsed) => return Ok(None),
                Ok(Ok(envelope)) => {
                    let message = envelope.decode()?;
                    return Ok(Some((envelope.topic().to_string(), message)));
                }
                Ok(Err(broadcast::error::RecvError::Lagged(n))) => {
                    // Backlog overflowed the high-water-mark; the oldest n
                    // envelopes are gone. Keep waiting for what is left.
                    warn!(lagged = n, "receive buffer overflowed, oldest envelopes dropped");
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => return Ok(None),
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, SubscriberState::Connected { .. })
    }

    /// Releases the connection. Idempotent.
    pub fn close(&mut self) {
        if let SubscriberState::Connected {
            address, hub, port, ..
        } = std::mem::replace(&mut self.state, SubscriberState::Closed)
        {
            hub.detach(port);
            debug!(address = %address, port, "subscriber closed");
        }
    }
}

impl Default for Subscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.close();
    }
}
