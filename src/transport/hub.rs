use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tokio::sync::broadcast;

use super::intern_name;
use crate::codec::Envelope;

/// Process-wide address registry: one hub per address, created on first use
/// by either side. Connecting before the publisher binds is therefore fine.
static HUBS: Lazy<DashMap<Arc<str>, Arc<Hub>>> = Lazy::new(DashMap::new);

/// Returns the hub for `address`, creating it on first use.
pub fn lookup(address: &str) -> Arc<Hub> {
    let key = intern_name(address);
    HUBS.entry(key)
        .or_insert_with(|| Arc::new(Hub::new()))
        .clone()
}

/// One subscriber attachment: its prefix filters and its bounded buffer.
struct Port {
    filters: Vec<Arc<str>>,
    tx: broadcast::Sender<Envelope>,
}

/// Delivery point for one address.
///
/// The publisher side claims the address with `bind` (at most one publisher
/// per address); subscribers `attach` ports, each with its own buffer of the
/// requested capacity. Filtering happens here at publish time, so a port
/// only ever buffers envelopes its filters match, in publish order (FIFO
/// per port, no ordering across ports).
///
/// A full port buffer drops its oldest envelope (broadcast lag semantics):
/// a slow subscriber loses its own backlog and nothing else.
pub struct Hub {
    bound: AtomicBool,
    ports: DashMap<u64, Port>,
    next_port: AtomicU64,
    /// Total `publish` calls on this hub.
    pub publish_count: AtomicUsize,
    /// Envelopes that matched a port whose receiver was already gone.
    pub dead_port_count: AtomicUsize,
}

impl Hub {
    fn new() -> Self {
        Self {
            bound: AtomicBool::new(false),
            ports: DashMap::new(),
            next_port: AtomicU64::new(0),
            publish_count: AtomicUsize::new(0),
            dead_port_count: AtomicUsize::new(0),
        }
    }

    /// Claims the publisher side of this address. Returns `false` when
    /// another publisher already holds it.
    pub fn bind(&self) -> bool {
        self.bound
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Releases the publisher side.
    pub fn unbind(&self) {
        self.bound.store(false, Ordering::Release);
    }

    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }

    /// Registers a subscriber port with its own buffer of `capacity`
    /// envelopes. The port matches nothing until a filter is added.
    pub fn attach(&self, capacity: usize) -> (u64, broadcast::Receiver<Envelope>) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        let id = self.next_port.fetch_add(1, Ordering::Relaxed);
        self.ports.insert(
            id,
            Port {
                filters: Vec::new(),
                tx,
            },
        );
        (id, rx)
    }

    /// Adds a prefix filter to a port. Repeated identical filters are kept
    /// once.
    pub fn add_filter(&self, port: u64, filter: &str) {
        if let Some(mut entry) = self.ports.get_mut(&port) {
            let filter = intern_name(filter);
            if !entry.filters.iter().any(|f| **f == *filter) {
                entry.filters.push(filter);
            }
        }
    }

    /// Removes a port. Safe to call for a port that is already gone.
    pub fn detach(&self, port: u64) {
        self.ports.remove(&port);
    }

    /// Fans the envelope out to every port with a filter that
    /// prefix-matches the topic. The payload frame never reaches a port
    /// whose filters do not match.
    pub fn publish(&self, envelope: Envelope) {
        self.publish_count.fetch_add(1, Ordering::Relaxed);
        for entry in self.ports.iter() {
            let matched = entry
                .filters
                .iter()
                .any(|f| envelope.topic().starts_with(f.as_ref()));
            if matched && entry.tx.send(envelope.clone()).is_err() {
                self.dead_port_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }
}
