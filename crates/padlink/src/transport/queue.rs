//! Inbound packet queues
//!
//! Bounded queues bridging the radio delivery context to the dispatch
//! loop. Pushes never block: a full queue drops the packet. Pops never
//! wait: an empty queue returns `None`.

use std::collections::VecDeque;
use std::sync::Mutex;

use log::warn;

use crate::hci::constants::{HCI_ACL_PKT, HCI_EVENT_PKT};

/// Default depth of each inbound queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 16;

/// A bounded packet queue with non-blocking operations on both ends.
pub struct PacketQueue {
    inner: Mutex<VecDeque<Vec<u8>>>,
    capacity: usize,
    label: &'static str,
}

impl PacketQueue {
    pub fn new(label: &'static str, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            label,
        }
    }

    /// Pushes a packet without blocking. Returns `false` and drops the
    /// packet when the queue is full.
    pub fn try_push(&self, packet: Vec<u8>) -> bool {
        let mut queue = self.inner.lock().unwrap();
        if queue.len() >= self.capacity {
            warn!(
                "{} queue full, dropping {}-byte packet",
                self.label,
                packet.len()
            );
            return false;
        }
        queue.push_back(packet);
        true
    }

    /// Pops the oldest packet without waiting.
    pub fn try_pop(&self) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The pair of inbound queues fed from the radio context.
pub struct InboundQueues {
    pub events: PacketQueue,
    pub acl: PacketQueue,
}

impl InboundQueues {
    pub fn new(depth: usize) -> Self {
        Self {
            events: PacketQueue::new("event", depth),
            acl: PacketQueue::new("ACL", depth),
        }
    }

    /// Routes one complete packet (leading type byte included) into the
    /// matching queue, stripping the type byte. Safe to call from the
    /// radio delivery context: never blocks.
    pub fn deliver(&self, packet: &[u8]) {
        if packet.len() < 2 {
            warn!("Dropping runt packet: {}", hex::encode(packet));
            return;
        }
        match packet[0] {
            HCI_EVENT_PKT => {
                self.events.try_push(packet[1..].to_vec());
            }
            HCI_ACL_PKT => {
                self.acl.try_push(packet[1..].to_vec());
            }
            other => warn!("Dropping packet with unknown type 0x{:02X}", other),
        }
    }
}
