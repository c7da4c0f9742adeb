//! Packet transport between the host and the radio
//!
//! Outbound traffic funnels through [`PacketTransport`], which serializes
//! all senders behind one send lock. Inbound traffic is delivered into
//! [`InboundQueues`] from the radio context and drained by the dispatch
//! loop.

mod queue;
mod socket;


pub use queue::{InboundQueues, PacketQueue, DEFAULT_QUEUE_DEPTH};
pub use socket::HciSocket;

use std::sync::{Arc, Mutex};

use log::trace;

use crate::error::HostError;
use crate::hci::constants::{HCI_ACL_PKT, HCI_COMMAND_PKT};

/// The radio boundary: one blocking transmit of a complete packet,
/// leading type byte included.
pub trait RadioTransport: Send + Sync {
    fn transmit(&self, packet: &[u8]) -> Result<(), HostError>;
}

impl<T: RadioTransport + ?Sized> RadioTransport for Arc<T> {
    fn transmit(&self, packet: &[u8]) -> Result<(), HostError> {
        (**self).transmit(packet)
    }
}

/// Serialized outbound send path. Senders share one scratch buffer guarded
/// by the send lock, so concurrent transmissions cannot interleave.
pub struct PacketTransport {
    radio: Box<dyn RadioTransport>,
    send_buf: Mutex<Vec<u8>>,
}

impl PacketTransport {
    pub fn new(radio: impl RadioTransport + 'static) -> Self {
        Self {
            radio: Box::new(radio),
            send_buf: Mutex::new(Vec::with_capacity(64)),
        }
    }

    fn send(&self, packet_type: u8, payload: &[u8]) -> Result<(), HostError> {
        let mut buf = self.send_buf.lock().unwrap();
        buf.clear();
        buf.push(packet_type);
        buf.extend_from_slice(payload);
        trace!("TX type 0x{:02X}: {}", packet_type, hex::encode(payload));
        self.radio.transmit(&buf)
    }

    /// Sends an HCI command packet (serialized without its type byte).
    pub fn send_command(&self, packet: &[u8]) -> Result<(), HostError> {
        self.send(HCI_COMMAND_PKT, packet)
    }

    /// Sends an ACL data packet (serialized without its type byte).
    pub fn send_acl(&self, packet: &[u8]) -> Result<(), HostError> {
        self.send(HCI_ACL_PKT, packet)
    }
}
