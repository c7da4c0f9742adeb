//! PadLink - A Rust library for hosting classic Bluetooth game controllers
//!
//! This library implements the host side of a classic Bluetooth (BR/EDR) HCI
//! link on Unix systems, focused on pairing with and accepting connections
//! from HID game controllers such as Wiimotes and PlayStation gamepads.
//! It includes the controller bring-up state machine, HCI command and event
//! handling, and the L2CAP signaling needed to open data channels.

pub mod error;
pub mod hci;
pub mod host;
pub mod l2cap;
pub mod service;
pub mod transport;
pub mod types;

// Re-export common types for convenience
pub use error::HostError;
pub use hci::{HciCommand, HciEngine, HciEvent, HciEventFlags, HciState, HostIdentity};
pub use host::{AddressStore, BluetoothHost, HostConfig, MemoryAddressStore};
pub use l2cap::SignalingPdu;
pub use service::{BluetoothService, ServiceRegistry};
pub use transport::{HciSocket, InboundQueues, PacketTransport, RadioTransport};
pub use types::{BdAddr, ClassOfDevice, RemoteName};
