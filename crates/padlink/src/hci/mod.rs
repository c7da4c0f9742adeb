//! Bluetooth HCI (Host Controller Interface) layer
//!
//! Command builders, event parsing, and the connection state machine.

pub mod command;
pub mod constants;
pub mod engine;
pub mod event;


pub use command::{connection_handle_bytes, HciCommand};
pub use engine::{ConnectionContext, HciEngine, HciEventFlags, HciState, HostIdentity};
pub use event::HciEvent;
