//! Error types for the host driver
//!
//! This module defines the error types used throughout the library.

use thiserror::Error;

/// Errors surfaced by the host driver.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Failed to open HCI socket: {0}")]
    SocketError(#[from] std::io::Error),

    #[error("Failed to bind HCI socket: {0}")]
    BindError(std::io::Error),

    #[error("Failed to send packet to the controller: {0}")]
    SendError(std::io::Error),

    #[error("Failed to receive packet from the controller: {0}")]
    ReceiveError(std::io::Error),

    #[error("Radio transport failure: {0}")]
    TransportError(String),

    #[error("Invalid packet format")]
    InvalidPacketFormat,

    #[error("Service registry is full ({0} slots)")]
    RegistryFull(usize),

    #[error("Address store failure: {0}")]
    StoreError(String),
}
