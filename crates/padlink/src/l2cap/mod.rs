//! L2CAP signaling layer
//!
//! Control-channel PDU builders and ACL framing helpers.

pub mod constants;
pub mod signaling;


pub use signaling::{acl_handle_matches, acl_packet, signaling_packet, SignalingPdu};
