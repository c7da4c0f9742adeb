//! L2CAP signaling PDUs
//!
//! Control-channel PDUs exchanged on CID 0x0001, plus the ACL framing used
//! to carry any L2CAP payload to a connected peer.

use std::io::Cursor;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::l2cap::constants::*;

/// Signaling PDUs this host sends. Each carries the identifier that ties
/// a response to its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingPdu {
    ConnectionRequest {
        identifier: u8,
        psm: u16,
        scid: u16,
    },
    ConnectionResponse {
        identifier: u8,
        dcid: u16,
        scid: u16,
        result: u16,
    },
    ConfigurationRequest {
        identifier: u8,
        dcid: u16,
    },
    ConfigurationResponse {
        identifier: u8,
        scid: u16,
    },
    DisconnectionRequest {
        identifier: u8,
        dcid: u16,
        scid: u16,
    },
    DisconnectionResponse {
        identifier: u8,
        dcid: u16,
        scid: u16,
    },
    InformationResponse {
        identifier: u8,
        info_type: u16,
    },
}

impl SignalingPdu {
    /// Get the command code for this PDU
    pub fn code(&self) -> u8 {
        match self {
            Self::ConnectionRequest { .. } => L2CAP_CMD_CONNECTION_REQUEST,
            Self::ConnectionResponse { .. } => L2CAP_CMD_CONNECTION_RESPONSE,
            Self::ConfigurationRequest { .. } => L2CAP_CMD_CONFIG_REQUEST,
            Self::ConfigurationResponse { .. } => L2CAP_CMD_CONFIG_RESPONSE,
            Self::DisconnectionRequest { .. } => L2CAP_CMD_DISCONNECT_REQUEST,
            Self::DisconnectionResponse { .. } => L2CAP_CMD_DISCONNECT_RESPONSE,
            Self::InformationResponse { .. } => L2CAP_CMD_INFORMATION_RESPONSE,
        }
    }

    pub fn identifier(&self) -> u8 {
        match *self {
            Self::ConnectionRequest { identifier, .. }
            | Self::ConnectionResponse { identifier, .. }
            | Self::ConfigurationRequest { identifier, .. }
            | Self::ConfigurationResponse { identifier, .. }
            | Self::DisconnectionRequest { identifier, .. }
            | Self::DisconnectionResponse { identifier, .. }
            | Self::InformationResponse { identifier, .. } => identifier,
        }
    }

    /// Convert the PDU to its raw parameter bytes
    fn parameters(&self) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        match *self {
            Self::ConnectionRequest { psm, scid, .. } => {
                cursor.write_u16::<LittleEndian>(psm).unwrap();
                cursor.write_u16::<LittleEndian>(scid).unwrap();
            }

            Self::ConnectionResponse {
                dcid, scid, result, ..
            } => {
                cursor.write_u16::<LittleEndian>(dcid).unwrap();
                cursor.write_u16::<LittleEndian>(scid).unwrap();
                cursor.write_u16::<LittleEndian>(result).unwrap();
                cursor.write_u16::<LittleEndian>(0x0000).unwrap(); // no further information
            }

            Self::ConfigurationRequest { dcid, .. } => {
                cursor.write_u16::<LittleEndian>(dcid).unwrap();
                cursor.write_u16::<LittleEndian>(0x0000).unwrap(); // flags
                cursor.write_u8(CONFIG_OPT_MTU).unwrap();
                cursor.write_u8(0x02).unwrap(); // option length
                cursor.write_u16::<LittleEndian>(0xFFFF).unwrap(); // any MTU
            }

            Self::ConfigurationResponse { scid, .. } => {
                cursor.write_u16::<LittleEndian>(scid).unwrap();
                cursor.write_u16::<LittleEndian>(0x0000).unwrap(); // flags
                cursor.write_u16::<LittleEndian>(RESULT_SUCCESS).unwrap();
                cursor.write_u8(CONFIG_OPT_MTU).unwrap();
                cursor.write_u8(0x02).unwrap(); // option length
                cursor.write_u16::<LittleEndian>(CONFIG_MTU).unwrap();
            }

            Self::DisconnectionRequest { dcid, scid, .. }
            | Self::DisconnectionResponse { dcid, scid, .. } => {
                cursor.write_u16::<LittleEndian>(dcid).unwrap();
                cursor.write_u16::<LittleEndian>(scid).unwrap();
            }

            Self::InformationResponse { info_type, .. } => {
                cursor.write_u16::<LittleEndian>(info_type).unwrap();
                cursor.write_u16::<LittleEndian>(RESULT_SUCCESS).unwrap();
                cursor.write_u32::<LittleEndian>(0).unwrap(); // no data
            }
        }
        cursor.into_inner()
    }

    /// Serializes the PDU: code, identifier, parameter length, parameters.
    pub fn serialize(&self) -> Vec<u8> {
        let params = self.parameters();
        let mut pdu = Vec::with_capacity(4 + params.len());
        pdu.push(self.code());
        pdu.push(self.identifier());
        pdu.extend_from_slice(&(params.len() as u16).to_le_bytes());
        pdu.extend_from_slice(&params);
        pdu
    }
}

/// Wraps an L2CAP payload in ACL framing for the given connection handle
/// and channel.
pub fn acl_packet(handle: u16, channel: u16, payload: &[u8]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::with_capacity(8 + payload.len()));
    cursor.write_u8((handle & 0xFF) as u8).unwrap();
    cursor
        .write_u8(((handle >> 8) & 0x0F) as u8 | ACL_START_FLUSHABLE)
        .unwrap();
    cursor
        .write_u16::<LittleEndian>(payload.len() as u16 + 4)
        .unwrap();
    cursor.write_u16::<LittleEndian>(payload.len() as u16).unwrap();
    cursor.write_u16::<LittleEndian>(channel).unwrap();
    let mut packet = cursor.into_inner();
    packet.extend_from_slice(payload);
    packet
}

/// Serializes a signaling PDU into a complete ACL packet on the signaling
/// channel.
pub fn signaling_packet(handle: u16, pdu: &SignalingPdu) -> Vec<u8> {
    acl_packet(handle, CID_SIGNALING, &pdu.serialize())
}

/// Tests whether an inbound ACL packet belongs to the given connection
/// handle. Services use this to filter the broadcast stream.
pub fn acl_handle_matches(packet: &[u8], handle: u16) -> bool {
    packet.len() >= 2
        && packet[0] == (handle & 0xFF) as u8
        && packet[1] == (((handle >> 8) & 0x0F) as u8 | ACL_START_FLUSHABLE)
}
