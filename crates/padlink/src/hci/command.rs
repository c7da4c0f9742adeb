//! HCI command packets
//!
//! Builders for the command packets this host issues. A serialized command
//! is the 10-bit opcode split across two little-endian bytes, a parameter
//! length byte, and the parameters. The leading packet-type byte is not
//! part of the serialized form; the transport send path prepends it.

use crate::hci::constants::*;
use crate::types::BdAddr;

/// PIN codes are at most 16 bytes on the wire.
pub const PIN_CODE_MAX_LEN: usize = 16;

/// Local names fit a 248-byte field including the NUL terminator.
pub const LOCAL_NAME_MAX_LEN: usize = 247;

/// Commands issued by the host, grouped by opcode group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HciCommand {
    // Link Control Commands (OGF: 0x01)
    Inquiry,
    InquiryCancel,
    CreateConnection { addr: BdAddr },
    Disconnect { handle: u16 },
    AcceptConnectionRequest { addr: BdAddr },
    LinkKeyNegativeReply { addr: BdAddr },
    PinCodeReply { addr: BdAddr, pin: Vec<u8> },
    PinCodeNegativeReply { addr: BdAddr },
    AuthenticationRequested { handle: u16 },
    RemoteNameRequest { addr: BdAddr },
    IoCapabilityReply { addr: BdAddr },
    UserConfirmationReply { addr: BdAddr },

    // Host Controller & Baseband Commands (OGF: 0x03)
    SetEventMask,
    Reset,
    WriteLocalName { name: Vec<u8> },
    WriteScanEnable { mode: u8 },
    WriteClassOfDevice { class: [u8; 3] },
    WriteSimplePairingMode { enable: bool },

    // Informational Commands (OGF: 0x04)
    ReadLocalVersion,
    ReadLocalExtendedFeatures { page: u8 },
    ReadBdAddr,
}

impl HciCommand {
    /// Get the OGF and OCF for this command
    pub fn opcode_parts(&self) -> (u8, u16) {
        match self {
            // Link Control Commands
            Self::Inquiry => (OGF_LINK_CTL, OCF_INQUIRY),
            Self::InquiryCancel => (OGF_LINK_CTL, OCF_INQUIRY_CANCEL),
            Self::CreateConnection { .. } => (OGF_LINK_CTL, OCF_CREATE_CONNECTION),
            Self::Disconnect { .. } => (OGF_LINK_CTL, OCF_DISCONNECT),
            Self::AcceptConnectionRequest { .. } => (OGF_LINK_CTL, OCF_ACCEPT_CONNECTION_REQUEST),
            Self::LinkKeyNegativeReply { .. } => (OGF_LINK_CTL, OCF_LINK_KEY_NEGATIVE_REPLY),
            Self::PinCodeReply { .. } => (OGF_LINK_CTL, OCF_PIN_CODE_REPLY),
            Self::PinCodeNegativeReply { .. } => (OGF_LINK_CTL, OCF_PIN_CODE_NEGATIVE_REPLY),
            Self::AuthenticationRequested { .. } => (OGF_LINK_CTL, OCF_AUTH_REQUESTED),
            Self::RemoteNameRequest { .. } => (OGF_LINK_CTL, OCF_REMOTE_NAME_REQUEST),
            Self::IoCapabilityReply { .. } => (OGF_LINK_CTL, OCF_IO_CAPABILITY_REPLY),
            Self::UserConfirmationReply { .. } => (OGF_LINK_CTL, OCF_USER_CONFIRMATION_REPLY),

            // Host Controller & Baseband Commands
            Self::SetEventMask => (OGF_HOST_CTL, OCF_SET_EVENT_MASK),
            Self::Reset => (OGF_HOST_CTL, OCF_RESET),
            Self::WriteLocalName { .. } => (OGF_HOST_CTL, OCF_WRITE_LOCAL_NAME),
            Self::WriteScanEnable { .. } => (OGF_HOST_CTL, OCF_WRITE_SCAN_ENABLE),
            Self::WriteClassOfDevice { .. } => (OGF_HOST_CTL, OCF_WRITE_CLASS_OF_DEVICE),
            Self::WriteSimplePairingMode { .. } => (OGF_HOST_CTL, OCF_WRITE_SIMPLE_PAIRING_MODE),

            // Informational Commands
            Self::ReadLocalVersion => (OGF_INFO_PARAM, OCF_READ_LOCAL_VERSION),
            Self::ReadLocalExtendedFeatures { .. } => (OGF_INFO_PARAM, OCF_READ_LOCAL_EXTENDED_FEATURES),
            Self::ReadBdAddr => (OGF_INFO_PARAM, OCF_READ_BD_ADDR),
        }
    }

    /// Convert the command to its raw parameter bytes
    fn parameters(&self) -> Vec<u8> {
        match self {
            Self::Inquiry => {
                let mut params = Vec::with_capacity(5);
                params.extend_from_slice(&GIAC_LAP);
                params.push(INQUIRY_LENGTH);
                params.push(INQUIRY_MAX_RESPONSES);
                params
            }

            Self::InquiryCancel | Self::Reset | Self::ReadLocalVersion | Self::ReadBdAddr => {
                vec![]
            }

            Self::CreateConnection { addr } => {
                let mut params = Vec::with_capacity(13);
                params.extend_from_slice(addr.as_slice());
                params.extend_from_slice(&PACKET_TYPES_ACL);
                params.push(0x01); // page scan repetition mode R1
                params.push(0x00); // reserved
                params.extend_from_slice(&[0x00, 0x00]); // clock offset unknown
                params.push(0x00); // no role switch
                params
            }

            Self::Disconnect { handle } => {
                let mut params = Vec::with_capacity(3);
                params.extend_from_slice(&connection_handle_bytes(*handle));
                params.push(REASON_REMOTE_TERMINATED);
                params
            }

            Self::AcceptConnectionRequest { addr } => {
                let mut params = Vec::with_capacity(7);
                params.extend_from_slice(addr.as_slice());
                params.push(0x00); // switch to master role
                params
            }

            Self::LinkKeyNegativeReply { addr } | Self::PinCodeNegativeReply { addr } => {
                addr.as_slice().to_vec()
            }

            Self::PinCodeReply { addr, pin } => {
                let pin_len = pin.len().min(PIN_CODE_MAX_LEN);
                let mut params = Vec::with_capacity(7 + PIN_CODE_MAX_LEN);
                params.extend_from_slice(addr.as_slice());
                params.push(pin_len as u8);
                params.extend_from_slice(&pin[..pin_len]);
                params.resize(7 + PIN_CODE_MAX_LEN, 0x00);
                params
            }

            Self::AuthenticationRequested { handle } => {
                connection_handle_bytes(*handle).to_vec()
            }

            Self::RemoteNameRequest { addr } => {
                let mut params = Vec::with_capacity(10);
                params.extend_from_slice(addr.as_slice());
                params.push(0x01); // page scan repetition mode R1
                params.push(0x00); // reserved
                params.extend_from_slice(&[0x00, 0x00]); // clock offset unknown
                params
            }

            Self::IoCapabilityReply { addr } => {
                let mut params = Vec::with_capacity(9);
                params.extend_from_slice(addr.as_slice());
                params.push(IO_CAP_NO_INPUT_NO_OUTPUT);
                params.push(0x00); // OOB authentication data not present
                params.push(0x00); // MITM protection not required
                params
            }

            Self::UserConfirmationReply { addr } => addr.as_slice().to_vec(),

            Self::SetEventMask => {
                // default mask plus the connection, pairing, and simple
                // pairing events this host consumes
                vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x1F, 0xFF, 0x00]
            }

            Self::WriteLocalName { name } => {
                let len = name.len().min(LOCAL_NAME_MAX_LEN);
                let mut params = Vec::with_capacity(len + 1);
                params.extend_from_slice(&name[..len]);
                params.push(0x00);
                params
            }

            Self::WriteScanEnable { mode } => vec![*mode],

            Self::WriteClassOfDevice { class } => class.to_vec(),

            Self::WriteSimplePairingMode { enable } => vec![*enable as u8],

            Self::ReadLocalExtendedFeatures { page } => vec![*page],
        }
    }

    /// Convert the command to its wire form
    pub fn to_packet(&self) -> Vec<u8> {
        let (ogf, ocf) = self.opcode_parts();
        let opcode = ((ogf as u16) << 10) | (ocf & 0x3ff);
        let params = self.parameters();

        let mut packet = Vec::with_capacity(3 + params.len());
        packet.extend_from_slice(&opcode.to_le_bytes());
        packet.push(params.len() as u8);
        packet.extend_from_slice(&params);
        packet
    }
}

/// Connection handles are 12 bits; the upper nibble of the second byte is
/// masked off on the wire.
pub fn connection_handle_bytes(handle: u16) -> [u8; 2] {
    [(handle & 0xFF) as u8, ((handle >> 8) & 0x0F) as u8]
}
