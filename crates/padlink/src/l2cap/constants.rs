//! L2CAP protocol constants

// Fixed channel identifiers
pub const CID_SIGNALING: u16 = 0x0001;

// Signaling command codes
pub const L2CAP_CMD_COMMAND_REJECT: u8 = 0x01;
pub const L2CAP_CMD_CONNECTION_REQUEST: u8 = 0x02;
pub const L2CAP_CMD_CONNECTION_RESPONSE: u8 = 0x03;
pub const L2CAP_CMD_CONFIG_REQUEST: u8 = 0x04;
pub const L2CAP_CMD_CONFIG_RESPONSE: u8 = 0x05;
pub const L2CAP_CMD_DISCONNECT_REQUEST: u8 = 0x06;
pub const L2CAP_CMD_DISCONNECT_RESPONSE: u8 = 0x07;
pub const L2CAP_CMD_INFORMATION_REQUEST: u8 = 0x0A;
pub const L2CAP_CMD_INFORMATION_RESPONSE: u8 = 0x0B;

// Common PSM values
pub const PSM_SDP: u16 = 0x0001;
pub const PSM_RFCOMM: u16 = 0x0003;
pub const PSM_HID_CONTROL: u16 = 0x0011;
pub const PSM_HID_INTERRUPT: u16 = 0x0013;

// Connection response results
pub const RESULT_SUCCESS: u16 = 0x0000;
pub const RESULT_PENDING: u16 = 0x0001;

// Configuration option types
pub const CONFIG_OPT_MTU: u8 = 0x01;

// MTU offered in configuration responses
pub const CONFIG_MTU: u16 = 672;

// ACL packet boundary flag: first fragment of an automatically flushable
// L2CAP PDU
pub const ACL_START_FLUSHABLE: u8 = 0x20;
