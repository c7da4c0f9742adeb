//! HCI protocol constants
//!
//! Constants used in the Bluetooth HCI protocol (BR/EDR subset).

// HCI packet types
pub const HCI_COMMAND_PKT: u8 = 0x01;
pub const HCI_ACL_PKT: u8 = 0x02;
pub const HCI_SCO_PKT: u8 = 0x03;
pub const HCI_EVENT_PKT: u8 = 0x04;

// Maximum size of HCI command parameters
pub const HCI_MAX_PARAM_LEN: usize = 255;

// Common OGF (Opcode Group Field) values
pub const OGF_LINK_CTL: u8 = 0x01;
pub const OGF_HOST_CTL: u8 = 0x03;
pub const OGF_INFO_PARAM: u8 = 0x04;

// Link Control commands (OGF: 0x01)
pub const OCF_INQUIRY: u16 = 0x0001;
pub const OCF_INQUIRY_CANCEL: u16 = 0x0002;
pub const OCF_CREATE_CONNECTION: u16 = 0x0005;
pub const OCF_DISCONNECT: u16 = 0x0006;
pub const OCF_ACCEPT_CONNECTION_REQUEST: u16 = 0x0009;
pub const OCF_LINK_KEY_NEGATIVE_REPLY: u16 = 0x000C;
pub const OCF_PIN_CODE_REPLY: u16 = 0x000D;
pub const OCF_PIN_CODE_NEGATIVE_REPLY: u16 = 0x000E;
pub const OCF_AUTH_REQUESTED: u16 = 0x0011;
pub const OCF_REMOTE_NAME_REQUEST: u16 = 0x0019;
pub const OCF_IO_CAPABILITY_REPLY: u16 = 0x002B;
pub const OCF_USER_CONFIRMATION_REPLY: u16 = 0x002C;

// Host Controller & Baseband commands (OGF: 0x03)
pub const OCF_SET_EVENT_MASK: u16 = 0x0001;
pub const OCF_RESET: u16 = 0x0003;
pub const OCF_WRITE_LOCAL_NAME: u16 = 0x0013;
pub const OCF_WRITE_SCAN_ENABLE: u16 = 0x001A;
pub const OCF_WRITE_CLASS_OF_DEVICE: u16 = 0x0024;
pub const OCF_WRITE_SIMPLE_PAIRING_MODE: u16 = 0x0056;

// Informational commands (OGF: 0x04)
pub const OCF_READ_LOCAL_VERSION: u16 = 0x0001;
pub const OCF_READ_LOCAL_EXTENDED_FEATURES: u16 = 0x0004;
pub const OCF_READ_BD_ADDR: u16 = 0x0009;

// HCI events
pub const EVT_INQUIRY_COMPLETE: u8 = 0x01;
pub const EVT_INQUIRY_RESULT: u8 = 0x02;
pub const EVT_CONN_COMPLETE: u8 = 0x03;
pub const EVT_CONN_REQUEST: u8 = 0x04;
pub const EVT_DISCONN_COMPLETE: u8 = 0x05;
pub const EVT_AUTH_COMPLETE: u8 = 0x06;
pub const EVT_REMOTE_NAME_COMPLETE: u8 = 0x07;
pub const EVT_ENCRYPTION_CHANGE: u8 = 0x08;
pub const EVT_CHANGE_CONNECTION_LINK_KEY: u8 = 0x09;
pub const EVT_READ_REMOTE_VERSION_COMPLETE: u8 = 0x0C;
pub const EVT_QOS_SETUP_COMPLETE: u8 = 0x0D;
pub const EVT_CMD_COMPLETE: u8 = 0x0E;
pub const EVT_CMD_STATUS: u8 = 0x0F;
pub const EVT_ROLE_CHANGE: u8 = 0x12;
pub const EVT_NUM_COMPLETED_PACKETS: u8 = 0x13;
pub const EVT_PIN_CODE_REQUEST: u8 = 0x16;
pub const EVT_LINK_KEY_REQUEST: u8 = 0x17;
pub const EVT_LINK_KEY_NOTIFICATION: u8 = 0x18;
pub const EVT_LOOPBACK_COMMAND: u8 = 0x19;
pub const EVT_DATA_BUFFER_OVERFLOW: u8 = 0x1A;
pub const EVT_MAX_SLOTS_CHANGE: u8 = 0x1B;
pub const EVT_PAGE_SCAN_REP_MODE_CHANGE: u8 = 0x20;
pub const EVT_READ_REMOTE_EXT_FEATURES_COMPLETE: u8 = 0x23;
pub const EVT_EXTENDED_INQUIRY_RESULT: u8 = 0x2F;
pub const EVT_IO_CAPABILITY_REQUEST: u8 = 0x31;
pub const EVT_IO_CAPABILITY_RESPONSE: u8 = 0x32;
pub const EVT_USER_CONFIRMATION_REQUEST: u8 = 0x33;
pub const EVT_SIMPLE_PAIRING_COMPLETE: u8 = 0x36;

// General Inquiry Access Code, little-endian LAP
pub const GIAC_LAP: [u8; 3] = [0x33, 0x8B, 0x9E];

// Inquiry parameters: 0x30 * 1.28 s = 61.44 s window, at most 10 responses
pub const INQUIRY_LENGTH: u8 = 0x30;
pub const INQUIRY_MAX_RESPONSES: u8 = 0x0A;

// Write Scan Enable modes
pub const SCAN_DISABLED: u8 = 0x00;
pub const SCAN_PAGE: u8 = 0x02;
pub const SCAN_INQUIRY_AND_PAGE: u8 = 0x03;

// Disconnect reason: remote user terminated connection
pub const REASON_REMOTE_TERMINATED: u8 = 0x13;

// Create Connection packet types: DM1/DH1/DM3/DH3/DM5/DH5
pub const PACKET_TYPES_ACL: [u8; 2] = [0x18, 0xCC];

// IO capability: no input, no output
pub const IO_CAP_NO_INPUT_NO_OUTPUT: u8 = 0x03;
