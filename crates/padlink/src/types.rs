//! Value types shared across the HCI and L2CAP layers.

use std::fmt;

/// Bluetooth device address (BD_ADDR), stored in wire order
/// (least significant byte first).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    /// Creates an address from a 6-byte wire slice.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != 6 {
            return None;
        }
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(slice);
        Some(Self { bytes })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_zero(&self) -> bool {
        self.bytes == [0u8; 6]
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

/// Class of device, three bytes as delivered in inquiry results and
/// incoming connection requests. Byte 0 carries the minor class, byte 1
/// the major class, byte 2 the service class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassOfDevice {
    pub bytes: [u8; 3],
}

impl ClassOfDevice {
    pub const fn new(bytes: [u8; 3]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != 3 {
            return None;
        }
        let mut bytes = [0u8; 3];
        bytes.copy_from_slice(slice);
        Some(Self { bytes })
    }

    /// Major device class, the low nibble of byte 1.
    pub fn major_class(&self) -> u8 {
        self.bytes[1] & 0x0F
    }

    /// Wii-family candidate: no service class, peripheral major class, and
    /// a joystick or gamepad minor bit.
    pub fn is_wii_candidate(&self) -> bool {
        self.bytes[2] == 0 && self.major_class() == 0x05 && (self.bytes[0] & 0x0C) != 0
    }

    /// HID candidate: peripheral major class with a mouse, keyboard, or
    /// gamepad minor bit.
    pub fn is_hid_candidate(&self) -> bool {
        self.major_class() == 0x05 && (self.bytes[0] & 0xC8) != 0
    }

    pub fn is_mouse(&self) -> bool {
        self.bytes[0] & 0x80 != 0
    }

    pub fn is_keyboard(&self) -> bool {
        self.bytes[0] & 0x40 != 0
    }

    pub fn is_gamepad(&self) -> bool {
        self.bytes[0] & 0x08 != 0
    }

    /// The class reported by DualShock 4 and DualSense pads.
    pub fn is_playstation_gamepad(&self) -> bool {
        self.bytes == [0x08, 0x25, 0x00]
    }
}

/// Remote device name as returned by a Remote Name Request, capped at 30
/// bytes. The controller does not guarantee a NUL terminator when the name
/// fills the buffer, so the length is tracked explicitly and no terminator
/// is required or stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteName {
    buf: [u8; Self::MAX_LEN],
    len: usize,
}

impl RemoteName {
    pub const MAX_LEN: usize = 30;

    /// Copies from a wire buffer until a NUL byte or the cap is reached.
    pub fn from_wire(data: &[u8]) -> Self {
        let mut name = Self::default();
        for &b in data.iter().take(Self::MAX_LEN) {
            if b == 0 {
                break;
            }
            name.buf[name.len] = b;
            name.len += 1;
        }
        name
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.as_bytes().starts_with(prefix)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl fmt::Display for RemoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bdaddr_display_reverses_byte_order() {
        let addr = BdAddr::new([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(addr.to_string(), "06:05:04:03:02:01");
    }

    #[test]
    fn bdaddr_from_slice_rejects_wrong_length() {
        assert!(BdAddr::from_slice(&[0x01, 0x02, 0x03]).is_none());
        assert!(BdAddr::from_slice(&[0u8; 7]).is_none());
        assert!(BdAddr::from_slice(&[0u8; 6]).is_some());
    }

    #[test]
    fn class_of_device_wii_candidate() {
        // Wiimote: minor joystick, major peripheral, no service class
        let cod = ClassOfDevice::new([0x04, 0x25, 0x00]);
        assert!(cod.is_wii_candidate());
        // Service class bits set: not a Wii candidate
        let cod = ClassOfDevice::new([0x04, 0x25, 0x10]);
        assert!(!cod.is_wii_candidate());
        // Wrong major class
        let cod = ClassOfDevice::new([0x04, 0x21, 0x00]);
        assert!(!cod.is_wii_candidate());
    }

    #[test]
    fn class_of_device_hid_kinds() {
        let mouse = ClassOfDevice::new([0x80, 0x05, 0x00]);
        assert!(mouse.is_hid_candidate());
        assert!(mouse.is_mouse());
        assert!(!mouse.is_keyboard());

        let keyboard = ClassOfDevice::new([0x40, 0x05, 0x00]);
        assert!(keyboard.is_hid_candidate());
        assert!(keyboard.is_keyboard());

        let gamepad = ClassOfDevice::new([0x08, 0x05, 0x00]);
        assert!(gamepad.is_hid_candidate());
        assert!(gamepad.is_gamepad());

        // Joystick-only minor bit (0x04) is not in the HID mask
        let joystick = ClassOfDevice::new([0x04, 0x05, 0x00]);
        assert!(!joystick.is_hid_candidate());
    }

    #[test]
    fn class_of_device_playstation() {
        assert!(ClassOfDevice::new([0x08, 0x25, 0x00]).is_playstation_gamepad());
        assert!(!ClassOfDevice::new([0x08, 0x25, 0x01]).is_playstation_gamepad());
    }

    #[test]
    fn remote_name_stops_at_nul() {
        let name = RemoteName::from_wire(b"Nintendo RVL-CNT-01\0garbage");
        assert_eq!(name.as_bytes(), b"Nintendo RVL-CNT-01");
        assert!(name.starts_with(b"Nintendo"));
    }

    #[test]
    fn remote_name_caps_unterminated_input() {
        // 40 input bytes, none NUL: keep exactly 30
        let long = [b'A'; 40];
        let name = RemoteName::from_wire(&long);
        assert_eq!(name.as_bytes().len(), RemoteName::MAX_LEN);
        assert_eq!(name.as_bytes(), &[b'A'; 30][..]);
    }

    #[test]
    fn remote_name_clear_empties() {
        let mut name = RemoteName::from_wire(b"Wireless Controller\0");
        assert!(!name.is_empty());
        name.clear();
        assert!(name.is_empty());
        assert!(!name.starts_with(b"W"));
    }
}
