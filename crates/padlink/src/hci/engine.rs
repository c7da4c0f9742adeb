//! HCI connection engine
//!
//! The controller bring-up and connection state machine. Inbound events
//! set flags and capture link parameters; `step()` consumes the flags,
//! advances the state machine, and issues the next command. Transitions
//! are edge-triggered: a flag observed during one step is acted on once,
//! and a step that observes no flags leaves the state untouched.

use std::sync::Arc;

use bitflags::bitflags;
use log::{debug, info, warn};

use crate::error::HostError;
use crate::hci::command::HciCommand;
use crate::hci::constants::*;
use crate::hci::event::HciEvent;
use crate::host::HostConfig;
use crate::transport::PacketTransport;
use crate::types::{BdAddr, ClassOfDevice, RemoteName};

bitflags! {
    /// Flags set by the event handler and consumed by the state machine.
    /// Each flag is cleared by the command or state that waits on it,
    /// never by a timer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HciEventFlags: u16 {
        const CMD_COMPLETE = 1 << 0;
        const CONNECT_COMPLETE = 1 << 1;
        const DISCONNECT_COMPLETE = 1 << 2;
        const REMOTE_NAME_COMPLETE = 1 << 3;
        const INCOMING_REQUEST = 1 << 4;
        const READ_BDADDR = 1 << 5;
        const READ_VERSION = 1 << 6;
        const DEVICE_FOUND = 1 << 7;
        const CONNECT_EVENT = 1 << 8;
        const EXTENDED_FEATURES = 1 << 9;
    }
}

/// Engine states. The bring-up states run once after power-on; the engine
/// then cycles through the scanning and connection states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HciState {
    Init,
    Reset,
    WriteClassOfDevice,
    ReadBdAddr,
    ReadLocalVersion,
    WriteLocalName,
    ReadExtendedFeatures,
    WriteSimplePairing,
    SetEventMask,
    CheckDeviceService,
    Inquiry,
    ConnectDevice,
    ConnectedDevice,
    Scanning,
    ConnectIn,
    RemoteName,
    Connected,
    Done,
    Disconnect,
}

/// Local controller identity captured during bring-up.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostIdentity {
    pub bd_addr: BdAddr,
    pub hci_version: u8,
    pub simple_pairing_supported: bool,
}

/// Per-connection scratch state plus the saved peer address used for
/// silent reconnects.
#[derive(Debug, Default)]
pub struct ConnectionContext {
    pub peer_addr: BdAddr,
    pub saved_addr: BdAddr,
    pub class_of_device: ClassOfDevice,
    pub remote_name: RemoteName,
    pub handle: u16,
    // channel claims, one consumer each
    pub l2cap_claimed: bool,
    pub sdp_claimed: bool,
    pub rfcomm_claimed: bool,
    // peer classification
    pub incoming_wii: bool,
    pub incoming_hid: bool,
    pub incoming_playstation: bool,
    pub motion_plus: bool,
    pub wii_u_pro: bool,
    pub sync_button_pairing: bool,
}

impl ConnectionContext {
    /// Clears per-connection scratch state. The saved address survives so
    /// the next incoming request can still match it.
    pub fn reset(&mut self) {
        let saved = self.saved_addr;
        *self = Self::default();
        self.saved_addr = saved;
    }

    /// Claims the L2CAP signaling channel for one consumer. Returns false
    /// when another consumer already holds it.
    pub fn try_claim_l2cap(&mut self) -> bool {
        if self.l2cap_claimed {
            return false;
        }
        self.l2cap_claimed = true;
        true
    }

    pub fn release_l2cap(&mut self) {
        self.l2cap_claimed = false;
    }

    /// Claims the SDP channel for one consumer.
    pub fn try_claim_sdp(&mut self) -> bool {
        if self.sdp_claimed {
            return false;
        }
        self.sdp_claimed = true;
        true
    }

    pub fn release_sdp(&mut self) {
        self.sdp_claimed = false;
    }

    /// Claims the RFCOMM channel for one consumer.
    pub fn try_claim_rfcomm(&mut self) -> bool {
        if self.rfcomm_claimed {
            return false;
        }
        self.rfcomm_claimed = true;
        true
    }

    pub fn release_rfcomm(&mut self) {
        self.rfcomm_claimed = false;
    }
}

// Reset backoff: initial dwell before the first reset, multiplied by ten
// on each silent retry, capped.
const RESET_BACKOFF_INITIAL: u16 = 100;
const RESET_BACKOFF_MAX: u16 = 2000;

// Ticks spent in Done so higher layers can finish channel setup.
const DONE_DWELL_TICKS: u16 = 1000;

// Inquiry rounds before an unanswered pairing attempt is abandoned.
const INQUIRY_GIVE_UP_ROUNDS: u8 = 5;

/// Owns the controller bring-up and connection lifecycle.
pub struct HciEngine {
    transport: Arc<PacketTransport>,
    config: HostConfig,
    state: HciState,
    flags: HciEventFlags,
    counter: u16,
    reset_backoff: u16,
    inquiry_count: u8,
    identity: HostIdentity,
    context: ConnectionContext,
    // discovery and pairing intents
    pair_with_wii: bool,
    connect_to_wii: bool,
    pair_with_hid: bool,
    connect_to_hid: bool,
    check_remote_name: bool,
    waiting_for_connection: bool,
}

impl HciEngine {
    pub fn new(transport: Arc<PacketTransport>, config: HostConfig) -> Self {
        Self {
            transport,
            config,
            state: HciState::Init,
            flags: HciEventFlags::empty(),
            counter: 0,
            reset_backoff: RESET_BACKOFF_INITIAL,
            inquiry_count: 0,
            identity: HostIdentity::default(),
            context: ConnectionContext::default(),
            pair_with_wii: false,
            connect_to_wii: false,
            pair_with_hid: false,
            connect_to_hid: false,
            check_remote_name: false,
            waiting_for_connection: false,
        }
    }

    pub fn state(&self) -> HciState {
        self.state
    }

    pub fn flags(&self) -> HciEventFlags {
        self.flags
    }

    pub fn identity(&self) -> &HostIdentity {
        &self.identity
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ConnectionContext {
        &mut self.context
    }

    pub fn connection_handle(&self) -> u16 {
        self.context.handle
    }

    pub fn peer_address(&self) -> BdAddr {
        self.context.peer_addr
    }

    pub fn saved_address(&self) -> BdAddr {
        self.context.saved_addr
    }

    /// Seeds the address matched against incoming connection requests.
    pub fn set_saved_address(&mut self, addr: BdAddr) {
        self.context.saved_addr = addr;
    }

    pub fn waiting_for_connection(&self) -> bool {
        self.waiting_for_connection
    }

    /// True once an authenticated Wii-family peer is ready for channel
    /// setup by a consumer service.
    pub fn connect_to_wii(&self) -> bool {
        self.connect_to_wii
    }

    /// True once an authenticated HID peer is ready for channel setup.
    pub fn connect_to_hid_device(&self) -> bool {
        self.connect_to_hid
    }

    /// Consumed by the service that picked up the Wii peer, letting the
    /// scan loop resume watching for new work.
    pub fn clear_connect_to_wii(&mut self) {
        self.connect_to_wii = false;
        self.pair_with_wii = false;
    }

    /// Consumed by the service that picked up the HID peer.
    pub fn clear_connect_to_hid_device(&mut self) {
        self.connect_to_hid = false;
        self.pair_with_hid = false;
    }

    /// Starts discovery and pairing of a Wiimote in sync-button or button
    /// pairing mode.
    pub fn pair_with_wiimote(&mut self) {
        self.pair_with_wii = true;
        self.state = HciState::CheckDeviceService;
    }

    /// Starts discovery and pairing of a generic HID device.
    pub fn pair_with_hid_device(&mut self) {
        self.waiting_for_connection = false;
        self.pair_with_hid = true;
        self.state = HciState::CheckDeviceService;
    }

    // ---- command wrappers ----
    //
    // Every transmission clears CMD_COMPLETE; wrappers additionally clear
    // the flag their completion event will set, so a stale flag from an
    // earlier command can never satisfy the wait.

    fn send_command(&mut self, command: &HciCommand) -> Result<(), HostError> {
        self.flags.remove(HciEventFlags::CMD_COMPLETE);
        self.transport.send_command(&command.to_packet())
    }

    pub fn hci_reset(&mut self) -> Result<(), HostError> {
        self.flags = HciEventFlags::empty();
        self.send_command(&HciCommand::Reset)
    }

    fn write_class_of_device(&mut self) -> Result<(), HostError> {
        // toy / gamepad
        self.send_command(&HciCommand::WriteClassOfDevice {
            class: [0x04, 0x08, 0x00],
        })
    }

    fn read_bdaddr(&mut self) -> Result<(), HostError> {
        self.flags.remove(HciEventFlags::READ_BDADDR);
        self.send_command(&HciCommand::ReadBdAddr)
    }

    fn read_local_version(&mut self) -> Result<(), HostError> {
        self.flags.remove(HciEventFlags::READ_VERSION);
        self.send_command(&HciCommand::ReadLocalVersion)
    }

    fn read_extended_features(&mut self, page: u8) -> Result<(), HostError> {
        self.flags.remove(HciEventFlags::EXTENDED_FEATURES);
        self.send_command(&HciCommand::ReadLocalExtendedFeatures { page })
    }

    fn write_local_name(&mut self) -> Result<(), HostError> {
        let name = self.config.local_name.clone().unwrap_or_default();
        self.send_command(&HciCommand::WriteLocalName {
            name: name.into_bytes(),
        })
    }

    fn set_event_mask(&mut self) -> Result<(), HostError> {
        self.send_command(&HciCommand::SetEventMask)
    }

    fn write_simple_pairing(&mut self, enable: bool) -> Result<(), HostError> {
        self.send_command(&HciCommand::WriteSimplePairingMode { enable })
    }

    /// Enables page scan, plus inquiry scan when a local name is
    /// configured so the host is discoverable under that name.
    pub fn write_scan_enable(&mut self) -> Result<(), HostError> {
        self.flags.remove(HciEventFlags::INCOMING_REQUEST);
        let mode = if self.config.local_name.is_some() {
            SCAN_INQUIRY_AND_PAGE
        } else {
            SCAN_PAGE
        };
        self.send_command(&HciCommand::WriteScanEnable { mode })
    }

    pub fn write_scan_disable(&mut self) -> Result<(), HostError> {
        self.send_command(&HciCommand::WriteScanEnable {
            mode: SCAN_DISABLED,
        })
    }

    pub fn hci_inquiry(&mut self) -> Result<(), HostError> {
        self.flags.remove(HciEventFlags::DEVICE_FOUND);
        self.send_command(&HciCommand::Inquiry)
    }

    pub fn hci_inquiry_cancel(&mut self) -> Result<(), HostError> {
        self.send_command(&HciCommand::InquiryCancel)
    }

    fn hci_create_connection(&mut self) -> Result<(), HostError> {
        self.flags
            .remove(HciEventFlags::CONNECT_COMPLETE | HciEventFlags::CONNECT_EVENT);
        self.send_command(&HciCommand::CreateConnection {
            addr: self.context.peer_addr,
        })
    }

    fn hci_accept_connection(&mut self) -> Result<(), HostError> {
        self.flags.remove(HciEventFlags::CONNECT_COMPLETE);
        self.send_command(&HciCommand::AcceptConnectionRequest {
            addr: self.context.peer_addr,
        })
    }

    fn hci_remote_name_request(&mut self) -> Result<(), HostError> {
        self.flags.remove(HciEventFlags::REMOTE_NAME_COMPLETE);
        self.send_command(&HciCommand::RemoteNameRequest {
            addr: self.context.peer_addr,
        })
    }

    fn hci_authentication_request(&mut self) -> Result<(), HostError> {
        self.send_command(&HciCommand::AuthenticationRequested {
            handle: self.context.handle,
        })
    }

    /// Requests disconnection of the current link. The engine finishes its
    /// own cleanup when the disconnection complete event arrives.
    pub fn hci_disconnect(&mut self) -> Result<(), HostError> {
        self.flags.remove(HciEventFlags::DISCONNECT_COMPLETE);
        self.send_command(&HciCommand::Disconnect {
            handle: self.context.handle,
        })
    }

    // ---- event handling ----

    /// Processes one raw event packet (code, length, parameters).
    pub fn on_event(&mut self, packet: &[u8]) -> Result<(), HostError> {
        let event = match HciEvent::parse(packet) {
            Some(event) => event,
            None => {
                warn!("Malformed HCI event dropped: {}", hex::encode(packet));
                return Ok(());
            }
        };
        match event.code() {
            EVT_CMD_COMPLETE => self.on_command_complete(packet),

            EVT_CMD_STATUS => {
                if packet.len() >= 6 && packet[2] != 0 {
                    warn!(
                        "Command 0x{:02X}{:02X} returned status 0x{:02X}",
                        packet[5], packet[4], packet[2]
                    );
                }
                Ok(())
            }

            EVT_INQUIRY_COMPLETE => {
                if self.inquiry_count >= INQUIRY_GIVE_UP_ROUNDS
                    && (self.pair_with_wii || self.pair_with_hid)
                {
                    self.inquiry_count = 0;
                    if self.pair_with_wii {
                        info!("Couldn't find Wiimote");
                    } else {
                        info!("Couldn't find HID device");
                    }
                    self.connect_to_wii = false;
                    self.pair_with_wii = false;
                    self.connect_to_hid = false;
                    self.pair_with_hid = false;
                    self.state = HciState::Scanning;
                }
                self.inquiry_count = self.inquiry_count.saturating_add(1);
                Ok(())
            }

            EVT_INQUIRY_RESULT => self.on_inquiry_result(packet, false),
            EVT_EXTENDED_INQUIRY_RESULT => self.on_inquiry_result(packet, true),

            EVT_CONN_COMPLETE => {
                if packet.len() < 5 {
                    return Ok(());
                }
                self.flags.insert(HciEventFlags::CONNECT_EVENT);
                if packet[2] == 0 {
                    self.context.handle =
                        packet[3] as u16 | (((packet[4] & 0x0F) as u16) << 8);
                    self.flags.insert(HciEventFlags::CONNECT_COMPLETE);
                    debug!("Connection established, handle 0x{:03X}", self.context.handle);
                } else {
                    warn!("Connection attempt failed, status 0x{:02X}", packet[2]);
                    self.state = HciState::CheckDeviceService;
                }
                Ok(())
            }

            EVT_CONN_REQUEST => {
                if packet.len() < 11 {
                    return Ok(());
                }
                let mut addr = [0u8; 6];
                addr.copy_from_slice(&packet[2..8]);
                self.context.peer_addr = BdAddr::new(addr);
                self.context.class_of_device =
                    ClassOfDevice::new([packet[8], packet[9], packet[10]]);
                if self.context.class_of_device.is_hid_candidate() {
                    self.context.incoming_hid = true;
                }
                debug!(
                    "Incoming connection from {} (class {})",
                    self.context.peer_addr,
                    hex::encode(self.context.class_of_device.bytes)
                );
                self.flags.insert(HciEventFlags::INCOMING_REQUEST);
                Ok(())
            }

            EVT_DISCONN_COMPLETE => {
                if event.status() == Some(0) {
                    self.flags.insert(HciEventFlags::DISCONNECT_COMPLETE);
                    self.flags.remove(HciEventFlags::CONNECT_COMPLETE);
                }
                Ok(())
            }

            EVT_AUTH_COMPLETE => match event.status() {
                Some(0) => {
                    // pairing done, let the service open its channels
                    if self.pair_with_wii && !self.connect_to_wii {
                        self.connect_to_wii = true;
                    } else if self.pair_with_hid && !self.connect_to_hid {
                        self.connect_to_hid = true;
                    }
                    Ok(())
                }
                Some(status) => {
                    warn!("Pairing failed, status 0x{:02X}", status);
                    self.hci_disconnect()?;
                    self.state = HciState::Disconnect;
                    Ok(())
                }
                None => Ok(()),
            },

            EVT_REMOTE_NAME_COMPLETE => {
                if packet.len() >= 9 && event.status() == Some(0) {
                    self.context.remote_name = RemoteName::from_wire(&packet[9..]);
                    self.flags.insert(HciEventFlags::REMOTE_NAME_COMPLETE);
                }
                Ok(())
            }

            EVT_PIN_CODE_REQUEST => {
                if self.pair_with_wii {
                    info!("Pairing with Wiimote");
                    // the Wiimote PIN is a Bluetooth address: ours when the
                    // sync button starts the pairing, the Wiimote's own
                    // otherwise
                    let pin = if self.context.sync_button_pairing {
                        self.identity.bd_addr
                    } else {
                        self.context.peer_addr
                    };
                    self.send_command(&HciCommand::PinCodeReply {
                        addr: self.context.peer_addr,
                        pin: pin.as_slice().to_vec(),
                    })
                } else if let Some(pin) = self.config.pin_code.clone() {
                    debug!("Replying with the configured PIN");
                    self.send_command(&HciCommand::PinCodeReply {
                        addr: self.context.peer_addr,
                        pin: pin.into_bytes(),
                    })
                } else {
                    warn!("Peer requested a PIN but none is configured");
                    self.send_command(&HciCommand::PinCodeNegativeReply {
                        addr: self.context.peer_addr,
                    })
                }
            }

            EVT_LINK_KEY_REQUEST => {
                debug!("Rejecting link key request, forcing fresh pairing");
                self.send_command(&HciCommand::LinkKeyNegativeReply {
                    addr: self.context.peer_addr,
                })
            }

            EVT_IO_CAPABILITY_REQUEST => {
                debug!("Received IO capability request");
                self.send_command(&HciCommand::IoCapabilityReply {
                    addr: self.context.peer_addr,
                })
            }

            EVT_IO_CAPABILITY_RESPONSE => {
                if packet.len() >= 11 {
                    debug!(
                        "Peer IO capability 0x{:02X}, OOB 0x{:02X}, auth 0x{:02X}",
                        packet[8], packet[9], packet[10]
                    );
                }
                Ok(())
            }

            EVT_USER_CONFIRMATION_REQUEST => {
                if packet.len() >= 12 {
                    let value =
                        u32::from_le_bytes([packet[8], packet[9], packet[10], packet[11]]);
                    debug!("Auto-confirming user confirmation value {}", value);
                }
                self.send_command(&HciCommand::UserConfirmationReply {
                    addr: self.context.peer_addr,
                })
            }

            EVT_SIMPLE_PAIRING_COMPLETE => {
                match event.status() {
                    Some(0) => debug!("Simple pairing complete"),
                    Some(status) => warn!("Simple pairing failed, status 0x{:02X}", status),
                    None => {}
                }
                Ok(())
            }

            EVT_NUM_COMPLETED_PACKETS | EVT_MAX_SLOTS_CHANGE => Ok(()),

            EVT_ENCRYPTION_CHANGE
            | EVT_CHANGE_CONNECTION_LINK_KEY
            | EVT_READ_REMOTE_VERSION_COMPLETE
            | EVT_QOS_SETUP_COMPLETE
            | EVT_ROLE_CHANGE
            | EVT_LINK_KEY_NOTIFICATION
            | EVT_LOOPBACK_COMMAND
            | EVT_DATA_BUFFER_OVERFLOW
            | EVT_PAGE_SCAN_REP_MODE_CHANGE
            | EVT_READ_REMOTE_EXT_FEATURES_COMPLETE => {
                debug!("Ignoring HCI event 0x{:02X}", event.code());
                Ok(())
            }

            code => {
                debug!(
                    "Unmanaged HCI event 0x{:02X}: {}",
                    code,
                    hex::encode(event.parameters())
                );
                Ok(())
            }
        }
    }

    fn on_command_complete(&mut self, packet: &[u8]) -> Result<(), HostError> {
        if packet.len() < 6 {
            return Ok(());
        }
        if packet[5] != 0 {
            warn!(
                "Command 0x{:02X}{:02X} failed, status 0x{:02X}",
                packet[4], packet[3], packet[5]
            );
            return Ok(());
        }
        self.flags.insert(HciEventFlags::CMD_COMPLETE);
        match [packet[3], packet[4]] {
            // Read Local Version Information
            [0x01, 0x10] => {
                if packet.len() >= 7 {
                    self.identity.hci_version = packet[6];
                    self.flags.insert(HciEventFlags::READ_VERSION);
                }
            }
            // Read Local Extended Features, page 0 carries the Secure
            // Simple Pairing controller bit
            [0x04, 0x10] => {
                if !self.flags.contains(HciEventFlags::EXTENDED_FEATURES) {
                    if packet.len() >= 15 && packet[6] == 0 {
                        self.identity.simple_pairing_supported = packet[14] & (1 << 3) != 0;
                        debug!(
                            "Secure Simple Pairing supported: {}",
                            self.identity.simple_pairing_supported
                        );
                    }
                    self.flags.insert(HciEventFlags::EXTENDED_FEATURES);
                }
            }
            // Read BD_ADDR
            [0x09, 0x10] => {
                if packet.len() >= 12 {
                    let mut addr = [0u8; 6];
                    addr.copy_from_slice(&packet[6..12]);
                    self.identity.bd_addr = BdAddr::new(addr);
                    self.flags.insert(HciEventFlags::READ_BDADDR);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Scans one inquiry result batch for a peer matching the active
    /// pairing intent. The first match wins and ends the scan.
    fn on_inquiry_result(&mut self, packet: &[u8], extended: bool) -> Result<(), HostError> {
        if packet.len() < 3 || packet[2] == 0 {
            return Ok(());
        }
        if !self.pair_with_wii && !self.pair_with_hid {
            return Ok(());
        }
        let num = packet[2] as usize;
        // extended results carry one reserved byte per response, plain
        // results carry two
        let stride = if extended { 8 } else { 9 };
        for i in 0..num {
            let addr_base = 3 + 6 * i;
            let class_base = 3 + stride * num + 3 * i;
            if packet.len() < addr_base + 6 || packet.len() < class_base + 3 {
                break;
            }
            let class = ClassOfDevice::new([
                packet[class_base],
                packet[class_base + 1],
                packet[class_base + 2],
            ]);
            let wii_match = self.pair_with_wii && class.is_wii_candidate();
            let hid_match = self.pair_with_hid && class.is_hid_candidate();
            if !wii_match && !hid_match {
                continue;
            }

            let mut addr = [0u8; 6];
            addr.copy_from_slice(&packet[addr_base..addr_base + 6]);
            self.context.peer_addr = BdAddr::new(addr);
            self.context.class_of_device = class;

            if wii_match {
                info!("Found Wiimote at {}", self.context.peer_addr);
            } else {
                if class.is_mouse() {
                    info!("Found mouse at {}", self.context.peer_addr);
                }
                if class.is_keyboard() {
                    info!("Found keyboard at {}", self.context.peer_addr);
                }
                if class.is_gamepad() {
                    info!("Found gamepad at {}", self.context.peer_addr);
                }
            }

            self.check_remote_name = true;
            self.flags.insert(HciEventFlags::DEVICE_FOUND);
            break;
        }
        Ok(())
    }

    // ---- state machine ----

    /// Advances the state machine by one tick.
    pub fn step(&mut self) -> Result<(), HostError> {
        match self.state {
            HciState::Init => {
                self.counter += 1;
                if self.counter > self.reset_backoff {
                    self.counter = 0;
                    self.hci_reset()?;
                    self.state = HciState::Reset;
                }
            }

            HciState::Reset => {
                self.counter += 1;
                if self.flags.contains(HciEventFlags::CMD_COMPLETE) {
                    self.counter = 0;
                    debug!("HCI reset complete");
                    self.write_class_of_device()?;
                    self.state = HciState::WriteClassOfDevice;
                } else if self.counter > self.reset_backoff {
                    self.reset_backoff = (self.reset_backoff * 10).min(RESET_BACKOFF_MAX);
                    self.counter = 0;
                    warn!("No response to HCI reset");
                    self.state = HciState::Init;
                }
            }

            HciState::WriteClassOfDevice => {
                if self.flags.contains(HciEventFlags::CMD_COMPLETE) {
                    self.read_bdaddr()?;
                    self.state = HciState::ReadBdAddr;
                }
            }

            HciState::ReadBdAddr => {
                if self.flags.contains(HciEventFlags::READ_BDADDR) {
                    info!("Local Bluetooth address: {}", self.identity.bd_addr);
                    self.read_local_version()?;
                    self.state = HciState::ReadLocalVersion;
                }
            }

            HciState::ReadLocalVersion => {
                if self.flags.contains(HciEventFlags::READ_VERSION) {
                    if self.config.local_name.is_some() {
                        self.write_local_name()?;
                        self.state = HciState::WriteLocalName;
                    } else if self.config.use_simple_pairing {
                        self.read_extended_features(0)?;
                        self.state = HciState::ReadExtendedFeatures;
                    } else {
                        self.state = HciState::CheckDeviceService;
                    }
                }
            }

            HciState::WriteLocalName => {
                if self.flags.contains(HciEventFlags::CMD_COMPLETE) {
                    if let Some(name) = &self.config.local_name {
                        info!("Local name set to \"{}\"", name);
                    }
                    if self.config.use_simple_pairing {
                        self.read_extended_features(0)?;
                        self.state = HciState::ReadExtendedFeatures;
                    } else {
                        self.state = HciState::CheckDeviceService;
                    }
                }
            }

            HciState::ReadExtendedFeatures => {
                if self.flags.contains(HciEventFlags::EXTENDED_FEATURES) {
                    if self.identity.simple_pairing_supported {
                        info!("Enabling Secure Simple Pairing");
                        self.write_simple_pairing(true)?;
                        self.state = HciState::WriteSimplePairing;
                    } else {
                        debug!("Controller does not support Secure Simple Pairing");
                        self.state = HciState::CheckDeviceService;
                    }
                }
            }

            HciState::WriteSimplePairing => {
                if self.flags.contains(HciEventFlags::CMD_COMPLETE) {
                    self.set_event_mask()?;
                    self.state = HciState::SetEventMask;
                }
            }

            HciState::SetEventMask => {
                if self.flags.contains(HciEventFlags::CMD_COMPLETE) {
                    self.state = HciState::CheckDeviceService;
                }
            }

            HciState::CheckDeviceService => {
                if self.pair_with_hid || self.pair_with_wii {
                    info!("Starting inquiry, put the device in discoverable mode");
                    self.hci_inquiry()?;
                    self.state = HciState::Inquiry;
                } else {
                    self.state = HciState::Scanning;
                }
            }

            HciState::Inquiry => {
                if self.flags.contains(HciEventFlags::DEVICE_FOUND) {
                    self.hci_inquiry_cancel()?;
                    if self.check_remote_name {
                        self.hci_remote_name_request()?;
                        self.state = HciState::RemoteName;
                    } else {
                        self.state = HciState::ConnectDevice;
                    }
                }
            }

            HciState::ConnectDevice => {
                if self.flags.contains(HciEventFlags::CMD_COMPLETE) {
                    self.check_remote_name = false;
                    info!("Connecting to {}", self.context.peer_addr);
                    self.hci_create_connection()?;
                    self.state = HciState::ConnectedDevice;
                }
            }

            HciState::ConnectedDevice => {
                if self.flags.contains(HciEventFlags::CONNECT_EVENT) {
                    if self.flags.contains(HciEventFlags::CONNECT_COMPLETE) {
                        info!("Connected to {}", self.context.peer_addr);
                        self.hci_authentication_request()?;
                        self.state = HciState::Scanning;
                    } else {
                        // one retry per failed connect event
                        self.hci_create_connection()?;
                    }
                }
            }

            HciState::Scanning => {
                if !self.connect_to_wii
                    && !self.pair_with_wii
                    && !self.connect_to_hid
                    && !self.pair_with_hid
                {
                    debug!("Waiting for incoming connections");
                    self.write_scan_enable()?;
                    self.waiting_for_connection = true;
                    self.state = HciState::ConnectIn;
                }
            }

            HciState::ConnectIn => {
                if self.flags.contains(HciEventFlags::INCOMING_REQUEST) {
                    self.waiting_for_connection = false;
                    info!("Incoming connection from {}", self.context.peer_addr);
                    if self.context.class_of_device.is_playstation_gamepad() {
                        self.context.incoming_playstation = true;
                    }
                    if self.context.peer_addr == self.context.saved_addr {
                        // known peer, skip the name lookup
                        self.hci_accept_connection()?;
                        self.state = HciState::Connected;
                    } else {
                        self.hci_remote_name_request()?;
                        self.state = HciState::RemoteName;
                    }
                } else if self.flags.contains(HciEventFlags::DISCONNECT_COMPLETE) {
                    self.state = HciState::Disconnect;
                }
            }

            HciState::RemoteName => {
                if self.flags.contains(HciEventFlags::REMOTE_NAME_COMPLETE) {
                    info!("Remote name: {}", self.context.remote_name);
                    self.classify_remote_name();
                    if (self.pair_with_wii || self.pair_with_hid) && self.check_remote_name {
                        self.state = HciState::ConnectDevice;
                    } else {
                        self.hci_accept_connection()?;
                        self.state = HciState::Connected;
                    }
                }
            }

            HciState::Connected => {
                if self.flags.contains(HciEventFlags::CONNECT_COMPLETE) {
                    info!("Connected to {}", self.context.peer_addr);
                    if self.context.incoming_playstation {
                        self.connect_to_hid = true;
                    }
                    self.context.l2cap_claimed = false;
                    self.context.sdp_claimed = false;
                    self.context.rfcomm_claimed = false;
                    self.flags = HciEventFlags::empty();
                    self.state = HciState::Done;
                }
            }

            HciState::Done => {
                self.counter += 1;
                if self.counter > DONE_DWELL_TICKS {
                    self.counter = 0;
                    self.state = HciState::Scanning;
                }
            }

            HciState::Disconnect => {
                if self.flags.contains(HciEventFlags::DISCONNECT_COMPLETE) {
                    info!("Disconnected from {}", self.context.peer_addr);
                    self.flags = HciEventFlags::empty();
                    self.context.reset();
                    self.pair_with_wii = false;
                    self.connect_to_wii = false;
                    self.pair_with_hid = false;
                    self.connect_to_hid = false;
                    self.check_remote_name = false;
                    self.state = HciState::Scanning;
                }
            }
        }
        Ok(())
    }

    /// Classifies the peer from the name delivered by a Remote Name
    /// Request, ahead of accepting or connecting.
    fn classify_remote_name(&mut self) {
        if self.context.remote_name.starts_with(b"Nintendo") {
            self.context.incoming_wii = true;
            self.context.motion_plus = false;
            self.context.wii_u_pro = false;
            self.context.sync_button_pairing = false;
            if self.context.remote_name.starts_with(b"Nintendo RVL-CNT-01-TR") {
                // Wiimote Plus
                self.context.motion_plus = true;
            } else if self.context.remote_name.starts_with(b"Nintendo RVL-CNT-01-UC") {
                // Wii U Pro Controller
                self.context.wii_u_pro = true;
                self.context.motion_plus = true;
                self.context.sync_button_pairing = true;
            } else if self.context.remote_name.starts_with(b"Nintendo RVL-WBC-01") {
                // Balance Board
                self.context.sync_button_pairing = true;
            }
        }
        if self.context.class_of_device.is_playstation_gamepad()
            && self.context.remote_name.starts_with(b"Wireless Controller")
        {
            self.context.incoming_playstation = true;
        }
    }
}
