//! Host wiring and dispatch
//!
//! [`BluetoothHost`] owns the packet transport, the HCI engine, and the
//! service registry, and drives all three from a periodically scheduled
//! [`update`](BluetoothHost::update) call. Inbound packets arrive through
//! [`deliver`](BluetoothHost::deliver), which is safe to call from the
//! radio context.

use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::error::HostError;
use crate::hci::engine::{HciEngine, HciState};
use crate::l2cap::signaling::{acl_packet, signaling_packet, SignalingPdu};
use crate::service::{BluetoothService, ServiceRegistry};
use crate::transport::{InboundQueues, PacketTransport, RadioTransport, DEFAULT_QUEUE_DEPTH};
use crate::types::BdAddr;

/// Host configuration supplied at wiring time.
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    /// Local device name. When set, the bring-up writes it to the
    /// controller and inquiry scan is enabled alongside page scan.
    pub local_name: Option<String>,
    /// Static PIN offered when a peer requests legacy pairing and no
    /// device-specific rule applies.
    pub pin_code: Option<String>,
    /// Query the controller for Secure Simple Pairing and enable it.
    pub use_simple_pairing: bool,
}

/// Persistent storage for the one peer address remembered across
/// restarts. Loaded once at wiring time to seed silent reconnects; saved
/// when a different peer pairs or completes a connection.
pub trait AddressStore: Send {
    fn load(&mut self) -> Option<BdAddr>;
    fn save(&mut self, addr: BdAddr) -> Result<(), HostError>;
}

/// In-memory address store, for hosts without persistent storage.
#[derive(Debug, Default)]
pub struct MemoryAddressStore {
    addr: Option<BdAddr>,
}

impl MemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(addr: BdAddr) -> Self {
        Self { addr: Some(addr) }
    }
}

impl AddressStore for MemoryAddressStore {
    fn load(&mut self) -> Option<BdAddr> {
        self.addr
    }

    fn save(&mut self, addr: BdAddr) -> Result<(), HostError> {
        self.addr = Some(addr);
        Ok(())
    }
}

// Engine and registry share the dispatch lock: one drain-and-dispatch
// pass is atomic against any other invocation.
struct DispatchState {
    engine: HciEngine,
    registry: ServiceRegistry,
}

/// The wiring root: transport, engine, services, and persisted state.
pub struct BluetoothHost {
    transport: Arc<PacketTransport>,
    queues: Arc<InboundQueues>,
    dispatch: Mutex<DispatchState>,
    store: Mutex<Box<dyn AddressStore>>,
}

impl BluetoothHost {
    pub fn new(
        radio: impl RadioTransport + 'static,
        config: HostConfig,
        store: impl AddressStore + 'static,
    ) -> Self {
        let mut store: Box<dyn AddressStore> = Box::new(store);
        let transport = Arc::new(PacketTransport::new(radio));
        let mut engine = HciEngine::new(transport.clone(), config);
        if let Some(addr) = store.load() {
            info!("Reconnect candidate loaded: {}", addr);
            engine.set_saved_address(addr);
        }
        Self {
            transport,
            queues: Arc::new(InboundQueues::new(DEFAULT_QUEUE_DEPTH)),
            dispatch: Mutex::new(DispatchState {
                engine,
                registry: ServiceRegistry::new(),
            }),
            store: Mutex::new(store),
        }
    }

    /// The inbound queue pair, for radio glue that delivers packets
    /// without holding a host reference.
    pub fn queues(&self) -> Arc<InboundQueues> {
        self.queues.clone()
    }

    /// Delivers one raw packet from the radio, leading type byte
    /// included. Never blocks; a full queue drops the packet.
    pub fn deliver(&self, packet: &[u8]) {
        self.queues.deliver(packet);
    }

    /// The shared outbound send path.
    pub fn transport(&self) -> Arc<PacketTransport> {
        self.transport.clone()
    }

    /// Registers a consumer service, returning its slot index.
    pub fn register_service(
        &self,
        service: Box<dyn BluetoothService>,
    ) -> Result<usize, HostError> {
        self.dispatch.lock().unwrap().registry.register(service)
    }

    /// Invokes every registered service's reset hook.
    pub fn reset_services(&self) {
        self.dispatch.lock().unwrap().registry.reset_all();
    }

    /// Starts discovery and pairing of a Wiimote.
    pub fn pair_with_wiimote(&self) {
        self.dispatch.lock().unwrap().engine.pair_with_wiimote();
    }

    /// Starts discovery and pairing of a generic HID device.
    pub fn pair_with_hid_device(&self) {
        self.dispatch.lock().unwrap().engine.pair_with_hid_device();
    }

    pub fn state(&self) -> HciState {
        self.dispatch.lock().unwrap().engine.state()
    }

    pub fn peer_address(&self) -> BdAddr {
        self.dispatch.lock().unwrap().engine.peer_address()
    }

    pub fn waiting_for_connection(&self) -> bool {
        self.dispatch.lock().unwrap().engine.waiting_for_connection()
    }

    /// Runs a closure with the engine locked, for state inspection,
    /// channel claims, and intent updates.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut HciEngine) -> T) -> T {
        f(&mut self.dispatch.lock().unwrap().engine)
    }

    /// Sends an L2CAP signaling PDU over the current connection.
    pub fn send_signaling(&self, pdu: &SignalingPdu) -> Result<(), HostError> {
        let handle = self.dispatch.lock().unwrap().engine.connection_handle();
        self.transport.send_acl(&signaling_packet(handle, pdu))
    }

    /// Sends a raw L2CAP payload on the given channel of the current
    /// connection.
    pub fn send_channel(&self, channel: u16, payload: &[u8]) -> Result<(), HostError> {
        let handle = self.dispatch.lock().unwrap().engine.connection_handle();
        self.transport.send_acl(&acl_packet(handle, channel, payload))
    }

    /// Tears down the active connection: every service is told first,
    /// then the link-level disconnect goes out. The engine finishes its
    /// cleanup when the disconnection complete event arrives.
    pub fn disconnect(&self) -> Result<(), HostError> {
        let mut state = self.dispatch.lock().unwrap();
        state.registry.disconnect_all();
        state.engine.hci_disconnect()
    }

    /// One dispatch pass: drain the inbound queues into the event handler
    /// and the service broadcast, stepping the engine and ticking the
    /// services along the way. Repeats while either queue yields data and
    /// returns once both are empty, so a scheduler can call this on a
    /// fixed cadence without falling behind a bursty radio.
    pub fn update(&self) -> Result<(), HostError> {
        let mut state = self.dispatch.lock().unwrap();
        loop {
            let event = self.queues.events.try_pop();
            if let Some(packet) = &event {
                state.engine.on_event(packet)?;
            }
            state.engine.step()?;
            self.save_newly_paired(&mut state.engine);

            let acl = self.queues.acl.try_pop();
            if let Some(packet) = &acl {
                state.registry.broadcast_acl(packet);
            }
            state.registry.tick_all();

            if event.is_none() && acl.is_none() {
                return Ok(());
            }
        }
    }

    /// Once a peer other than the remembered one settles an accepted
    /// connection or finishes pairing (authentication promotes the
    /// pairing intent), persist it and reseed the reconnect match.
    fn save_newly_paired(&self, engine: &mut HciEngine) {
        let paired = engine.state() == HciState::Done
            || engine.connect_to_wii()
            || engine.connect_to_hid_device();
        if !paired {
            return;
        }
        let peer = engine.peer_address();
        if peer.is_zero() || peer == engine.saved_address() {
            return;
        }
        match self.store.lock().unwrap().save(peer) {
            Ok(()) => info!("Remembering {} for automatic reconnection", peer),
            Err(err) => warn!("Could not persist peer address: {}", err),
        }
        engine.set_saved_address(peer);
    }
}
