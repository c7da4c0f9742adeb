//! Example: Hosting incoming controller connections
//!
//! This example wires up a Bluetooth host that accepts incoming
//! connections from already-paired controllers, printing state changes
//! and incoming ACL traffic.

use padlink::{
    BluetoothHost, BluetoothService, HciSocket, HostConfig, MemoryAddressStore,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct PrintingService;

impl BluetoothService for PrintingService {
    fn on_acl_data(&mut self, data: &[u8]) {
        println!("ACL data ({} bytes): {:02X?}", data.len(), data);
    }

    fn on_tick(&mut self) {}

    fn on_reset(&mut self) {
        println!("Services reset");
    }

    fn on_disconnect(&mut self) {
        println!("Link closed");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("PadLink Host Loop Example");
    println!("-------------------------");

    // Open HCI socket
    let socket = match HciSocket::open(0) {
        Ok(socket) => {
            println!("Successfully opened HCI socket");
            Arc::new(socket)
        }
        Err(err) => {
            eprintln!("Failed to open HCI socket: {}", err);
            eprintln!("Note: This example requires root/sudo privileges");
            return Err(err.into());
        }
    };

    let config = HostConfig {
        local_name: Some("PadLink".to_string()),
        pin_code: Some("0000".to_string()),
        use_simple_pairing: false,
    };
    let host = Arc::new(BluetoothHost::new(
        socket.clone(),
        config,
        MemoryAddressStore::new(),
    ));
    host.register_service(Box::new(PrintingService))?;

    // Pump inbound packets from the radio into the host queues
    let queues = host.queues();
    let reader = socket.clone();
    thread::spawn(move || loop {
        match reader.read_packet_timeout(Some(Duration::from_millis(50))) {
            Ok(packet) => queues.deliver(&packet),
            Err(err) => {
                if !err.to_string().contains("Timed out") {
                    eprintln!("Error reading packet: {}", err);
                }
            }
        }
    });

    println!("Running for 120 seconds. Connect a paired controller now.");

    let mut last_state = host.state();
    let started = Instant::now();

    while started.elapsed() < Duration::from_secs(120) {
        host.update()?;

        let state = host.state();
        if state != last_state {
            println!("HCI state: {:?}", state);
            last_state = state;
        }

        // A classified HID peer is ready once pairing finishes
        if host.with_engine(|engine| engine.connect_to_hid_device()) {
            println!("HID device ready for channel setup: {}", host.peer_address());
            host.with_engine(|engine| engine.clear_connect_to_hid_device());
        }

        thread::sleep(Duration::from_millis(1));
    }

    if !host.peer_address().is_zero() {
        println!("Disconnecting from {}...", host.peer_address());
        host.disconnect()?;
        for _ in 0..100 {
            host.update()?;
            thread::sleep(Duration::from_millis(1));
        }
    }

    println!("Example completed.");
    Ok(())
}
