//! Example: Pairing with a Wiimote
//!
//! Discovers a Wiimote in pairing mode, pairs with it, and opens the two
//! HID channels it expects. Put the Wiimote in discoverable mode by
//! pressing 1+2 (or the red sync button next to the batteries) before
//! running.

use padlink::l2cap::constants::{PSM_HID_CONTROL, PSM_HID_INTERRUPT};
use padlink::{
    BluetoothHost, BluetoothService, HciSocket, HostConfig, MemoryAddressStore, SignalingPdu,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct ReportPrinter;

impl BluetoothService for ReportPrinter {
    fn on_acl_data(&mut self, data: &[u8]) {
        println!("Report ({} bytes): {:02X?}", data.len(), data);
    }

    fn on_tick(&mut self) {}

    fn on_reset(&mut self) {}

    fn on_disconnect(&mut self) {
        println!("Wiimote disconnected");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Wiimote Pairing Example");
    println!("-----------------------");

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

    let host = Arc::new(BluetoothHost::new(
        socket.clone(),
        HostConfig::default(),
        MemoryAddressStore::new(),
    ));
    host.register_service(Box::new(ReportPrinter))?;

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

    println!("Press 1+2 or the sync button on the Wiimote now...");
    host.pair_with_wiimote();

    let mut identifier: u8 = 1;
    let started = Instant::now();

    while started.elapsed() < Duration::from_secs(60) {
        host.update()?;

        if host.with_engine(|engine| engine.connect_to_wii()) {
            let (peer, name) = host.with_engine(|engine| {
                (
                    engine.peer_address(),
                    engine.context().remote_name.to_string(),
                )
            });
            println!("Paired with \"{}\" at {}", name, peer);

            // The Wiimote expects the host to open both HID channels
            println!("Opening HID control channel (PSM 0x0011)...");
            host.send_signaling(&SignalingPdu::ConnectionRequest {
                identifier,
                psm: PSM_HID_CONTROL,
                scid: 0x0040,
            })?;
            identifier = identifier.wrapping_add(1);

            println!("Opening HID interrupt channel (PSM 0x0013)...");
            host.send_signaling(&SignalingPdu::ConnectionRequest {
                identifier,
                psm: PSM_HID_INTERRUPT,
                scid: 0x0041,
            })?;
            identifier = identifier.wrapping_add(1);

            host.with_engine(|engine| engine.clear_connect_to_wii());
            println!("Watching for input reports...");
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
