//! Raw HCI socket transport
//!
//! A wrapper around the Linux raw HCI socket interface, usable as the
//! radio side of the packet transport: `transmit` writes complete packets
//! and `read_packet` hands back inbound packets with their leading type
//! byte for queue delivery.

use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use crate::error::HostError;
use crate::transport::RadioTransport;

// Bluetooth socket constants
const AF_BLUETOOTH: i32 = 31;
const BTPROTO_HCI: i32 = 1;
const HCI_CHANNEL_RAW: i32 = 0;

// Largest inbound packet: type byte + ACL header + 1021-byte payload
const READ_BUF_LEN: usize = 1026;

/// A raw HCI socket bound to a local controller.
#[derive(Debug)]
pub struct HciSocket {
    fd: RawFd,
}

// Define the sockaddr_hci structure
#[repr(C)]
struct SockaddrHci {
    hci_family: libc::sa_family_t,
    hci_dev: u16,
    hci_channel: u16,
}

impl HciSocket {
    /// Gets the raw file descriptor for the socket
    pub fn as_raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Opens a raw HCI socket bound to the given device
    ///
    /// # Arguments
    ///
    /// * `dev_id` - The device ID to open (0 for the first device)
    pub fn open(dev_id: u16) -> Result<Self, HostError> {
        let fd = unsafe { libc::socket(AF_BLUETOOTH, libc::SOCK_RAW, BTPROTO_HCI) };

        if fd < 0 {
            return Err(HostError::SocketError(std::io::Error::last_os_error()));
        }

        // Bind to the specified device
        let addr = SockaddrHci {
            hci_family: AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev_id,
            hci_channel: HCI_CHANNEL_RAW as u16,
        };

        let result = unsafe {
            libc::bind(
                fd,
                &addr as *const _ as *const libc::sockaddr,
                std::mem::size_of::<SockaddrHci>() as libc::socklen_t,
            )
        };

        if result < 0 {
            unsafe { libc::close(fd) };
            return Err(HostError::BindError(std::io::Error::last_os_error()));
        }

        Ok(HciSocket { fd })
    }

    /// Reads one inbound packet, blocking until the controller delivers
    /// one. The returned buffer keeps its leading packet-type byte so it
    /// can be handed straight to `InboundQueues::deliver`.
    pub fn read_packet(&self) -> Result<Vec<u8>, HostError> {
        let mut buffer = [0u8; READ_BUF_LEN];

        let bytes_read = unsafe {
            libc::read(
                self.fd,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len(),
            )
        };

        if bytes_read < 0 {
            return Err(HostError::ReceiveError(std::io::Error::last_os_error()));
        }

        if bytes_read < 2 {
            return Err(HostError::InvalidPacketFormat);
        }

        Ok(buffer[..bytes_read as usize].to_vec())
    }

    /// Reads one inbound packet, waiting at most `timeout` for the
    /// controller. `None` blocks like `read_packet`.
    pub fn read_packet_timeout(&self, timeout: Option<Duration>) -> Result<Vec<u8>, HostError> {
        if let Some(timeout) = timeout {
            // Set up the fd_set for select()
            let mut read_fds: libc::fd_set = unsafe { std::mem::zeroed() };
            unsafe {
                libc::FD_ZERO(&mut read_fds);
                libc::FD_SET(self.fd, &mut read_fds);
            }

            let mut timeout_val = libc::timeval {
                tv_sec: timeout.as_secs() as libc::time_t,
                tv_usec: timeout.subsec_micros() as libc::suseconds_t,
            };

            // Wait for data to be available
            let result = unsafe {
                libc::select(
                    self.fd + 1,
                    &mut read_fds,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                    &mut timeout_val,
                )
            };

            if result < 0 {
                return Err(HostError::ReceiveError(std::io::Error::last_os_error()));
            }

            if result == 0 {
                return Err(HostError::ReceiveError(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "Timed out waiting for HCI packet",
                )));
            }
        }

        self.read_packet()
    }
}

impl RadioTransport for HciSocket {
    /// Writes one complete packet (type byte included) to the controller.
    fn transmit(&self, packet: &[u8]) -> Result<(), HostError> {
        match unsafe {
            libc::write(
                self.fd,
                packet.as_ptr() as *const libc::c_void,
                packet.len(),
            )
        } {
            -1 => Err(HostError::SendError(std::io::Error::last_os_error())),
            _ => Ok(()),
        }
    }
}

impl AsRawFd for HciSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for HciSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
