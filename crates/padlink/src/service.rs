//! Consumer services
//!
//! Services consume the data stream of connected peers. The registry
//! broadcasts every inbound ACL payload to all registered services and
//! ticks each one once per dispatch pass; services filter the stream by
//! connection handle themselves (see
//! [`acl_handle_matches`](crate::l2cap::acl_handle_matches)).

use crate::error::HostError;

/// Number of service slots.
pub const MAX_SERVICES: usize = 4;

/// A consumer of a connected peer's traffic.
pub trait BluetoothService: Send {
    /// Handles one inbound ACL packet (ACL header included).
    fn on_acl_data(&mut self, data: &[u8]);

    /// Runs once per dispatch pass, after data delivery.
    fn on_tick(&mut self);

    /// Called when the host is reset.
    fn on_reset(&mut self);

    /// Called when the active connection is being torn down.
    fn on_disconnect(&mut self);
}

/// Fixed-capacity table of registered services. Registration fills the
/// first empty slot; there is no removal.
#[derive(Default)]
pub struct ServiceRegistry {
    slots: [Option<Box<dyn BluetoothService>>; MAX_SERVICES],
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service in the first empty slot, returning its index.
    pub fn register(&mut self, service: Box<dyn BluetoothService>) -> Result<usize, HostError> {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(service);
                return Ok(index);
            }
        }
        Err(HostError::RegistryFull(MAX_SERVICES))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    /// Hands one ACL payload to every registered service.
    pub fn broadcast_acl(&mut self, data: &[u8]) {
        for service in self.slots.iter_mut().flatten() {
            service.on_acl_data(data);
        }
    }

    /// Ticks every registered service once.
    pub fn tick_all(&mut self) {
        for service in self.slots.iter_mut().flatten() {
            service.on_tick();
        }
    }

    pub fn reset_all(&mut self) {
        for service in self.slots.iter_mut().flatten() {
            service.on_reset();
        }
    }

    pub fn disconnect_all(&mut self) {
        for service in self.slots.iter_mut().flatten() {
            service.on_disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Counters {
        acl: Arc<Mutex<Vec<Vec<u8>>>>,
        ticks: Arc<Mutex<usize>>,
        resets: Arc<Mutex<usize>>,
        disconnects: Arc<Mutex<usize>>,
    }

    struct CountingService {
        counters: Counters,
    }

    impl BluetoothService for CountingService {
        fn on_acl_data(&mut self, data: &[u8]) {
            self.counters.acl.lock().unwrap().push(data.to_vec());
        }

        fn on_tick(&mut self) {
            *self.counters.ticks.lock().unwrap() += 1;
        }

        fn on_reset(&mut self) {
            *self.counters.resets.lock().unwrap() += 1;
        }

        fn on_disconnect(&mut self) {
            *self.counters.disconnects.lock().unwrap() += 1;
        }
    }

    #[test]
    fn register_fills_slots_in_order() {
        let mut registry = ServiceRegistry::new();
        let counters = Counters::default();
        for expected in 0..MAX_SERVICES {
            let index = registry
                .register(Box::new(CountingService {
                    counters: counters.clone(),
                }))
                .unwrap();
            assert_eq!(index, expected);
        }
        assert_eq!(registry.len(), MAX_SERVICES);

        let overflow = registry.register(Box::new(CountingService {
            counters: counters.clone(),
        }));
        assert!(matches!(overflow, Err(HostError::RegistryFull(_))));
        assert_eq!(registry.len(), MAX_SERVICES);
    }

    #[test]
    fn broadcast_reaches_every_service() {
        let mut registry = ServiceRegistry::new();
        let a = Counters::default();
        let b = Counters::default();
        registry
            .register(Box::new(CountingService { counters: a.clone() }))
            .unwrap();
        registry
            .register(Box::new(CountingService { counters: b.clone() }))
            .unwrap();

        registry.broadcast_acl(&[0x01, 0x20, 0x05, 0x00]);
        registry.tick_all();
        registry.tick_all();

        assert_eq!(a.acl.lock().unwrap().len(), 1);
        assert_eq!(b.acl.lock().unwrap().len(), 1);
        assert_eq!(*a.ticks.lock().unwrap(), 2);
        assert_eq!(*b.ticks.lock().unwrap(), 2);
    }

    #[test]
    fn lifecycle_fanout() {
        let mut registry = ServiceRegistry::new();
        let counters = Counters::default();
        registry
            .register(Box::new(CountingService {
                counters: counters.clone(),
            }))
            .unwrap();

        registry.reset_all();
        registry.disconnect_all();

        assert_eq!(*counters.resets.lock().unwrap(), 1);
        assert_eq!(*counters.disconnects.lock().unwrap(), 1);
    }

    #[test]
    fn empty_registry_is_harmless() {
        let mut registry = ServiceRegistry::new();
        assert!(registry.is_empty());
        registry.broadcast_acl(&[0x00]);
        registry.tick_all();
        registry.reset_all();
        registry.disconnect_all();
    }
}
