//! Attribute service: the measurement and period characteristics of one
//! sensor service, and the callbacks wiring them to the scheduler.
//!
//! The scheduler talks to the transport through [`AttributeService`];
//! the transport talks back through [`AttributeHandler`]. The handler is
//! wired late via [`LocalAttributeServer::set_handler`], once the
//! scheduler exists.

use super::uuid::{MEASUREMENT_PERIOD, sfe_uuid};
use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Weak;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Characteristic properties.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Properties {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

impl Properties {
    pub const READ_NOTIFY: Self = Self {
        read: true,
        write: false,
        notify: true,
    };

    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
        notify: false,
    };
}

/// One characteristic of a sensor service.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacteristicDef {
    pub uuid: Uuid,
    pub properties: Properties,
    /// Fixed value length in bytes.
    pub len: usize,
}

/// Attribute table for one sensor service.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceDefinition {
    pub name: &'static str,
    pub service_uuid: Uuid,
    pub measurement: CharacteristicDef,
    pub period: CharacteristicDef,
}

impl ServiceDefinition {
    /// Service with a notifiable measurement of `measurement_len` bytes and
    /// the shared 4-byte period characteristic.
    pub fn new(
        name: &'static str,
        service: u16,
        measurement: u16,
        measurement_len: usize,
    ) -> Self {
        Self {
            name,
            service_uuid: sfe_uuid(service),
            measurement: CharacteristicDef {
                uuid: sfe_uuid(measurement),
                properties: Properties::READ_NOTIFY,
                len: measurement_len,
            },
            period: CharacteristicDef {
                uuid: sfe_uuid(MEASUREMENT_PERIOD),
                properties: Properties::READ_WRITE,
                len: 4,
            },
        }
    }
}

/// A value pushed to the subscribed observer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub characteristic: Uuid,
    pub data: Vec<u8>,
}

/// Outbound side of the attribute service, used by the scheduler.
pub trait AttributeService: Send + Sync {
    /// Push a measurement to the observer. Returns false if nothing was sent.
    fn notify(&self, data: &[u8]) -> bool;

    /// Mirror the scheduler's period into the readable period attribute.
    fn set_period_value(&self, period_ms: i32);
}

/// Inbound callbacks from the attribute service.
#[async_trait]
pub trait AttributeHandler: Send + Sync {
    /// The observer enabled or disabled notifications.
    async fn on_subscription_change(&self, subscribed: bool);

    /// The observer wrote raw bytes to the period characteristic.
    async fn on_period_write(&self, data: &[u8]);
}

/// In-process attribute table for one sensor service.
///
/// Holds the period and measurement values, the client's notification
/// enable flag, and forwards notifications on a channel.
pub struct LocalAttributeServer {
    definition: ServiceDefinition,
    period: AtomicI32,
    measurement: RwLock<Vec<u8>>,
    notifications_enabled: AtomicBool,
    tx: mpsc::UnboundedSender<Notification>,
    /// Set after scheduler construction via `set_handler()`.
    handler: RwLock<Option<Weak<dyn AttributeHandler>>>,
}

impl LocalAttributeServer {
    pub fn new(
        definition: ServiceDefinition,
        default_period_ms: i32,
        tx: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        // Zero-fill so a read before the first sample is well defined
        let measurement = vec![0u8; definition.measurement.len];
        Self {
            definition,
            period: AtomicI32::new(default_period_ms),
            measurement: RwLock::new(measurement),
            notifications_enabled: AtomicBool::new(false),
            tx,
            handler: RwLock::new(None),
        }
    }

    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    /// Wire the callbacks for client writes.
    pub fn set_handler(&self, handler: Weak<dyn AttributeHandler>) {
        *self.handler.write() = Some(handler);
    }

    fn handler(&self) -> Option<std::sync::Arc<dyn AttributeHandler>> {
        self.handler.read().as_ref().and_then(Weak::upgrade)
    }

    /// Client wrote the measurement CCCD.
    pub async fn write_cccd(&self, enabled: bool) {
        let previous = self.notifications_enabled.swap(enabled, Ordering::SeqCst);
        debug!(
            "[{}] notifications {} (was {})",
            self.definition.name,
            if enabled { "enabled" } else { "disabled" },
            previous
        );
        if let Some(handler) = self.handler() {
            handler.on_subscription_change(enabled).await;
        }
    }

    /// Client wrote the period characteristic.
    pub async fn write_period(&self, data: &[u8]) {
        if data.len() != self.definition.period.len {
            warn!(
                "[{}] period write of {} bytes, expected {}",
                self.definition.name,
                data.len(),
                self.definition.period.len
            );
        }
        if let Some(handler) = self.handler() {
            handler.on_period_write(data).await;
        }
    }

    /// Client read of the period characteristic.
    pub fn read_period(&self) -> i32 {
        self.period.load(Ordering::SeqCst)
    }

    /// Client read of the measurement characteristic.
    pub fn read_measurement(&self) -> Vec<u8> {
        self.measurement.read().clone()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled.load(Ordering::SeqCst)
    }
}

impl AttributeService for LocalAttributeServer {
    fn notify(&self, data: &[u8]) -> bool {
        *self.measurement.write() = data.to_vec();

        if !self.notifications_enabled() {
            return false;
        }

        let notification = Notification {
            characteristic: self.definition.measurement.uuid,
            data: data.to_vec(),
        };
        if self.tx.send(notification).is_err() {
            debug!("[{}] notification receiver gone", self.definition.name);
            return false;
        }
        true
    }

    fn set_period_value(&self, period_ms: i32) {
        self.period.store(period_ms, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::uuid::{BME280_DATA, BME280_SERVICE};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn definition() -> ServiceDefinition {
        ServiceDefinition::new("test", BME280_SERVICE, BME280_DATA, 12)
    }

    #[derive(Default)]
    struct RecordingHandler {
        subscriptions: Mutex<Vec<bool>>,
        writes: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl AttributeHandler for RecordingHandler {
        async fn on_subscription_change(&self, subscribed: bool) {
            self.subscriptions.lock().push(subscribed);
        }

        async fn on_period_write(&self, data: &[u8]) {
            self.writes.lock().push(data.to_vec());
        }
    }

    #[test]
    fn test_definition_layout() {
        let def = definition();
        assert_eq!(def.measurement.len, 12);
        assert_eq!(def.measurement.properties, Properties::READ_NOTIFY);
        assert_eq!(def.period.len, 4);
        assert!(def.period.properties.write);
        assert_eq!(def.period.uuid, sfe_uuid(MEASUREMENT_PERIOD));
    }

    #[test]
    fn test_initial_values() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let server = LocalAttributeServer::new(definition(), 1000, tx);
        assert_eq!(server.read_period(), 1000);
        assert_eq!(server.read_measurement(), vec![0u8; 12]);
        assert!(!server.notifications_enabled());
    }

    #[test]
    fn test_notify_requires_enabled_cccd() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let server = LocalAttributeServer::new(definition(), 1000, tx);

        assert!(!server.notify(&[1, 2, 3]));
        assert!(rx.try_recv().is_err());
        // Value is still updated for reads
        assert_eq!(server.read_measurement(), vec![1, 2, 3]);

        server.notifications_enabled.store(true, Ordering::SeqCst);
        assert!(server.notify(&[4, 5, 6]));
        let notification = rx.try_recv().unwrap();
        assert_eq!(notification.data, vec![4, 5, 6]);
        assert_eq!(notification.characteristic, sfe_uuid(BME280_DATA));
    }

    #[tokio::test]
    async fn test_client_writes_reach_handler() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let server = LocalAttributeServer::new(definition(), 1000, tx);
        let handler = Arc::new(RecordingHandler::default());
        let weak = Arc::downgrade(&handler);
        let weak: Weak<dyn AttributeHandler> = weak;
        server.set_handler(weak);

        server.write_cccd(true).await;
        server.write_period(&250i32.to_le_bytes()).await;
        server.write_cccd(false).await;

        assert!(!server.notifications_enabled());
        assert_eq!(*handler.subscriptions.lock(), vec![true, false]);
        assert_eq!(*handler.writes.lock(), vec![vec![0xFA, 0, 0, 0]]);
    }

    #[tokio::test]
    async fn test_dropped_handler_is_ignored() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let server = LocalAttributeServer::new(definition(), 1000, tx);
        let handler = Arc::new(RecordingHandler::default());
        let weak = Arc::downgrade(&handler);
        let weak: Weak<dyn AttributeHandler> = weak;
        server.set_handler(weak);
        drop(handler);

        server.write_cccd(true).await;
        assert!(server.notifications_enabled());
    }
}
