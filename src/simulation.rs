//! Observer simulation for testing.
//!
//! Plays the client side of a sensor service: subscribes, rewrites the
//! measurement period through every mode, and unsubscribes, while logging
//! whatever gets notified.

use crate::sensors::Reading;
use crate::service::uuid::short_id;
use crate::service::{Notification, SensorService};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use uuid::Uuid;

/// One client action against a sensor service.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObserverAction {
    Subscribe,
    Unsubscribe,
    WritePeriod(i32),
    /// A malformed two-byte period write.
    WriteTruncated,
}

/// Actions the simulated observer cycles through, one per step.
pub const OBSERVER_SCRIPT: &[ObserverAction] = &[
    ObserverAction::Subscribe,
    ObserverAction::WritePeriod(0),
    ObserverAction::WritePeriod(250),
    ObserverAction::WriteTruncated,
    ObserverAction::WritePeriod(-1),
    ObserverAction::WritePeriod(1000),
    ObserverAction::Unsubscribe,
];

/// Apply one action through the service's client-facing attributes.
pub async fn apply(service: &SensorService, action: ObserverAction) {
    let attributes = service.attributes();
    match action {
        ObserverAction::Subscribe => attributes.write_cccd(true).await,
        ObserverAction::Unsubscribe => attributes.write_cccd(false).await,
        ObserverAction::WritePeriod(ms) => attributes.write_period(&ms.to_le_bytes()).await,
        ObserverAction::WriteTruncated => attributes.write_period(&[0x00, 0x01]).await,
    }
}

/// Spawn a task that walks the observer script against `service` forever,
/// one action every `step`.
///
/// # Returns
///
/// A `JoinHandle` that can be used to abort the simulation task.
pub fn run_observer_simulation(service: Arc<SensorService>, step: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = service.definition().name;
        let mut interval = interval(step);
        for &action in OBSERVER_SCRIPT.iter().cycle() {
            interval.tick().await;
            info!("[Sim] {} observer: {:?}", name, action);
            apply(&service, action).await;
            info!(
                "[Sim] {} period attribute now {} ms",
                name,
                service.attributes().read_period()
            );
        }
    })
}

/// Service name for a characteristic, else its short id, else the full UUID.
fn label(names: &HashMap<Uuid, &'static str>, characteristic: &Uuid) -> String {
    if let Some(name) = names.get(characteristic) {
        return name.to_string();
    }
    match short_id(characteristic) {
        Some(id) => format!("0x{:04X}", id),
        None => characteristic.to_string(),
    }
}

/// Spawn a task logging every notification as decoded float fields.
///
/// `names` maps measurement characteristic UUIDs to service names.
pub fn run_notification_logger(
    mut rx: mpsc::UnboundedReceiver<Notification>,
    names: HashMap<Uuid, &'static str>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            let name = label(&names, &notification.characteristic);
            let fields = Reading::from_bytes(notification.data).to_fields();
            let formatted = fields
                .iter()
                .map(|v| format!("{:.3}", v))
                .collect::<Vec<_>>()
                .join(", ");
            info!("[Sim] {} notified: [{}]", name, formatted);
        }
    })
}
