//! Attribute-based sensor notification services.
//!
//! Each service exposes a notifiable measurement characteristic and a
//! writable period characteristic. The [`NotificationScheduler`] decides
//! from the period and the observer's subscription when to sample and
//! when to notify.

pub mod attribute;
pub mod scheduler;
pub mod sensor_service;
pub mod timer;
pub mod uuid;

pub use attribute::{
    AttributeHandler, AttributeService, LocalAttributeServer, Notification, ServiceDefinition,
};
pub use scheduler::{CycleOutcome, NotificationScheduler, SchedulerConfig, SchedulingMode};
pub use sensor_service::SensorService;
pub use timer::{IntervalTimer, Timer, TimerHandler};
