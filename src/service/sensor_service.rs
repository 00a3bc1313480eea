//! One sensor service: attribute table, timer and scheduler wired together.

use super::attribute::{
    AttributeHandler, LocalAttributeServer, Notification, ServiceDefinition,
};
use super::scheduler::{NotificationScheduler, SchedulerConfig, SubscriptionHook};
use super::timer::{IntervalTimer, TimerHandler};
use super::uuid::{BME280_DATA, BME280_SERVICE, ISM330DHCX_DATA, ISM330DHCX_SERVICE};
use crate::config::{SensorConfig, ServiceConfig};
use crate::error::{Result, ServiceError};
use crate::sensors::{
    Bme280Driver, Bme280Sensor, DirectSensor, Ism330dhcxDriver, Ism330dhcxSensor, SampleSource,
};
use log::info;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;

pub type ServiceScheduler = NotificationScheduler<IntervalTimer, LocalAttributeServer>;

/// A running sensor service.
///
/// Dropping the service stops its timer task.
pub struct SensorService {
    attributes: Arc<LocalAttributeServer>,
    scheduler: Arc<ServiceScheduler>,
}

impl SensorService {
    /// Build and wire a service. Must be called from within a tokio runtime.
    ///
    /// Fails if the source's reading length does not match the
    /// measurement characteristic.
    pub fn start(
        definition: ServiceDefinition,
        source: SampleSource,
        default_period_ms: i32,
        service: &ServiceConfig,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Result<Self> {
        if source.capacity() != definition.measurement.len {
            return Err(ServiceError::InvalidConfig(format!(
                "{}: source produces {} bytes, measurement holds {}",
                definition.name,
                source.capacity(),
                definition.measurement.len
            )));
        }

        let source = source.with_ready_wait(
            Duration::from_millis(service.ready_poll_ms),
            service.ready_timeout_ms.map(Duration::from_millis),
        );
        for field in source.describe() {
            info!(
                "[{}] {} {} (id {}): {}..{} {}, resolution {}",
                definition.name,
                field.name,
                field.field,
                field.sensor_id,
                field.min_value,
                field.max_value,
                field.field.unit(),
                field.resolution
            );
        }

        let name = definition.name;
        let attributes = Arc::new(LocalAttributeServer::new(
            definition,
            default_period_ms,
            notifications,
        ));
        let config = SchedulerConfig {
            name,
            default_period_ms,
            base_interval_ms: service.base_interval_ms,
        };

        let scheduler = Arc::new_cyclic(|weak: &Weak<ServiceScheduler>| {
            let handler: Weak<dyn TimerHandler> = weak.clone();
            let timer = IntervalTimer::spawn(config.initial_interval_ms(), handler);
            NotificationScheduler::new(source, timer, attributes.clone(), config)
        });
        let weak = Arc::downgrade(&scheduler);
        let handler: Weak<dyn AttributeHandler> = weak;
        attributes.set_handler(handler);

        info!(
            "[{}] service {} started (period {} ms)",
            name,
            attributes.definition().service_uuid,
            default_period_ms
        );

        Ok(Self {
            attributes,
            scheduler,
        })
    }

    /// BME280 environmental service: temperature, pressure, humidity.
    pub fn environmental<D: Bme280Driver + 'static>(
        driver: D,
        sensor: &SensorConfig,
        service: &ServiceConfig,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Result<Self> {
        let sensor_impl = Bme280Sensor::new(driver, sensor.sensor_id);
        let definition = ServiceDefinition::new(
            "BME280",
            BME280_SERVICE,
            BME280_DATA,
            sensor_impl.reading_len(),
        );
        let source = SampleSource::direct(Arc::new(sensor_impl));
        Self::start(
            definition,
            source,
            sensor.default_period_ms,
            service,
            notifications,
        )
    }

    /// ISM330DHCX motion service: acceleration and angular rate.
    pub fn motion<D: Ism330dhcxDriver + 'static>(
        driver: D,
        sensor: &SensorConfig,
        service: &ServiceConfig,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Result<Self> {
        let sensor_impl = Ism330dhcxSensor::new(driver, sensor.sensor_id);
        let definition = ServiceDefinition::new(
            "ISM330DHCX",
            ISM330DHCX_SERVICE,
            ISM330DHCX_DATA,
            sensor_impl.reading_len(),
        );
        let source = SampleSource::direct(Arc::new(sensor_impl));
        Self::start(
            definition,
            source,
            sensor.default_period_ms,
            service,
            notifications,
        )
    }

    pub fn definition(&self) -> &ServiceDefinition {
        self.attributes.definition()
    }

    /// Client-facing attribute table.
    pub fn attributes(&self) -> &Arc<LocalAttributeServer> {
        &self.attributes
    }

    pub fn scheduler(&self) -> &Arc<ServiceScheduler> {
        &self.scheduler
    }

    /// Set the period locally, as if the observer had written it.
    pub fn set_period(&self, period_ms: i32) {
        self.scheduler.set_period(period_ms);
    }

    pub fn set_subscription_hook(&self, hook: SubscriptionHook) {
        self.scheduler.set_subscription_hook(hook);
    }
}
