//! Transport capability between sessions and the radio.
//!
//! A [`Transport`] finds and connects one device for a metric, then hands
//! out its notification frames as a stream. [`BleTransport`] implements it
//! on top of btleplug; tests substitute scripted in-memory transports.

use crate::sensors::decoder::gatt_uuids;
use crate::sensors::types::{Metric, SensorError};
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;
use uuid::Uuid;

/// Raw notification frames from one characteristic.
pub type NotificationStream = BoxStream<'static, Vec<u8>>;

/// Device access used by a connection session.
pub trait Transport: Send {
    /// Discover a device for `metric`, connect, and start notifications.
    fn request_device(&mut self, metric: Metric) -> BoxFuture<'_, Result<(), SensorError>>;

    /// Stream of notification frames from the connected device.
    fn on_notification(&mut self) -> BoxFuture<'_, Result<NotificationStream, SensorError>>;

    /// Stop notifications and release the device.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<(), SensorError>>;
}

/// Device operations the BLE handshake relies on.
trait BleDevice: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, Result<(), SensorError>>;
    fn discover_services(&self) -> BoxFuture<'_, Result<(), SensorError>>;
    fn subscribe(&self, characteristic: Uuid) -> BoxFuture<'_, Result<(), SensorError>>;
    fn unsubscribe(&self, characteristic: Uuid) -> BoxFuture<'_, Result<(), SensorError>>;
    fn disconnect(&self) -> BoxFuture<'_, Result<(), SensorError>>;
}

/// Something that may be scanning for devices.
trait Scanner: Send + Sync {
    fn stop_scan(&self) -> BoxFuture<'_, ()>;
}

impl BleDevice for Peripheral {
    fn connect(&self) -> BoxFuture<'_, Result<(), SensorError>> {
        async move {
            btleplug::api::Peripheral::connect(self)
                .await
                .map_err(|e| SensorError::ConnectionFailed(e.to_string()))
        }
        .boxed()
    }

    fn discover_services(&self) -> BoxFuture<'_, Result<(), SensorError>> {
        async move {
            btleplug::api::Peripheral::discover_services(self)
                .await
                .map_err(|e| SensorError::ConnectionFailed(e.to_string()))
        }
        .boxed()
    }

    fn subscribe(&self, characteristic: Uuid) -> BoxFuture<'_, Result<(), SensorError>> {
        async move {
            let found = self
                .characteristics()
                .into_iter()
                .find(|c| c.uuid == characteristic)
                .ok_or_else(|| SensorError::CharacteristicNotFound(characteristic.to_string()))?;

            btleplug::api::Peripheral::subscribe(self, &found)
                .await
                .map_err(|e| SensorError::SubscriptionFailed(e.to_string()))
        }
        .boxed()
    }

    fn unsubscribe(&self, characteristic: Uuid) -> BoxFuture<'_, Result<(), SensorError>> {
        async move {
            let Some(found) = self
                .characteristics()
                .into_iter()
                .find(|c| c.uuid == characteristic)
            else {
                return Ok(());
            };

            btleplug::api::Peripheral::unsubscribe(self, &found)
                .await
                .map_err(|e| SensorError::BleError(e.to_string()))
        }
        .boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), SensorError>> {
        async move {
            btleplug::api::Peripheral::disconnect(self)
                .await
                .map_err(|e| SensorError::BleError(e.to_string()))
        }
        .boxed()
    }
}

impl Scanner for Adapter {
    fn stop_scan(&self) -> BoxFuture<'_, ()> {
        async move {
            if let Err(e) = Central::stop_scan(self).await {
                tracing::warn!("Failed to stop scanning: {}", e);
            }
        }
        .boxed()
    }
}

/// Radio resources held by a transport.
///
/// Each resource is recorded as soon as it is acquired, so [`Link::release`]
/// frees it even when a later handshake step fails or the handshake future
/// is dropped by a timeout.
struct Link<S, D> {
    /// Adapter with a scan in progress
    scanner: Option<S>,
    /// Device a connection was attempted on
    device: Option<D>,
    /// Characteristic with notifications enabled
    subscribed: Option<Uuid>,
}

impl<S: Scanner, D: BleDevice> Link<S, D> {
    fn new() -> Self {
        Self {
            scanner: None,
            device: None,
            subscribed: None,
        }
    }

    async fn stop_scan(&mut self) {
        if let Some(scanner) = self.scanner.take() {
            scanner.stop_scan().await;
        }
    }

    /// Connect `device` and enable notifications on `characteristic`.
    async fn open(&mut self, device: D, characteristic: Uuid) -> Result<(), SensorError> {
        let device = self.device.insert(device);
        device.connect().await?;
        device.discover_services().await?;
        device.subscribe(characteristic).await?;

        tracing::debug!("Subscribed to characteristic: {}", characteristic);
        self.subscribed = Some(characteristic);
        Ok(())
    }

    /// Stop scanning, notifications and the connection. Idempotent.
    async fn release(&mut self) -> Result<(), SensorError> {
        self.stop_scan().await;

        let Some(device) = self.device.take() else {
            return Ok(());
        };

        if let Some(characteristic) = self.subscribed.take() {
            if let Err(e) = device.unsubscribe(characteristic).await {
                tracing::warn!("Failed to stop notifications: {}", e);
            }
        }

        device.disconnect().await
    }
}

/// Transport backed by the first available BLE adapter.
pub struct BleTransport {
    /// Bound on discovery plus handshake
    discovery_timeout: Duration,
    link: Link<Adapter, Peripheral>,
}

impl BleTransport {
    /// Create a transport with the given discovery timeout.
    pub fn new(discovery_timeout: Duration) -> Self {
        Self {
            discovery_timeout,
            link: Link::new(),
        }
    }

    async fn first_adapter() -> Result<Adapter, SensorError> {
        let manager = Manager::new()
            .await
            .map_err(|e| SensorError::BleError(e.to_string()))?;

        let adapters = manager
            .adapters()
            .await
            .map_err(|e| SensorError::BleError(e.to_string()))?;

        adapters.into_iter().next().ok_or(SensorError::AdapterNotFound)
    }

    /// Scan until a peripheral advertising `metric`'s service shows up.
    ///
    /// The adapter is recorded in the link once scanning starts.
    async fn discover(
        &mut self,
        adapter: Adapter,
        metric: Metric,
    ) -> Result<Peripheral, SensorError> {
        let (service_uuid, _) = gatt_uuids(metric);

        let mut events = adapter
            .events()
            .await
            .map_err(|e| SensorError::BleError(e.to_string()))?;

        adapter
            .start_scan(ScanFilter {
                services: vec![service_uuid],
            })
            .await
            .map_err(|e| SensorError::BleError(e.to_string()))?;
        let adapter = self.link.scanner.insert(adapter);

        tracing::info!("Scanning for {} sensor", metric);

        while let Some(event) = events.next().await {
            let id = match event {
                CentralEvent::DeviceDiscovered(id)
                | CentralEvent::ServicesAdvertisement { id, .. } => id,
                _ => continue,
            };

            let Ok(peripheral) = adapter.peripheral(&id).await else {
                continue;
            };
            let Ok(Some(properties)) = peripheral.properties().await else {
                continue;
            };

            if properties.services.contains(&service_uuid) {
                tracing::info!(
                    "Found {} sensor: {}",
                    metric,
                    properties.local_name.as_deref().unwrap_or("Unknown Sensor")
                );
                return Ok(peripheral);
            }
        }

        Err(SensorError::SensorNotFound(metric))
    }

    async fn connect(&mut self, metric: Metric) -> Result<(), SensorError> {
        let adapter = Self::first_adapter().await?;
        let peripheral = self.discover(adapter, metric).await?;
        self.link.stop_scan().await;

        let (_, measurement_uuid) = gatt_uuids(metric);
        self.link.open(peripheral, measurement_uuid).await
    }
}

impl Transport for BleTransport {
    fn request_device(&mut self, metric: Metric) -> BoxFuture<'_, Result<(), SensorError>> {
        async move {
            let timeout = self.discovery_timeout;
            let result = match tokio::time::timeout(timeout, self.connect(metric)).await {
                Ok(result) => result,
                Err(_) => Err(SensorError::ConnectionTimeout),
            };

            if result.is_err() {
                if let Err(e) = self.link.release().await {
                    tracing::warn!("Failed to release {} sensor: {}", metric, e);
                }
            }
            result
        }
        .boxed()
    }

    fn on_notification(&mut self) -> BoxFuture<'_, Result<NotificationStream, SensorError>> {
        async move {
            let (Some(peripheral), Some(uuid)) = (&self.link.device, self.link.subscribed) else {
                return Err(SensorError::NotConnected);
            };

            let notifications = peripheral
                .notifications()
                .await
                .map_err(|e| SensorError::SubscriptionFailed(e.to_string()))?;

            Ok(notifications
                .filter_map(move |n| futures::future::ready((n.uuid == uuid).then_some(n.value)))
                .boxed())
        }
        .boxed()
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<(), SensorError>> {
        self.link.release().boxed()
    }
}
