use std::collections::HashMap;
use std::sync::Arc;

use smartpark_api::models::{DeviceRecord, Id};
use tokio::sync::{Mutex, RwLock};

use super::{Device, DeviceFactory};

pub type SharedDevice = Arc<Mutex<Device>>;

/// Arena of live device instances keyed by id. Each entry has its own lock so
/// the polling and control paths only contend on the same device.
pub struct DeviceRegistry {
    factory: DeviceFactory,
    devices: RwLock<HashMap<Id, SharedDevice>>,
}

impl DeviceRegistry {
    pub fn new(factory: DeviceFactory) -> Self {
        Self {
            factory,
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached instance, materializing it on first use.
    pub async fn get_or_create(&self, record: &DeviceRecord) -> SharedDevice {
        if let Some(device) = self.devices.read().await.get(&record.id) {
            return device.clone();
        }

        let mut devices = self.devices.write().await;
        devices
            .entry(record.id)
            .or_insert_with(|| {
                tracing::debug!(device_id = record.id, tag = %record.tag, "Materializing device instance");
                Arc::new(Mutex::new(self.factory.create(record)))
            })
            .clone()
    }

    pub async fn get(&self, id: Id) -> Option<SharedDevice> {
        self.devices.read().await.get(&id).cloned()
    }

    pub async fn instances(&self) -> Vec<SharedDevice> {
        self.devices.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }
}
