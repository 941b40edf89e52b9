use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use smartpark_api::models::{Alert, AlertNotice, AlertSeverity, DeviceRecord, Id, Thresholds};
use time::OffsetDateTime;

use super::NotificationHub;
use crate::errors::{AlertError, RepositoryError};
use crate::repositories::{AlertRepository, DeviceRepository};

const SYSTEM_TAG: &str = "System";

/// Rule deciding when a reading raises an alert and how it reads.
pub trait AlertStrategy: Send + Sync {
    fn should_alert(&self, thresholds: &Thresholds, value: f64) -> bool;

    fn severity(&self, thresholds: &Thresholds, value: f64) -> AlertSeverity;

    fn message(&self, device_name: &str, value: f64, unit: &str, severity: AlertSeverity) -> String;
}

/// Fires once the lower threshold is reached; severity re-checks critical
/// first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdStrategy;

impl AlertStrategy for ThresholdStrategy {
    fn should_alert(&self, thresholds: &Thresholds, value: f64) -> bool {
        thresholds.is_alertable(value)
    }

    fn severity(&self, thresholds: &Thresholds, value: f64) -> AlertSeverity {
        thresholds.severity(value)
    }

    fn message(&self, device_name: &str, value: f64, unit: &str, severity: AlertSeverity) -> String {
        match severity {
            AlertSeverity::Critical => {
                format!("CRITICAL: {device_name} has reached critical level: {value:.2} {unit}")
            },
            AlertSeverity::Warning => {
                format!("WARNING: {device_name} has exceeded warning threshold: {value:.2} {unit}")
            },
            AlertSeverity::Info => format!("INFO: {device_name} status update: {value:.2} {unit}"),
        }
    }
}

pub struct AlertService<S = ThresholdStrategy> {
    alert_repository: Arc<dyn AlertRepository>,
    device_repository: Arc<dyn DeviceRepository>,
    hub: Arc<NotificationHub>,
    strategy: S,
    cooldown: time::Duration,
    last_alerts: Mutex<HashMap<Id, OffsetDateTime>>,
}

impl AlertService<ThresholdStrategy> {
    pub fn new(
        alert_repository: Arc<dyn AlertRepository>,
        device_repository: Arc<dyn DeviceRepository>,
        hub: Arc<NotificationHub>,
        cooldown: Duration,
    ) -> Self {
        Self::with_strategy(alert_repository, device_repository, hub, cooldown, ThresholdStrategy)
    }
}

impl<S: AlertStrategy> AlertService<S> {
    pub fn with_strategy(
        alert_repository: Arc<dyn AlertRepository>,
        device_repository: Arc<dyn DeviceRepository>,
        hub: Arc<NotificationHub>,
        cooldown: Duration,
        strategy: S,
    ) -> Self {
        Self {
            alert_repository,
            device_repository,
            hub,
            strategy,
            cooldown: time::Duration::seconds_f64(cooldown.as_secs_f64()),
            last_alerts: Mutex::new(HashMap::new()),
        }
    }

    /// Raises an alert for the reading unless it is below every threshold or
    /// the device is still cooling down. Failures are logged, never returned.
    pub async fn check_and_generate(&self, record: &DeviceRecord, value: f64) -> Option<Alert> {
        self.check_and_generate_at(record, value, OffsetDateTime::now_utc()).await
    }

    pub async fn check_and_generate_at(
        &self,
        record: &DeviceRecord,
        value: f64,
        now: OffsetDateTime,
    ) -> Option<Alert> {
        match self.generate(record, value, now).await {
            Ok(alert) => alert,
            Err(e) => {
                tracing::error!(device_id = record.id, tag = %record.tag, error = %e, "Failed to generate alert");
                None
            },
        }
    }

    async fn generate(
        &self,
        record: &DeviceRecord,
        value: f64,
        now: OffsetDateTime,
    ) -> Result<Option<Alert>, AlertError> {
        let thresholds = record.thresholds();

        if !self.strategy.should_alert(&thresholds, value) {
            return Ok(None);
        }

        if self.is_cooling_down(record.id, now) {
            tracing::debug!(device_id = record.id, tag = %record.tag, "Alert suppressed by cooldown");
            return Ok(None);
        }

        let severity = self.strategy.severity(&thresholds, value);
        let message = self.strategy.message(&record.name, value, &record.unit, severity);

        let alert = self
            .alert_repository
            .append(&new_alert(Some(record.id), severity, message, value, now))
            .await?;

        self.lock_last_alerts().insert(record.id, now);

        self.hub
            .notify_alert(&AlertNotice {
                alert: alert.clone(),
                device_tag: record.tag.clone(),
            })
            .await;

        tracing::warn!(device_id = record.id, tag = %record.tag, severity = %severity, "{}", alert.message);

        Ok(Some(alert))
    }

    /// Operator raised alert. Not subject to the cooldown.
    pub async fn create_manual(
        &self,
        device_id: Option<Id>,
        severity: AlertSeverity,
        message: &str,
    ) -> Result<Alert, AlertError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AlertError::EmptyMessage);
        }

        let device_tag = match device_id {
            Some(id) => self
                .device_repository
                .find_by_id(id)
                .await?
                .map(|record| record.tag)
                .ok_or(AlertError::DeviceNotFound)?,
            None => String::from(SYSTEM_TAG),
        };

        let alert = self
            .alert_repository
            .append(&new_alert(device_id, severity, message.to_string(), 0.0, OffsetDateTime::now_utc()))
            .await?;

        self.hub
            .notify_alert(&AlertNotice {
                alert: alert.clone(),
                device_tag,
            })
            .await;

        tracing::warn!(alert_id = alert.id, "Manual alert generated: {}", alert.message);

        Ok(alert)
    }

    pub async fn acknowledge(&self, alert_id: Id, user_id: Id) -> Result<Alert, AlertError> {
        match self.alert_repository.acknowledge(alert_id, user_id).await {
            Ok(alert) => {
                tracing::info!(alert_id, user_id, "Alert acknowledged");
                Ok(alert)
            },
            Err(RepositoryError::NotFound) => Err(AlertError::AlertNotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, alert_id: Id) -> Result<Alert, AlertError> {
        self.alert_repository
            .find_by_id(alert_id)
            .await?
            .ok_or(AlertError::AlertNotFound)
    }

    pub async fn unacknowledged(&self) -> Result<Vec<Alert>, AlertError> {
        Ok(self.alert_repository.find_unacknowledged().await?)
    }

    pub async fn device_alerts(&self, device_id: Id) -> Result<Vec<Alert>, AlertError> {
        Ok(self.alert_repository.find_by_device(device_id).await?)
    }

    fn is_cooling_down(&self, device_id: Id, now: OffsetDateTime) -> bool {
        self.lock_last_alerts()
            .get(&device_id)
            .is_some_and(|last| now - *last < self.cooldown)
    }

    fn lock_last_alerts(&self) -> std::sync::MutexGuard<'_, HashMap<Id, OffsetDateTime>> {
        self.last_alerts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn new_alert(
    device_id: Option<Id>,
    severity: AlertSeverity,
    message: String,
    trigger_value: f64,
    created_at: OffsetDateTime,
) -> Alert {
    Alert {
        id: 0,
        device_id,
        severity,
        message,
        trigger_value,
        created_at,
        acknowledged: false,
        acknowledged_at: None,
        acknowledged_by: None,
    }
}
