use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use futures::FutureExt;
use smartpark_api::models::{AlertNotice, Notification, StatusChange, TelemetryUpdate};
use tokio::sync::broadcast;

use crate::errors::NotifyError;

/// Consumer of pipeline notifications. Every callback defaults to a no-op so
/// subscribers only implement the kinds they care about.
#[async_trait]
pub trait Subscriber: Send + Sync {
    fn name(&self) -> &str {
        "anonymous"
    }

    async fn on_telemetry(&self, _update: &TelemetryUpdate) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn on_status_change(&self, _change: &StatusChange) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn on_alert(&self, _alert: &AlertNotice) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Fan-out of telemetry, status changes and alerts to a dynamic subscriber
/// set. The hub keeps weak references only; dropping the last `Arc` of a
/// subscriber unregisters it.
#[derive(Default)]
pub struct NotificationHub {
    subscribers: Mutex<Vec<Weak<dyn Subscriber>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the subscriber was already attached.
    pub fn attach(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let address = Arc::as_ptr(&subscriber) as *const ();
        let mut subscribers = self.lock();

        subscribers.retain(|weak| weak.strong_count() > 0);
        if subscribers.iter().any(|weak| weak.as_ptr() as *const () == address) {
            return false;
        }

        subscribers.push(Arc::downgrade(&subscriber));
        true
    }

    /// Safe to call from inside a notification callback.
    pub fn detach(&self, subscriber: &dyn Subscriber) -> bool {
        let address = subscriber as *const dyn Subscriber as *const ();
        let mut subscribers = self.lock();

        let before = subscribers.len();
        subscribers.retain(|weak| weak.as_ptr() as *const () != address);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().iter().filter(|weak| weak.strong_count() > 0).count()
    }

    /// Returns how many subscribers accepted the update.
    pub async fn notify_telemetry(&self, update: &TelemetryUpdate) -> usize {
        let mut delivered = 0;

        for subscriber in self.snapshot() {
            if deliver(subscriber.as_ref(), "telemetry", subscriber.on_telemetry(update)).await {
                delivered += 1;
            }
        }

        delivered
    }

    pub async fn notify_status_change(&self, change: &StatusChange) -> usize {
        let mut delivered = 0;

        for subscriber in self.snapshot() {
            if deliver(subscriber.as_ref(), "status_change", subscriber.on_status_change(change)).await {
                delivered += 1;
            }
        }

        delivered
    }

    pub async fn notify_alert(&self, alert: &AlertNotice) -> usize {
        let mut delivered = 0;

        for subscriber in self.snapshot() {
            if deliver(subscriber.as_ref(), "alert", subscriber.on_alert(alert)).await {
                delivered += 1;
            }
        }

        delivered
    }

    /// Point-in-time copy of the live subscribers, in attach order.
    fn snapshot(&self) -> Vec<Arc<dyn Subscriber>> {
        let mut subscribers = self.lock();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.iter().filter_map(Weak::upgrade).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Weak<dyn Subscriber>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs one callback. An error or a panic is logged and counted as not
/// delivered; it never reaches the caller.
async fn deliver<F>(subscriber: &dyn Subscriber, kind: &str, delivery: F) -> bool
where
    F: Future<Output = Result<(), NotifyError>>,
{
    match AssertUnwindSafe(delivery).catch_unwind().await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(subscriber = subscriber.name(), kind, error = %e, "Notification delivery failed");
            false
        },
        Err(_) => {
            tracing::error!(subscriber = subscriber.name(), kind, "Subscriber panicked during delivery");
            false
        },
    }
}

/// Bridges the hub onto a broadcast channel for streaming clients.
pub struct BroadcastSubscriber {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastSubscriber {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    fn publish(&self, notification: Notification) -> Result<(), NotifyError> {
        // Nobody listening is not a failure.
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }

        self.sender.send(notification).map(|_| ()).map_err(|_| NotifyError::Closed)
    }
}

#[async_trait]
impl Subscriber for BroadcastSubscriber {
    fn name(&self) -> &str {
        "broadcast"
    }

    async fn on_telemetry(&self, update: &TelemetryUpdate) -> Result<(), NotifyError> {
        self.publish(Notification::Telemetry(update.clone()))
    }

    async fn on_status_change(&self, change: &StatusChange) -> Result<(), NotifyError> {
        self.publish(Notification::StatusChange(change.clone()))
    }

    async fn on_alert(&self, alert: &AlertNotice) -> Result<(), NotifyError> {
        self.publish(Notification::Alert(alert.clone()))
    }
}

#[cfg(test)]
mod tests {
    use smartpark_api::models::DeviceStatus;
    use time::OffsetDateTime;

    use super::*;

    fn update(value: f64) -> TelemetryUpdate {
        TelemetryUpdate {
            device_id: 1,
            tag: String::from("TEMP-001"),
            value,
            unit: String::from("°F"),
            status: DeviceStatus::Normal,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    struct Recorder {
        label: String,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn new(label: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                label: label.to_string(),
                log: log.clone(),
            })
        }
    }

    #[async_trait]
    impl Subscriber for Recorder {
        async fn on_telemetry(&self, update: &TelemetryUpdate) -> Result<(), NotifyError> {
            self.log.lock().unwrap().push(format!("{}:{}", self.label, update.value));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Subscriber for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn on_telemetry(&self, _update: &TelemetryUpdate) -> Result<(), NotifyError> {
            Err(NotifyError::Rejected {
                subscriber: String::from("failing"),
                message: String::from("backend down"),
            })
        }
    }

    struct Panicking;

    #[async_trait]
    impl Subscriber for Panicking {
        async fn on_telemetry(&self, _update: &TelemetryUpdate) -> Result<(), NotifyError> {
            panic!("subscriber bug");
        }
    }

    struct SelfDetaching {
        hub: Arc<NotificationHub>,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Subscriber for SelfDetaching {
        async fn on_telemetry(&self, update: &TelemetryUpdate) -> Result<(), NotifyError> {
            self.log.lock().unwrap().push(format!("detaching:{}", update.value));
            assert!(self.hub.detach(self));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_duplicate_attach_delivers_once() {
        let hub = NotificationHub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let recorder = Recorder::new("a", &log);

        assert!(hub.attach(recorder.clone()));
        assert!(!hub.attach(recorder.clone()));
        assert_eq!(hub.subscriber_count(), 1);

        assert_eq!(hub.notify_telemetry(&update(1.0)).await, 1);
        assert_eq!(*log.lock().unwrap(), vec!["a:1"]);
    }

    #[tokio::test]
    async fn test_delivery_follows_attach_order() {
        let hub = NotificationHub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Recorder::new("first", &log);
        let second = Recorder::new("second", &log);

        hub.attach(first.clone());
        hub.attach(second.clone());
        hub.notify_telemetry(&update(2.0)).await;

        assert_eq!(*log.lock().unwrap(), vec!["first:2", "second:2"]);
    }

    #[tokio::test]
    async fn test_self_detach_during_callback() {
        let hub = Arc::new(NotificationHub::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let detaching = Arc::new(SelfDetaching {
            hub: hub.clone(),
            log: log.clone(),
        });
        let recorder = Recorder::new("after", &log);

        hub.attach(detaching.clone());
        hub.attach(recorder.clone());

        assert_eq!(hub.notify_telemetry(&update(1.0)).await, 2);
        assert_eq!(hub.subscriber_count(), 1);

        hub.notify_telemetry(&update(2.0)).await;
        assert_eq!(*log.lock().unwrap(), vec!["detaching:1", "after:1", "after:2"]);
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_block_others() {
        let hub = NotificationHub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let failing = Arc::new(Failing);
        let recorder = Recorder::new("ok", &log);

        hub.attach(failing.clone());
        hub.attach(recorder.clone());

        assert_eq!(hub.notify_telemetry(&update(5.0)).await, 1);
        assert_eq!(*log.lock().unwrap(), vec!["ok:5"]);
    }

    #[tokio::test]
    async fn test_panicking_subscriber_does_not_block_others() {
        let hub = NotificationHub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let panicking = Arc::new(Panicking);
        let recorder = Recorder::new("ok", &log);

        hub.attach(panicking.clone());
        hub.attach(recorder.clone());

        assert_eq!(hub.notify_telemetry(&update(6.0)).await, 1);
        assert_eq!(hub.notify_telemetry(&update(7.0)).await, 1);
        assert_eq!(*log.lock().unwrap(), vec!["ok:6", "ok:7"]);
        assert_eq!(hub.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let hub = NotificationHub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let recorder = Recorder::new("gone", &log);

        hub.attach(recorder.clone());
        drop(recorder);

        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.notify_telemetry(&update(1.0)).await, 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_subscriber_forwards_notifications() {
        let hub = NotificationHub::new();
        let broadcast = Arc::new(BroadcastSubscriber::new(8));
        hub.attach(broadcast.clone());

        // No receivers yet
        assert_eq!(hub.notify_telemetry(&update(1.0)).await, 1);

        let mut receiver = broadcast.subscribe();
        hub.notify_telemetry(&update(3.0)).await;

        match receiver.recv().await.unwrap() {
            Notification::Telemetry(update) => assert_eq!(update.value, 3.0),
            other => panic!("unexpected notification: {other:?}"),
        }
    }
}
