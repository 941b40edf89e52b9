use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Process-wide automation switch. Watchers are told about every flip.
pub struct SystemState {
    auto_mode: AtomicBool,
    sender: watch::Sender<bool>,
}

impl SystemState {
    pub fn new(auto_mode: bool) -> Self {
        let (sender, _) = watch::channel(auto_mode);

        Self {
            auto_mode: AtomicBool::new(auto_mode),
            sender,
        }
    }

    pub fn is_auto_mode(&self) -> bool {
        self.auto_mode.load(Ordering::Acquire)
    }

    /// Returns `true` if the flag actually changed.
    pub fn set_auto_mode(&self, enabled: bool) -> bool {
        if self.auto_mode.swap(enabled, Ordering::AcqRel) == enabled {
            return false;
        }

        tracing::info!(enabled, "Automation mode changed");
        self.sender.send_replace(enabled);
        true
    }

    pub fn watch(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}
