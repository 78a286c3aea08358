//! Registry configuration

use std::time::Duration;

/// Configuration options for [`super::SessionRegistry`]
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long an announced session stays alive without a renewal
    pub session_timeout: Duration,

    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            // Announcers repeat their announcements well within the hour
            session_timeout: Duration::from_secs(60 * 60),
            event_capacity: 64,
        }
    }
}

impl RegistryConfig {
    /// Set the session timeout
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Set the event channel capacity
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}
