//! Announcement registry implementation
//!
//! The registry is the only structure shared by every interface listener.
//! One mutex covers the slot map and all expiry bookkeeping, so a
//! concurrent announce, delete and expiry for the same slot cannot
//! interleave into a lost update. Events are sent on the broadcast
//! channel while the mutex is still held, so delivery order always
//! matches mutation order. The send never blocks and never runs
//! subscriber code, so holding the lock across it is safe and a
//! subscriber may call back into the registry without deadlocking.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::client::interface::NetworkInterface;
use crate::sdp::{Origin, SessionDescription};

use super::config::RegistryConfig;
use super::event::{AnnouncedSession, SessionEvent, SlotKey};

/// One registry slot
struct Slot {
    session: AnnouncedSession,
    /// Expiry timer task; aborted when the slot is removed
    timer: JoinHandle<()>,
}

/// Live registry of sessions announced on the network
///
/// Keyed by (interface, session identity). Slots are created on the
/// first announcement, replaced in place by strictly newer versions,
/// and removed on deletion, expiry or interface shutdown.
pub struct SessionRegistry {
    slots: Mutex<HashMap<SlotKey, Slot>>,
    events_tx: broadcast::Sender<SessionEvent>,
    config: RegistryConfig,
}

impl SessionRegistry {
    /// Create a registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        let (events_tx, _) = broadcast::channel(config.event_capacity);
        Self {
            slots: Mutex::new(HashMap::new()),
            events_tx,
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Subscribe to change events
    ///
    /// Events are delivered in the order the producing mutations
    /// happened. A lagging subscriber loses the oldest events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Handle an announcement received on `interface`
    ///
    /// A new identity creates a slot and publishes `Added`. A strictly
    /// newer version of an active slot replaces the document and
    /// publishes `Replaced`. A version at or below the stored one keeps
    /// the stored document and publishes nothing. Every announcement for
    /// a live slot pushes its expiry deadline out.
    pub fn on_announce(
        self: &Arc<Self>,
        interface: &NetworkInterface,
        description: SessionDescription,
    ) {
        let key = SlotKey::new(interface, description.origin.identity());
        let deadline = Instant::now() + self.config.session_timeout;

        let mut slots = self.slots.lock().unwrap();
        match slots.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                slot.session.expires_at = deadline;
                if description.is_update_of(&slot.session.description) {
                    let old = slot.session.clone();
                    slot.session.description = Arc::new(description);
                    let new = slot.session.clone();
                    tracing::info!(
                        iface = %interface,
                        session_id = new.description.origin.session_id,
                        version = new.description.origin.session_version,
                        "Session updated"
                    );
                    self.publish(SessionEvent::Replaced { old, new });
                } else {
                    // Stale or duplicate announcement: renewal only
                    tracing::debug!(
                        iface = %interface,
                        session_id = description.origin.session_id,
                        "Session renewed"
                    );
                }
            }
            Entry::Vacant(entry) => {
                let session = AnnouncedSession {
                    description: Arc::new(description),
                    interface: interface.clone(),
                    announced_at: Instant::now(),
                    expires_at: deadline,
                };
                let timer = self.spawn_expiry_timer(key, deadline);
                tracing::info!(
                    iface = %interface,
                    session_id = session.description.origin.session_id,
                    name = %session.description.name,
                    "Session announced"
                );
                entry.insert(Slot {
                    session: session.clone(),
                    timer,
                });
                self.publish(SessionEvent::Added(session));
            }
        }
    }

    /// Handle a deletion received on `interface`
    ///
    /// A deletion for an unknown or already-removed identity is a
    /// silent no-op.
    pub fn on_delete(&self, interface: &NetworkInterface, origin: &Origin) {
        let key = SlotKey::new(interface, origin.identity());

        let mut slots = self.slots.lock().unwrap();
        if let Some(slot) = slots.remove(&key) {
            slot.timer.abort();
            tracing::info!(
                iface = %interface,
                session_id = slot.session.description.origin.session_id,
                "Session deleted"
            );
            self.publish(SessionEvent::Removed(slot.session));
        }
    }

    /// Remove every slot owned by `interface`
    pub fn on_interface_disabled(&self, interface: &NetworkInterface) {
        let mut slots = self.slots.lock().unwrap();
        let keys: Vec<SlotKey> = slots
            .keys()
            .filter(|key| key.interface_index == interface.index)
            .cloned()
            .collect();

        if !keys.is_empty() {
            tracing::info!(
                iface = %interface,
                sessions = keys.len(),
                "Interface disabled, sessions evicted"
            );
        }
        for key in keys {
            if let Some(slot) = slots.remove(&key) {
                slot.timer.abort();
                self.publish(SessionEvent::Removed(slot.session));
            }
        }
    }

    /// Cancel every timer and drop every slot without publishing events
    ///
    /// Used on client shutdown after the interfaces have already been
    /// disabled; nothing survives this call.
    pub fn shutdown(&self) {
        let mut slots = self.slots.lock().unwrap();
        for (_, slot) in slots.drain() {
            slot.timer.abort();
        }
    }

    /// Snapshot of the live sessions, ordered by announcement time
    pub fn sessions(&self) -> Vec<AnnouncedSession> {
        let slots = self.slots.lock().unwrap();
        let mut sessions: Vec<AnnouncedSession> =
            slots.values().map(|slot| slot.session.clone()).collect();
        sessions.sort_by_key(|session| session.announced_at);
        sessions
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the expiry timer task for a new slot
    ///
    /// The task sleeps to the slot's deadline and then re-validates it
    /// under the lock: a renewal may have pushed the deadline out after
    /// the sleep was scheduled, in which case the task reschedules
    /// instead of removing. Timer cancellation (abort) is not assumed to
    /// be synchronous; the re-validation also covers a timer that fires
    /// while its slot is being removed.
    fn spawn_expiry_timer(self: &Arc<Self>, key: SlotKey, deadline: Instant) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut deadline = deadline;
            loop {
                tokio::time::sleep_until(deadline).await;
                match registry.check_expired(&key) {
                    Some(extended) => deadline = extended,
                    None => break,
                }
            }
        })
    }

    /// Re-validate a fired deadline; returns the new deadline when the
    /// slot was renewed, `None` when it is gone (or was removed here)
    fn check_expired(&self, key: &SlotKey) -> Option<Instant> {
        let mut slots = self.slots.lock().unwrap();
        let deadline = match slots.get(key) {
            Some(slot) => slot.session.expires_at,
            None => return None,
        };
        if deadline > Instant::now() {
            return Some(deadline);
        }
        if let Some(slot) = slots.remove(key) {
            tracing::info!(
                iface = %slot.session.interface,
                session_id = slot.session.description.origin.session_id,
                "Session expired"
            );
            self.publish(SessionEvent::Removed(slot.session));
        }
        None
    }

    /// Send one event; called with the slot lock held so the channel
    /// order matches the mutation order
    fn publish(&self, event: SessionEvent) {
        // send() only fails when there are no subscribers
        let _ = self.events_tx.send(event);
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;

    fn interface(index: u32) -> NetworkInterface {
        NetworkInterface::new(format!("eth{}", index), index, Ipv4Addr::new(10, 0, 0, index as u8))
    }

    fn doc(session_id: u64, version: u64) -> SessionDescription {
        SessionDescription::parse(&format!(
            "v=0\r\no=- {} {} IN IP4 127.0.0.1\r\ns=Test\r\nt=0 0\r\n",
            session_id, version
        ))
        .unwrap()
    }

    fn registry(timeout: Duration) -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::with_config(
            RegistryConfig::default().session_timeout(timeout),
        ))
    }

    #[tokio::test]
    async fn test_announce_adds_session() {
        let registry = registry(Duration::from_secs(60));
        let mut events = registry.subscribe();

        registry.on_announce(&interface(1), doc(1, 1));

        assert_eq!(registry.len(), 1);
        match events.try_recv().unwrap() {
            SessionEvent::Added(session) => {
                assert_eq!(session.description.origin.session_id, 1);
                assert_eq!(session.interface, interface(1));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_newer_version_replaces_once() {
        let registry = registry(Duration::from_secs(60));
        let mut events = registry.subscribe();

        registry.on_announce(&interface(1), doc(1, 1));
        registry.on_announce(&interface(1), doc(1, 2));

        assert_eq!(registry.len(), 1);
        assert!(matches!(events.try_recv().unwrap(), SessionEvent::Added(_)));
        match events.try_recv().unwrap() {
            SessionEvent::Replaced { old, new } => {
                assert_eq!(old.description.origin.session_version, 1);
                assert_eq!(new.description.origin.session_version, 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

        let stored = &registry.sessions()[0];
        assert_eq!(stored.description.origin.session_version, 2);
    }

    #[tokio::test]
    async fn test_stale_version_is_silent_noop() {
        let registry = registry(Duration::from_secs(60));

        registry.on_announce(&interface(1), doc(1, 5));
        let mut events = registry.subscribe();

        registry.on_announce(&interface(1), doc(1, 5)); // duplicate
        registry.on_announce(&interface(1), doc(1, 3)); // stale

        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(registry.sessions()[0].description.origin.session_version, 5);
    }

    #[tokio::test]
    async fn test_identity_per_interface() {
        let registry = registry(Duration::from_secs(60));

        registry.on_announce(&interface(1), doc(1, 1));
        registry.on_announce(&interface(2), doc(1, 1));

        // same identity on two interfaces = two slots
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_different_identity_is_new_slot() {
        let registry = registry(Duration::from_secs(60));

        registry.on_announce(&interface(1), doc(1, 1));
        registry.on_announce(&interface(1), doc(2, 1));

        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_session() {
        let registry = registry(Duration::from_secs(60));
        let mut events = registry.subscribe();

        let description = doc(1, 1);
        let origin = description.origin.clone();
        registry.on_announce(&interface(1), description);
        registry.on_delete(&interface(1), &origin);

        assert!(registry.is_empty());
        assert!(matches!(events.try_recv().unwrap(), SessionEvent::Added(_)));
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::Removed(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_is_silent_noop() {
        let registry = registry(Duration::from_secs(60));
        let mut events = registry.subscribe();

        registry.on_delete(&interface(1), &doc(9, 1).origin);

        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_delete_other_interface_keeps_slot() {
        let registry = registry(Duration::from_secs(60));

        let description = doc(1, 1);
        let origin = description.origin.clone();
        registry.on_announce(&interface(1), description);
        registry.on_delete(&interface(2), &origin);

        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_interface_disabled_evicts_all_its_sessions() {
        let registry = registry(Duration::from_secs(60));
        let mut events = registry.subscribe();

        registry.on_announce(&interface(1), doc(1, 1));
        registry.on_announce(&interface(1), doc(2, 1));
        registry.on_announce(&interface(2), doc(3, 1));

        registry.on_interface_disabled(&interface(1));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.sessions()[0].interface, interface(2));

        let mut removed = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SessionEvent::Removed(_)) {
                removed += 1;
            }
        }
        assert_eq!(removed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_removes_exactly_once() {
        let registry = registry(Duration::from_millis(100));
        let mut events = registry.subscribe();

        registry.on_announce(&interface(1), doc(1, 1));
        assert!(matches!(events.try_recv().unwrap(), SessionEvent::Added(_)));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(registry.is_empty());
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::Removed(_)
        ));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_renewal_extends_deadline() {
        let registry = registry(Duration::from_millis(100));
        let mut events = registry.subscribe();

        registry.on_announce(&interface(1), doc(1, 1));

        // Renew at 60ms; the timer scheduled for t=100ms must reschedule
        // instead of removing.
        tokio::time::sleep(Duration::from_millis(60)).await;
        registry.on_announce(&interface(1), doc(1, 1));

        tokio::time::sleep(Duration::from_millis(60)).await; // t=120ms
        assert_eq!(registry.len(), 1, "renewed session expired early");

        tokio::time::sleep(Duration::from_millis(60)).await; // t=180ms > 160ms
        assert!(registry.is_empty());

        assert!(matches!(events.try_recv().unwrap(), SessionEvent::Added(_)));
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::Removed(_)
        ));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_resets_deadline() {
        let registry = registry(Duration::from_millis(100));

        registry.on_announce(&interface(1), doc(1, 1));
        tokio::time::sleep(Duration::from_millis(60)).await;
        registry.on_announce(&interface(1), doc(1, 2));

        tokio::time::sleep(Duration::from_millis(60)).await; // t=120ms
        assert_eq!(registry.len(), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_cancels_timer() {
        let registry = registry(Duration::from_millis(100));
        let mut events = registry.subscribe();

        let description = doc(1, 1);
        let origin = description.origin.clone();
        registry.on_announce(&interface(1), description);
        registry.on_delete(&interface(1), &origin);

        tokio::time::sleep(Duration::from_millis(200)).await;

        // one Added, one Removed, and nothing from the dead timer
        assert!(matches!(events.try_recv().unwrap(), SessionEvent::Added(_)));
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::Removed(_)
        ));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_timers_silently() {
        let registry = registry(Duration::from_millis(100));
        registry.on_announce(&interface(1), doc(1, 1));
        registry.on_announce(&interface(1), doc(2, 1));

        let mut events = registry.subscribe();
        registry.shutdown();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(registry.is_empty());
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_ordered_by_announcement_time() {
        let registry = registry(Duration::from_secs(60));

        registry.on_announce(&interface(1), doc(3, 1));
        tokio::time::sleep(Duration::from_millis(1)).await;
        registry.on_announce(&interface(1), doc(1, 1));
        tokio::time::sleep(Duration::from_millis(1)).await;
        registry.on_announce(&interface(1), doc(2, 1));

        let ids: Vec<u64> = registry
            .sessions()
            .iter()
            .map(|session| session.description.origin.session_id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_events_keep_mutation_order_under_contention() {
        const SESSIONS: u64 = 64;

        let registry = Arc::new(SessionRegistry::with_config(
            RegistryConfig::default()
                .session_timeout(Duration::from_secs(60))
                .event_capacity(256),
        ));
        let mut events = registry.subscribe();

        // One announcer and one deleter task per session; the deleter
        // waits until its slot is visible, so Added always happens
        // before Removed and subscribers must see them in that order.
        for id in 1..=SESSIONS {
            let announcer = Arc::clone(&registry);
            tokio::spawn(async move {
                announcer.on_announce(&interface(1), doc(id, 1));
            });

            let deleter = Arc::clone(&registry);
            tokio::spawn(async move {
                let origin = doc(id, 1).origin;
                loop {
                    let visible = deleter
                        .sessions()
                        .iter()
                        .any(|session| session.description.origin.session_id == id);
                    if visible {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
                deleter.on_delete(&interface(1), &origin);
            });
        }

        let mut added = std::collections::HashSet::new();
        let mut removed = 0;
        while removed < SESSIONS {
            let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
                .await
                .expect("timed out waiting for events")
                .expect("event stream lagged or closed");
            match event {
                SessionEvent::Added(session) => {
                    added.insert(session.description.origin.session_id);
                }
                SessionEvent::Removed(session) => {
                    let id = session.description.origin.session_id;
                    assert!(
                        added.contains(&id),
                        "session {} removed before it was added",
                        id
                    );
                    removed += 1;
                }
                SessionEvent::Replaced { old, .. } => {
                    panic!(
                        "unexpected replace for session {}",
                        old.description.origin.session_id
                    );
                }
            }
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_subscriber_can_reenter_registry() {
        let registry = registry(Duration::from_secs(60));
        let mut events = registry.subscribe();

        registry.on_announce(&interface(1), doc(1, 1));

        // A subscriber reacting to an event may call back in without
        // deadlocking; the send queues the event and never runs
        // subscriber code under the lock.
        if let SessionEvent::Added(session) = events.try_recv().unwrap() {
            registry.on_delete(&interface(1), &session.description.origin);
        }
        assert!(registry.is_empty());
    }
}
