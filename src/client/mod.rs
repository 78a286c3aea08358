//! SAP client
//!
//! The client owns one listener per enabled network interface and the
//! shared session registry. Interface status comes from the caller as an
//! initial list plus a change feed; the client diffs each update against
//! the running listeners and spawns or tears them down to match.
//!
//! # Example
//! ```no_run
//! use std::net::Ipv4Addr;
//! use sap::client::{InterfaceStatus, NetworkInterface, SapClient, UdpTransport};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> sap::error::Result<()> {
//! let client = std::sync::Arc::new(SapClient::<UdpTransport>::new());
//! let (status_tx, status_rx) = mpsc::channel(16);
//!
//! let eth0 = NetworkInterface::new("eth0", 2, Ipv4Addr::new(192, 168, 1, 10));
//! status_tx.send(vec![InterfaceStatus::up(eth0)]).await.ok();
//! client.enable(status_rx).await;
//!
//! let mut events = client.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod interface;
pub mod listener;
pub mod transport;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::registry::{AnnouncedSession, RegistryConfig, SessionEvent, SessionRegistry};
use crate::sap::packet::SapPacket;
use crate::sdp::{Origin, SessionDescription};

pub use interface::{InterfaceStatus, NetworkInterface};
pub use transport::{Transport, UdpTransport};

use listener::InterfaceListener;

const ERROR_CHANNEL_CAPACITY: usize = 64;

/// One running per-interface listener
struct RunningListener<T: Transport> {
    interface: NetworkInterface,
    transport: Arc<T>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct ClientState<T: Transport> {
    listeners: HashMap<u32, RunningListener<T>>,
    supervisor: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

/// Multicast session discovery client
///
/// Generic over the datagram transport; production code uses the default
/// [`UdpTransport`].
pub struct SapClient<T: Transport = UdpTransport> {
    registry: Arc<SessionRegistry>,
    errors_tx: broadcast::Sender<Error>,
    state: Mutex<ClientState<T>>,
}

impl SapClient<UdpTransport> {
    /// Process-wide shared client
    ///
    /// Lazily constructed on first use; callers that want isolation or
    /// custom configuration construct their own client instead.
    pub fn shared() -> &'static Arc<SapClient<UdpTransport>> {
        static SHARED: OnceLock<Arc<SapClient<UdpTransport>>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(SapClient::new()))
    }
}

impl<T: Transport> SapClient<T> {
    /// Create a client with default registry configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a client with custom registry configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        let (errors_tx, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            registry: Arc::new(SessionRegistry::with_config(config)),
            errors_tx,
            state: Mutex::new(ClientState {
                listeners: HashMap::new(),
                supervisor: None,
            }),
        }
    }

    /// Get a reference to the session registry
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Snapshot of the live sessions, ordered by announcement time
    pub fn sessions(&self) -> Vec<AnnouncedSession> {
        self.registry.sessions()
    }

    /// Subscribe to registry change events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.registry.subscribe()
    }

    /// Subscribe to decode and transport errors from the receive loops
    pub fn errors(&self) -> broadcast::Receiver<Error> {
        self.errors_tx.subscribe()
    }

    /// Start the client, driven by an interface status feed
    ///
    /// Each message on the feed is the full current interface list. The
    /// supervisor diffs it against the running listeners: newly up
    /// interfaces get a listener, interfaces that went down or vanished
    /// lose theirs and have their sessions evicted. Calling `enable` on
    /// an already enabled client replaces the feed.
    pub async fn enable(self: &Arc<Self>, mut statuses: mpsc::Receiver<Vec<InterfaceStatus>>) {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let previous = {
            let mut state = self.state.lock().await;
            state
                .supervisor
                .replace((shutdown_tx, {
                    let client = Arc::clone(self);
                    tokio::spawn(async move {
                        loop {
                            tokio::select! {
                                _ = shutdown_rx.changed() => {
                                    if *shutdown_rx.borrow() {
                                        break;
                                    }
                                }
                                update = statuses.recv() => {
                                    match update {
                                        Some(statuses) => client.apply_statuses(statuses).await,
                                        // Feed closed; keep running listeners as they are
                                        None => break,
                                    }
                                }
                            }
                        }
                    })
                }))
        };

        if let Some((old_shutdown, old_handle)) = previous {
            let _ = old_shutdown.send(true);
            let _ = old_handle.await;
        }
        tracing::info!("Client enabled");
    }

    /// Reconcile the running listeners with a full status list
    async fn apply_statuses(self: &Arc<Self>, statuses: Vec<InterfaceStatus>) {
        let up: Vec<NetworkInterface> = statuses
            .iter()
            .filter(|status| status.is_up)
            .map(|status| status.interface.clone())
            .collect();
        let up_indexes: HashSet<u32> = up.iter().map(|iface| iface.index).collect();

        let stale: Vec<u32> = {
            let state = self.state.lock().await;
            state
                .listeners
                .keys()
                .filter(|index| !up_indexes.contains(*index))
                .copied()
                .collect()
        };

        for index in stale {
            self.disable_interface(index).await;
        }
        for interface in up {
            if let Err(e) = self.enable_interface(interface.clone()).await {
                tracing::error!(iface = %interface, error = %e, "Failed to enable interface");
                let _ = self.errors_tx.send(e);
            }
        }
    }

    /// Start listening on one interface; a no-op if it is already running
    pub async fn enable_interface(self: &Arc<Self>, interface: NetworkInterface) -> Result<()> {
        {
            let state = self.state.lock().await;
            if state.listeners.contains_key(&interface.index) {
                return Ok(());
            }
        }

        // Socket setup happens outside the state lock
        let transport = Arc::new(T::open(&interface).await?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let listener = InterfaceListener {
            interface: interface.clone(),
            transport: Arc::clone(&transport),
            registry: Arc::clone(&self.registry),
            errors_tx: self.errors_tx.clone(),
            shutdown_rx,
        };
        let handle = tokio::spawn(listener.run());

        let mut state = self.state.lock().await;
        if state.listeners.contains_key(&interface.index) {
            // Lost the race to a concurrent enable for the same interface
            let _ = shutdown_tx.send(true);
            let _ = handle.await;
            let _ = transport.close();
            return Ok(());
        }
        tracing::info!(iface = %interface, "Interface enabled");
        state.listeners.insert(
            interface.index,
            RunningListener {
                interface,
                transport,
                shutdown_tx,
                handle,
            },
        );
        Ok(())
    }

    /// Stop listening on one interface and evict its sessions
    pub async fn disable_interface(&self, index: u32) {
        let running = {
            let mut state = self.state.lock().await;
            state.listeners.remove(&index)
        };

        if let Some(running) = running {
            let interface = running.interface.clone();
            self.stop_listener(running).await;
            self.registry.on_interface_disabled(&interface);
            tracing::info!(iface = %interface, "Interface disabled");
        }
    }

    /// Stop the client
    ///
    /// Deterministic: every receive loop has exited and every expiry
    /// timer is cancelled before this returns.
    pub async fn disable(&self) {
        let (supervisor, listeners) = {
            let mut state = self.state.lock().await;
            (
                state.supervisor.take(),
                state.listeners.drain().collect::<Vec<_>>(),
            )
        };

        if let Some((shutdown_tx, handle)) = supervisor {
            let _ = shutdown_tx.send(true);
            let _ = handle.await;
        }
        for (_, running) in listeners {
            self.stop_listener(running).await;
        }
        self.registry.shutdown();
        tracing::info!("Client disabled");
    }

    async fn stop_listener(&self, running: RunningListener<T>) {
        let _ = running.shutdown_tx.send(true);
        if let Err(e) = running.transport.close() {
            tracing::debug!(iface = %running.interface, error = %e, "Transport close failed");
        }
        let _ = running.handle.await;
    }

    /// Announce a session on every enabled interface
    pub async fn announce(&self, description: &SessionDescription) -> Result<()> {
        self.send_on_all(|interface| {
            SapPacket::announcement(interface.ipv4, description).encode()
        })
        .await
    }

    /// Announce that a session is no longer available
    pub async fn delete(&self, origin: &Origin) -> Result<()> {
        self.send_on_all(|interface| SapPacket::deletion(interface.ipv4, origin).encode())
            .await
    }

    async fn send_on_all(
        &self,
        mut packet_for: impl FnMut(&NetworkInterface) -> bytes::Bytes,
    ) -> Result<()> {
        let targets: Vec<(NetworkInterface, Arc<T>)> = {
            let state = self.state.lock().await;
            state
                .listeners
                .values()
                .map(|running| (running.interface.clone(), Arc::clone(&running.transport)))
                .collect()
        };

        let mut last_error = None;
        for (interface, transport) in targets {
            let datagram = packet_for(&interface);
            if let Err(e) = transport.send_to_group(&datagram).await {
                tracing::warn!(iface = %interface, error = %e, "Send failed");
                last_error = Some(Error::from(e));
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<T: Transport> Default for SapClient<T> {
    fn default() -> Self {
        Self::new()
    }
}
