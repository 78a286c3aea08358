//! Registry of discovered multicast sessions
//!
//! The registry holds one slot per (interface, session identity) pair and
//! fans change events out through `tokio::sync::broadcast`.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<SessionRegistry>
//!                   ┌───────────────────────────┐
//!                   │ slots: HashMap<SlotKey,   │
//!                   │   Slot {                  │
//!                   │     session,              │
//!                   │     timer: JoinHandle,    │
//!                   │   }                       │
//!                   │ >                         │
//!                   └────────────┬──────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!        ▼                       ▼                       ▼
//!   [Listener eth0]        [Listener eth1]         [Subscriber]
//!   on_announce()          on_delete()             events.recv()
//!        │                       │
//!        └──► expires_at renewal / slot replace ──► broadcast
//! ```
//!
//! # Consistency
//!
//! One `std::sync::Mutex` guards the slot map and the expiry deadlines.
//! The lock is never held across an `.await`. Events are sent on the
//! broadcast channel while the lock is held, which keeps delivery order
//! identical to mutation order; the send only queues the event, so no
//! subscriber code ever runs under the lock.

pub mod config;
pub mod event;
pub mod store;

pub use config::RegistryConfig;
pub use event::{AnnouncedSession, SessionEvent, SlotKey};
pub use store::SessionRegistry;
