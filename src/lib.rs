//! SAP/SDP session discovery library
//!
//! Implements the Session Description Protocol text format (RFC 4566)
//! and a Session Announcement Protocol client (RFC 2974) that listens on
//! the well-known multicast group and maintains a live registry of the
//! sessions announced on the network.
//!
//! # Modules
//! - [`sdp`] — SDP document model, parser and serializer
//! - [`sap`] — SAP binary packet codec
//! - [`registry`] — concurrent per-interface session registry
//! - [`client`] — the multicast client tying it all together
//!
//! # Example
//! ```
//! use sap::sdp::SessionDescription;
//!
//! let text = "v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\ns=Test\r\nt=0 0\r\n";
//! let description = SessionDescription::parse(text)?;
//! assert_eq!(description.name, "Test");
//! assert_eq!(description.to_string(), text);
//! # Ok::<(), sap::error::Error>(())
//! ```

pub mod client;
pub mod error;
pub mod registry;
pub mod sap;
pub mod sdp;

pub use client::{InterfaceStatus, NetworkInterface, SapClient};
pub use error::{Error, Result, SapError, SdpError, ValidationError};
pub use registry::{AnnouncedSession, RegistryConfig, SessionEvent, SessionRegistry};
pub use sap::packet::{MessageType, SapPacket};
pub use sdp::{Origin, ParseOptions, SessionDescription};
