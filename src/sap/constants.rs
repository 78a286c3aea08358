//! SAP protocol constants

use std::net::Ipv4Addr;

/// Well-known IPv4 SAP multicast group (RFC 2974 §3)
pub const SAP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(224, 2, 127, 254);

/// Well-known SAP port
pub const SAP_PORT: u16 = 9875;

/// Multicast TTL used for outgoing announcements
pub const SAP_MULTICAST_TTL: u32 = 1;

/// Payload type assumed for SAPv1 packets without an explicit field
pub const PAYLOAD_TYPE_SDP: &str = "application/sdp";

/// Receive buffer size, large enough for any announced SDP payload
pub const MAX_DATAGRAM_SIZE: usize = 9000;
