//! SAP (RFC 2974) binary packet codec

pub mod constants;
pub mod packet;

pub use constants::{MAX_DATAGRAM_SIZE, PAYLOAD_TYPE_SDP, SAP_MULTICAST_ADDR, SAP_PORT};
pub use packet::{MessageType, SapPacket};
