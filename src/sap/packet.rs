//! SAP packet encoder and decoder
//!
//! Packet layout (RFC 2974 §3):
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | V=1 |A|R|T|E|C|   auth len    |         msg id hash           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          originating source (32 or 128 bits)                  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      optional authentication data (auth len bytes)            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      optional payload type, NUL terminated                    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         payload                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Flag bits: A = address family (IPv6), T = message type (deletion),
//! E = encrypted, C = compressed. SAPv1 senders omit the payload type
//! field entirely; such packets are detected by the payload starting
//! with `v=` where the payload type would be.

use std::io::Read;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::SapError;
use crate::sdp::Origin;

use super::constants::PAYLOAD_TYPE_SDP;

const FLAG_IPV6: u8 = 1 << 4;
const FLAG_DELETION: u8 = 1 << 2;
const FLAG_ENCRYPTED: u8 = 1 << 1;
const FLAG_COMPRESSED: u8 = 1 << 0;

/// SAP message type flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Session announcement; payload is an SDP document
    Announcement,
    /// Session deletion; payload is an `o=` line body
    Deletion,
}

/// A decoded SAP packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SapPacket {
    /// Protocol version from the top three flag bits
    pub version: u8,
    /// Announcement or deletion
    pub message_type: MessageType,
    /// Originating source address from the header
    pub source: IpAddr,
    /// Message ID hash, forwarded but not validated
    pub msg_id_hash: u16,
    /// Authentication data, skipped without validation
    pub auth_data: Bytes,
    /// MIME payload type (`application/sdp` for SAPv1 packets)
    pub payload_type: String,
    /// Payload bytes, already inflated if the packet was compressed
    pub payload: Bytes,
}

impl SapPacket {
    /// Build an announcement packet for an SDP document
    pub fn announcement(source: Ipv4Addr, description: &crate::sdp::SessionDescription) -> Self {
        let payload = Bytes::from(description.to_string());
        Self {
            version: 1,
            message_type: MessageType::Announcement,
            source: IpAddr::V4(source),
            msg_id_hash: msg_id_hash(&payload),
            auth_data: Bytes::new(),
            payload_type: PAYLOAD_TYPE_SDP.to_string(),
            payload,
        }
    }

    /// Build a deletion packet for a session origin
    pub fn deletion(source: Ipv4Addr, origin: &Origin) -> Self {
        let payload = Bytes::from(format!("o={}\r\n", origin));
        Self {
            version: 1,
            message_type: MessageType::Deletion,
            source: IpAddr::V4(source),
            msg_id_hash: msg_id_hash(&payload),
            auth_data: Bytes::new(),
            payload_type: PAYLOAD_TYPE_SDP.to_string(),
            payload,
        }
    }

    /// Decode a packet from a received datagram
    ///
    /// The input buffer is never modified; decoding advances a cheap
    /// `Bytes` clone and compressed payloads inflate into a fresh buffer.
    pub fn decode(datagram: &Bytes) -> Result<Self, SapError> {
        let mut buf = datagram.clone();
        let total = buf.len();

        if buf.remaining() < 4 {
            return Err(SapError::PacketTooShort(total));
        }
        let flags = buf.get_u8();
        let version = (flags >> 5) & 0x07;
        let ipv6 = flags & FLAG_IPV6 != 0;
        let message_type = if flags & FLAG_DELETION != 0 {
            MessageType::Deletion
        } else {
            MessageType::Announcement
        };
        let encrypted = flags & FLAG_ENCRYPTED != 0;
        let compressed = flags & FLAG_COMPRESSED != 0;

        let auth_len = buf.get_u8() as usize;
        let msg_id_hash = buf.get_u16();

        let source = if ipv6 {
            if buf.remaining() < 16 {
                return Err(SapError::PacketTooShort(total));
            }
            let mut octets = [0u8; 16];
            buf.copy_to_slice(&mut octets);
            IpAddr::V6(Ipv6Addr::from(octets))
        } else {
            if buf.remaining() < 4 {
                return Err(SapError::PacketTooShort(total));
            }
            let mut octets = [0u8; 4];
            buf.copy_to_slice(&mut octets);
            IpAddr::V4(Ipv4Addr::from(octets))
        };

        if buf.remaining() < auth_len {
            return Err(SapError::PacketTooShort(total));
        }
        let auth_data = buf.copy_to_bytes(auth_len);

        // No decryption handler exists, so an encrypted payload is fatal
        // for this packet.
        if encrypted {
            return Err(SapError::EncryptionNotSupported);
        }

        let (payload_type, mut payload) = read_payload_type(buf, total)?;

        if compressed {
            payload = inflate(payload)?;
        }

        Ok(Self {
            version,
            message_type,
            source,
            msg_id_hash,
            auth_data,
            payload_type,
            payload,
        })
    }

    /// Encode the packet for transmission
    ///
    /// Always emits an uncompressed, unencrypted packet with an explicit
    /// payload type field. The header's auth length field is one byte,
    /// so at most 255 bytes of auth data go on the wire; any excess is
    /// dropped.
    pub fn encode(&self) -> Bytes {
        let auth_data = &self.auth_data[..self.auth_data.len().min(u8::MAX as usize)];
        let mut buf = BytesMut::with_capacity(
            8 + 16 + auth_data.len() + self.payload_type.len() + 1 + self.payload.len(),
        );

        let mut flags = (self.version & 0x07) << 5;
        if self.source.is_ipv6() {
            flags |= FLAG_IPV6;
        }
        if self.message_type == MessageType::Deletion {
            flags |= FLAG_DELETION;
        }
        buf.put_u8(flags);
        buf.put_u8(auth_data.len() as u8);
        buf.put_u16(self.msg_id_hash);
        match self.source {
            IpAddr::V4(addr) => buf.put_slice(&addr.octets()),
            IpAddr::V6(addr) => buf.put_slice(&addr.octets()),
        }
        buf.put_slice(auth_data);
        buf.put_slice(self.payload_type.as_bytes());
        buf.put_u8(0);
        buf.put_slice(&self.payload);

        buf.freeze()
    }

    /// The payload as UTF-8 text
    pub fn payload_str(&self) -> Result<&str, SapError> {
        std::str::from_utf8(&self.payload).map_err(|_| SapError::InvalidPayload)
    }

    /// Decode the origin carried by a deletion payload
    ///
    /// The payload is the full six-field body of an `o=` line, optionally
    /// prefixed with `o=` and terminated with a line break.
    pub fn deletion_origin(&self) -> Result<Origin, SapError> {
        let text = self.payload_str()?;
        let body = text.trim_end_matches(['\r', '\n']);
        let body = body.strip_prefix("o=").unwrap_or(body);
        Origin::parse_body(body).map_err(|_| SapError::InvalidDeletionOrigin)
    }
}

/// Read the NUL-terminated payload type and split off the payload.
///
/// SAPv1 special case: if the field starts with `v=` there is no payload
/// type at all; the field start is the payload start and the type is
/// `application/sdp`.
fn read_payload_type(buf: Bytes, total: usize) -> Result<(String, Bytes), SapError> {
    if buf.len() >= 2 && &buf[..2] == b"v=" {
        return Ok((PAYLOAD_TYPE_SDP.to_string(), buf));
    }

    let terminator = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or(SapError::PacketTooShort(total))?;
    let payload_type = std::str::from_utf8(&buf[..terminator])
        .map_err(|_| SapError::InvalidPayload)?
        .to_string();
    Ok((payload_type, buf.slice(terminator + 1..)))
}

/// Inflate a compressed payload
///
/// The payload carries a 2-byte header before the raw DEFLATE stream;
/// skip it and inflate the rest into a fresh buffer.
fn inflate(payload: Bytes) -> Result<Bytes, SapError> {
    if payload.len() < 2 {
        return Err(SapError::PacketTooShort(payload.len()));
    }
    let mut decoder = flate2::read::DeflateDecoder::new(&payload[2..]);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| SapError::DecompressionFailed(e.to_string()))?;
    Ok(Bytes::from(inflated))
}

/// 16-bit message ID hash for outgoing packets
fn msg_id_hash(payload: &[u8]) -> u16 {
    payload
        .iter()
        .fold(0u16, |hash, &b| hash.wrapping_mul(31).wrapping_add(b as u16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SDP: &str = "v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\ns=Test\r\nt=0 0\r\n";

    fn raw_packet(flags: u8, payload_type: Option<&str>, payload: &[u8]) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u8(flags);
        buf.put_u8(0); // auth len
        buf.put_u16(0xBEEF);
        buf.put_slice(&[10, 0, 0, 1]);
        if let Some(payload_type) = payload_type {
            buf.put_slice(payload_type.as_bytes());
            buf.put_u8(0);
        }
        buf.put_slice(payload);
        buf.freeze()
    }

    #[test]
    fn test_decode_announcement() {
        let datagram = raw_packet(0x20, Some("application/sdp"), SDP.as_bytes());
        let packet = SapPacket::decode(&datagram).unwrap();

        assert_eq!(packet.version, 1);
        assert_eq!(packet.message_type, MessageType::Announcement);
        assert_eq!(packet.source, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(packet.msg_id_hash, 0xBEEF);
        assert_eq!(packet.payload_type, "application/sdp");
        assert_eq!(packet.payload_str().unwrap(), SDP);
    }

    #[test]
    fn test_decode_does_not_mutate_input() {
        let datagram = raw_packet(0x20, Some("application/sdp"), SDP.as_bytes());
        let copy = datagram.clone();
        SapPacket::decode(&datagram).unwrap();
        assert_eq!(datagram, copy);
    }

    #[test]
    fn test_sapv1_missing_payload_type() {
        // No payload type field at all: payload starts directly with "v="
        let datagram = raw_packet(0x20, None, SDP.as_bytes());
        let packet = SapPacket::decode(&datagram).unwrap();

        assert_eq!(packet.payload_type, "application/sdp");
        assert_eq!(packet.payload_str().unwrap(), SDP);
    }

    #[test]
    fn test_decode_deletion_flag() {
        let payload = b"o=- 1 2 IN IP4 127.0.0.1\r\n";
        let datagram = raw_packet(0x24, Some("application/sdp"), payload);
        let packet = SapPacket::decode(&datagram).unwrap();

        assert_eq!(packet.message_type, MessageType::Deletion);
        let origin = packet.deletion_origin().unwrap();
        assert_eq!(origin.session_id, 1);
        assert_eq!(origin.session_version, 2);
        assert_eq!(origin.unicast_address, "127.0.0.1");
    }

    #[test]
    fn test_deletion_origin_without_prefix() {
        let datagram = raw_packet(0x24, Some("application/sdp"), b"- 1 2 IN IP4 127.0.0.1");
        let packet = SapPacket::decode(&datagram).unwrap();
        assert_eq!(packet.deletion_origin().unwrap().session_id, 1);
    }

    #[test]
    fn test_deletion_origin_malformed() {
        let datagram = raw_packet(0x24, Some("application/sdp"), b"o=- 1 IN\r\n");
        let packet = SapPacket::decode(&datagram).unwrap();
        assert_eq!(
            packet.deletion_origin().unwrap_err(),
            SapError::InvalidDeletionOrigin
        );
    }

    #[test]
    fn test_encrypted_rejected() {
        let datagram = raw_packet(0x22, Some("application/sdp"), SDP.as_bytes());
        assert_eq!(
            SapPacket::decode(&datagram).unwrap_err(),
            SapError::EncryptionNotSupported
        );
    }

    #[test]
    fn test_compressed_payload() {
        // zlib output = 2-byte header + raw DEFLATE stream, matching the
        // wire format's 2-byte prefix rule
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(SDP.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let datagram = raw_packet(0x21, Some("application/sdp"), &compressed);
        let packet = SapPacket::decode(&datagram).unwrap();
        assert_eq!(packet.payload_str().unwrap(), SDP);
    }

    #[test]
    fn test_compressed_garbage_rejected() {
        let datagram = raw_packet(0x21, Some("application/sdp"), &[1, 2, 3, 4, 5]);
        assert!(matches!(
            SapPacket::decode(&datagram).unwrap_err(),
            SapError::DecompressionFailed(_)
        ));
    }

    #[test]
    fn test_ipv6_source() {
        let mut buf = BytesMut::new();
        buf.put_u8(0x30); // version 1 + IPv6 flag
        buf.put_u8(0);
        buf.put_u16(0);
        buf.put_slice(&Ipv6Addr::LOCALHOST.octets());
        buf.put_slice(b"application/sdp\0");
        buf.put_slice(SDP.as_bytes());

        let packet = SapPacket::decode(&buf.freeze()).unwrap();
        assert_eq!(packet.source, IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn test_auth_data_skipped() {
        let mut buf = BytesMut::new();
        buf.put_u8(0x20);
        buf.put_u8(4); // auth len
        buf.put_u16(0);
        buf.put_slice(&[10, 0, 0, 1]);
        buf.put_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        buf.put_slice(b"application/sdp\0");
        buf.put_slice(SDP.as_bytes());

        let packet = SapPacket::decode(&buf.freeze()).unwrap();
        assert_eq!(&packet.auth_data[..], &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(packet.payload_str().unwrap(), SDP);
    }

    #[test]
    fn test_truncated_packets() {
        for len in [0, 1, 3] {
            let datagram = Bytes::from(vec![0x20; len]);
            assert_eq!(
                SapPacket::decode(&datagram).unwrap_err(),
                SapError::PacketTooShort(len)
            );
        }

        // Header claims 4 bytes of auth data that are not present
        let mut buf = BytesMut::new();
        buf.put_u8(0x20);
        buf.put_u8(4);
        buf.put_u16(0);
        buf.put_slice(&[10, 0, 0, 1]);
        assert!(SapPacket::decode(&buf.freeze()).is_err());

        // Payload type with no terminator
        let mut buf = BytesMut::new();
        buf.put_u8(0x20);
        buf.put_u8(0);
        buf.put_u16(0);
        buf.put_slice(&[10, 0, 0, 1]);
        buf.put_slice(b"application/sdp");
        assert!(SapPacket::decode(&buf.freeze()).is_err());
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let description = crate::sdp::SessionDescription::parse(SDP).unwrap();
        let packet = SapPacket::announcement(Ipv4Addr::new(192, 168, 1, 10), &description);
        let decoded = SapPacket::decode(&packet.encode()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_encode_caps_auth_data_length() {
        let description = crate::sdp::SessionDescription::parse(SDP).unwrap();
        let mut packet = SapPacket::announcement(Ipv4Addr::new(10, 0, 0, 1), &description);
        packet.auth_data = Bytes::from(vec![0xAB; 300]);

        // The header still matches the body and the payload survives
        let decoded = SapPacket::decode(&packet.encode()).unwrap();
        assert_eq!(decoded.auth_data.len(), 255);
        assert_eq!(decoded.payload_str().unwrap(), SDP);
    }

    #[test]
    fn test_encode_deletion_roundtrip() {
        let origin = Origin::new("-", 7, 3, "IN", "IP4", "192.168.1.10").unwrap();
        let packet = SapPacket::deletion(Ipv4Addr::new(192, 168, 1, 10), &origin);
        let decoded = SapPacket::decode(&packet.encode()).unwrap();
        assert_eq!(decoded.message_type, MessageType::Deletion);
        assert_eq!(decoded.deletion_origin().unwrap(), origin);
    }
}
