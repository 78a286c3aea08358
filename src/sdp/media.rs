//! Media description (`m=` line and its block)

use crate::error::{SdpError, ValidationError};

use super::attributes::Attributes;
use super::connection::Connection;
use super::types::Bandwidth;

/// Common media types
pub const TYPE_AUDIO: &str = "audio";
pub const TYPE_VIDEO: &str = "video";
pub const TYPE_TEXT: &str = "text";
pub const TYPE_APPLICATION: &str = "application";
pub const TYPE_MESSAGE: &str = "message";

/// Common transport protocols
pub const PROTOCOL_UDP: &str = "udp";
pub const PROTOCOL_RTP_AVP: &str = "RTP/AVP";
pub const PROTOCOL_RTP_SAVP: &str = "RTP/SAVP";

/// One media block: the `m=` line plus its following `i=`, `c=`, `b=`
/// and `a=` lines
///
/// `m=<media> <port>[/<number of ports>] <proto> <fmt>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub media_type: String,
    pub port: u32,
    pub port_count: u32,
    pub protocol: String,
    pub format: String,
    pub information: Option<String>,
    pub connections: Vec<Connection>,
    pub bandwidths: Vec<Bandwidth>,
    pub attributes: Attributes,
}

impl Media {
    pub fn new(
        media_type: impl Into<String>,
        port: u32,
        protocol: impl Into<String>,
        format: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let media = Self {
            media_type: media_type.into(),
            port,
            port_count: 1,
            protocol: protocol.into(),
            format: format.into(),
            information: None,
            connections: Vec::new(),
            bandwidths: Vec::new(),
            attributes: Attributes::new(),
        };
        media.validate()?;
        Ok(media)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.media_type.is_empty() {
            return Err(ValidationError::new("media_type"));
        }
        if self.protocol.is_empty() {
            return Err(ValidationError::new("protocol"));
        }
        if self.format.is_empty() {
            return Err(ValidationError::new("format"));
        }
        Ok(())
    }

    /// Parse the body of an `m=` line (the part after `m=`)
    ///
    /// The returned media block has no connections, bandwidths or
    /// attributes yet; those follow on later lines.
    pub fn parse_body(body: &str) -> Result<Self, SdpError> {
        let invalid = || SdpError::InvalidLine {
            line: 1,
            text: body.to_string(),
        };

        let parts: Vec<&str> = body.split(' ').collect();
        if parts.len() != 4 {
            return Err(invalid());
        }

        let port_parts: Vec<&str> = parts[1].split('/').collect();
        if port_parts.len() > 2 {
            return Err(invalid());
        }
        let port: u32 = port_parts[0].parse().map_err(|_| invalid())?;

        let mut media = Media::new(parts[0], port, parts[2], parts[3]).map_err(|_| invalid())?;
        if port_parts.len() == 2 {
            media.port_count = port_parts[1].parse().map_err(|_| invalid())?;
        }
        Ok(media)
    }
}

impl std::fmt::Display for Media {
    /// Formats the `m=` line body only (without the `m=` prefix and
    /// without the block's trailing lines)
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.media_type, self.port)?;
        if self.port_count != 1 {
            write!(f, "/{}", self.port_count)?;
        }
        write!(f, " {} {}", self.protocol, self.format)
    }
}
