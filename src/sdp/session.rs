//! Session description document model
//!
//! A `SessionDescription` is the parsed form of one SDP document. Fields
//! follow the fixed RFC 4566 ordering, which `Display` reproduces so that
//! serializing and re-parsing yields an equal document.

use std::io::{Read, Write};

use crate::error::{Error, Result, ValidationError};

use super::attributes::Attributes;
use super::connection::Connection;
use super::media::Media;
use super::origin::Origin;
use super::parser::{self, ParseOptions};
use super::types::{Bandwidth, TimeRange};

/// The only protocol version this library supports
pub const SUPPORTED_VERSION: u32 = 0;

/// A parsed SDP document
///
/// Construct with [`SessionDescription::new`] and mutate freely; once a
/// document is handed to the announcement registry it travels inside an
/// `Arc` and is immutable from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    /// Protocol version (`v=`), always 0
    pub version: u32,
    /// Originator and session identity (`o=`)
    pub origin: Origin,
    /// Session name (`s=`)
    pub name: String,
    /// Session information (`i=`)
    pub information: Option<String>,
    /// Session URI (`u=`)
    pub uri: Option<String>,
    /// Email addresses (`e=`), in order
    pub emails: Vec<String>,
    /// Phone numbers (`p=`), in order
    pub phones: Vec<String>,
    /// Session-level connection (`c=`), at most one
    pub connection: Option<Connection>,
    /// Session-level bandwidths (`b=`), in order
    pub bandwidths: Vec<Bandwidth>,
    /// Session times (`t=`), in order
    pub times: Vec<TimeRange>,
    /// Session-level attributes (`a=`), ordered multi-map
    pub attributes: Attributes,
    /// Media blocks (`m=`), in order
    pub media: Vec<Media>,
}

impl SessionDescription {
    /// Create a minimal session description
    pub fn new(name: impl Into<String>, origin: Origin) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::new("name").into());
        }
        Ok(Self {
            version: SUPPORTED_VERSION,
            origin,
            name,
            information: None,
            uri: None,
            emails: Vec::new(),
            phones: Vec::new(),
            connection: None,
            bandwidths: Vec::new(),
            times: Vec::new(),
            attributes: Attributes::new(),
            media: Vec::new(),
        })
    }

    /// Parse SDP text under default (strict) options
    pub fn parse(text: &str) -> Result<Self> {
        parser::parse(text, ParseOptions::default())
    }

    /// Parse SDP text with explicit options
    pub fn parse_with(text: &str, options: ParseOptions) -> Result<Self> {
        parser::parse(text, options)
    }

    /// Read and parse SDP text from a stream
    pub fn load(mut reader: impl Read, options: ParseOptions) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(Error::from)?;
        parser::parse(&text, options)
    }

    /// Serialize to a stream
    pub fn save(&self, mut writer: impl Write) -> Result<()> {
        writer.write_all(self.to_string().as_bytes())?;
        Ok(())
    }

    /// Whether `other` describes the same session (origin identity match)
    pub fn is_same_session(&self, other: &SessionDescription) -> bool {
        self.origin.is_same_session(&other.origin)
    }

    /// Whether `self` is a strictly newer version of the same session
    pub fn is_update_of(&self, other: &SessionDescription) -> bool {
        self.origin.is_update_of(&other.origin)
    }
}

impl std::fmt::Display for SessionDescription {
    /// Emits the document in the fixed field order
    /// `v,o,s,[i],[u],e*,p*,[c],b*,t*,a*,m*{i,c*,b*,a*}` with CRLF
    /// line terminators.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v={}\r\n", self.version)?;
        write!(f, "o={}\r\n", self.origin)?;
        write!(f, "s={}\r\n", self.name)?;
        if let Some(information) = &self.information {
            write!(f, "i={}\r\n", information)?;
        }
        if let Some(uri) = &self.uri {
            write!(f, "u={}\r\n", uri)?;
        }
        for email in &self.emails {
            write!(f, "e={}\r\n", email)?;
        }
        for phone in &self.phones {
            write!(f, "p={}\r\n", phone)?;
        }
        if let Some(connection) = &self.connection {
            write!(f, "c={}\r\n", connection)?;
        }
        for bandwidth in &self.bandwidths {
            write!(f, "b={}\r\n", bandwidth)?;
        }
        for time in &self.times {
            write!(f, "t={}\r\n", time)?;
        }
        for attribute in &self.attributes {
            write!(f, "a={}\r\n", attribute)?;
        }
        for media in &self.media {
            write!(f, "m={}\r\n", media)?;
            if let Some(information) = &media.information {
                write!(f, "i={}\r\n", information)?;
            }
            for connection in &media.connections {
                write!(f, "c={}\r\n", connection)?;
            }
            for bandwidth in &media.bandwidths {
                write!(f, "b={}\r\n", bandwidth)?;
            }
            for attribute in &media.attributes {
                write!(f, "a={}\r\n", attribute)?;
            }
        }
        Ok(())
    }
}
