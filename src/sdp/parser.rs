//! SDP text parser
//!
//! Parses one SDP document line by line. Lines before the first `m=` are
//! session-level; every later line belongs to the most recently opened
//! media block. The first malformed line aborts the parse.

use crate::error::{Result, SdpError};

use super::attributes::Attributes;
use super::connection::Connection;
use super::media::Media;
use super::origin::Origin;
use super::session::{SessionDescription, SUPPORTED_VERSION};
use super::types::{Bandwidth, TimeRange};

/// Parser strictness options
///
/// The default is strict: empty lines, unknown line types, recognized but
/// unsupported line types (`z`, `k`, `r`) and non-zero protocol versions
/// all fail the parse. Each can be relaxed individually.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub ignore_empty_lines: bool,
    pub ignore_unknown_lines: bool,
    pub ignore_unsupported_lines: bool,
    pub ignore_unsupported_version: bool,
}

impl ParseOptions {
    /// Strict parsing (same as `Default`)
    pub fn strict() -> Self {
        Self::default()
    }

    /// Accept (and skip) empty lines
    pub fn ignore_empty_lines(mut self) -> Self {
        self.ignore_empty_lines = true;
        self
    }

    /// Accept (and skip) unknown line types
    pub fn ignore_unknown_lines(mut self) -> Self {
        self.ignore_unknown_lines = true;
        self
    }

    /// Accept (and skip) recognized but unsupported line types (`z`, `k`, `r`)
    pub fn ignore_unsupported_lines(mut self) -> Self {
        self.ignore_unsupported_lines = true;
        self
    }

    /// Accept protocol versions other than 0
    pub fn ignore_unsupported_version(mut self) -> Self {
        self.ignore_unsupported_version = true;
        self
    }

    /// All relaxations enabled
    pub fn lenient() -> Self {
        Self::default()
            .ignore_empty_lines()
            .ignore_unknown_lines()
            .ignore_unsupported_lines()
            .ignore_unsupported_version()
    }
}

/// Parse one SDP document
///
/// No partial document is ever returned: the first malformed line fails
/// the whole parse.
pub fn parse(text: &str, options: ParseOptions) -> Result<SessionDescription> {
    let mut version: Option<u32> = None;
    let mut origin: Option<Origin> = None;
    let mut name: Option<String> = None;
    let mut information: Option<String> = None;
    let mut uri: Option<String> = None;
    let mut emails: Vec<String> = Vec::new();
    let mut phones: Vec<String> = Vec::new();
    let mut connection: Option<Connection> = None;
    let mut bandwidths: Vec<Bandwidth> = Vec::new();
    let mut times: Vec<TimeRange> = Vec::new();
    let mut attributes = Attributes::new();
    let mut media: Vec<Media> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let invalid = || SdpError::InvalidLine {
            line: line_number,
            text: line.to_string(),
        };
        let unsupported = || SdpError::UnsupportedLine {
            line: line_number,
            text: line.to_string(),
        };

        if line.is_empty() {
            if options.ignore_empty_lines {
                continue;
            }
            return Err(invalid().into());
        }
        if line.len() < 3 || line.as_bytes()[1] != b'=' {
            return Err(invalid().into());
        }
        let value = &line[2..];
        let in_media = !media.is_empty();

        match line.as_bytes()[0] {
            b'v' => {
                if in_media {
                    return Err(invalid().into());
                }
                let parsed: u32 = value.parse().map_err(|_| invalid())?;
                if parsed != SUPPORTED_VERSION && !options.ignore_unsupported_version {
                    return Err(unsupported().into());
                }
                version = Some(parsed);
            }
            b'o' => {
                if in_media {
                    return Err(invalid().into());
                }
                origin = Some(Origin::parse_body(value).map_err(|_| invalid())?);
            }
            b's' => {
                if in_media {
                    return Err(invalid().into());
                }
                name = Some(value.to_string());
            }
            b'i' => match media.last_mut() {
                Some(block) => block.information = Some(value.to_string()),
                None => information = Some(value.to_string()),
            },
            b'u' => {
                if in_media {
                    return Err(invalid().into());
                }
                uri = Some(value.to_string());
            }
            b'e' => {
                if in_media {
                    return Err(invalid().into());
                }
                emails.push(value.to_string());
            }
            b'p' => {
                if in_media {
                    return Err(invalid().into());
                }
                phones.push(value.to_string());
            }
            b'c' => {
                let parsed = Connection::parse_body(value).map_err(|_| invalid())?;
                match media.last_mut() {
                    Some(block) => block.connections.push(parsed),
                    None => {
                        // at most one session-level connection
                        if connection.is_some() {
                            return Err(invalid().into());
                        }
                        connection = Some(parsed);
                    }
                }
            }
            b'b' => {
                let parsed = Bandwidth::parse_body(value).map_err(|_| invalid())?;
                match media.last_mut() {
                    Some(block) => block.bandwidths.push(parsed),
                    None => bandwidths.push(parsed),
                }
            }
            b't' => {
                if in_media {
                    return Err(invalid().into());
                }
                times.push(TimeRange::parse_body(value).map_err(|_| invalid())?);
            }
            b'a' => {
                let parsed = Attributes::parse_body(value);
                match media.last_mut() {
                    Some(block) => block.attributes.push_attribute(parsed),
                    None => attributes.push_attribute(parsed),
                }
            }
            b'm' => {
                media.push(Media::parse_body(value).map_err(|_| invalid())?);
            }
            b'z' | b'k' | b'r' => {
                if !options.ignore_unsupported_lines {
                    return Err(unsupported().into());
                }
            }
            _ => {
                if !options.ignore_unknown_lines {
                    return Err(invalid().into());
                }
            }
        }
    }

    let version = version.ok_or(SdpError::MissingField("v"))?;
    let origin = origin.ok_or(SdpError::MissingField("o"))?;
    let name = name.ok_or(SdpError::MissingField("s"))?;

    Ok(SessionDescription {
        version,
        origin,
        name,
        information,
        uri,
        emails,
        phones,
        connection,
        bandwidths,
        times,
        attributes,
        media,
    })
}
