//! Simple value types: bandwidth (`b=`) and time ranges (`t=`)

use crate::error::{SdpError, ValidationError};

/// The `b=` line: `<bwtype>:<bandwidth>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bandwidth {
    /// Bandwidth type, e.g. `CT` or `AS`
    pub bandwidth_type: String,
    /// Value in kilobits per second
    pub value: u32,
}

impl Bandwidth {
    pub fn new(bandwidth_type: impl Into<String>, value: u32) -> Result<Self, ValidationError> {
        let bandwidth_type = bandwidth_type.into();
        if bandwidth_type.is_empty() {
            return Err(ValidationError::new("bandwidth_type"));
        }
        Ok(Self {
            bandwidth_type,
            value,
        })
    }

    /// Parse the body of a `b=` line (the part after `b=`)
    pub fn parse_body(body: &str) -> Result<Self, SdpError> {
        let invalid = || SdpError::InvalidLine {
            line: 1,
            text: body.to_string(),
        };
        let (bandwidth_type, value) = body.split_once(':').ok_or_else(invalid)?;
        let value: u32 = value.parse().map_err(|_| invalid())?;
        Bandwidth::new(bandwidth_type, value).map_err(|_| invalid())
    }
}

impl std::fmt::Display for Bandwidth {
    /// Formats the `b=` line body (without the `b=` prefix)
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.bandwidth_type, self.value)
    }
}

/// The `t=` line: `<start-time> <stop-time>` (NTP timestamps)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_time: u64,
    pub stop_time: u64,
}

impl TimeRange {
    pub fn new(start_time: u64, stop_time: u64) -> Self {
        Self {
            start_time,
            stop_time,
        }
    }

    /// The permanent session time range (`t=0 0`)
    pub fn permanent() -> Self {
        Self::new(0, 0)
    }

    /// Parse the body of a `t=` line (the part after `t=`)
    pub fn parse_body(body: &str) -> Result<Self, SdpError> {
        let invalid = || SdpError::InvalidLine {
            line: 1,
            text: body.to_string(),
        };
        let (start, stop) = body.split_once(' ').ok_or_else(invalid)?;
        if stop.contains(' ') {
            return Err(invalid());
        }
        Ok(Self {
            start_time: start.parse().map_err(|_| invalid())?,
            stop_time: stop.parse().map_err(|_| invalid())?,
        })
    }
}

impl std::fmt::Display for TimeRange {
    /// Formats the `t=` line body (without the `t=` prefix)
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.start_time, self.stop_time)
    }
}
