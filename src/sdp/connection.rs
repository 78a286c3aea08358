//! Connection data (`c=` line)

use crate::error::{SdpError, ValidationError};

/// The `c=` line of a session or media block
///
/// `<nettype> <addrtype> <connection-address>[/<ttl>][/<number of addresses>]`
///
/// For `IP6` address types a single numeric suffix is an address count,
/// not a TTL; IPv6 has no connection TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub network_type: String,
    pub address_type: String,
    pub address: String,
    pub ttl: u32,
    pub address_count: u32,
}

impl Connection {
    /// Create a connection with TTL 0 and a single address
    pub fn new(
        network_type: impl Into<String>,
        address_type: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let connection = Self {
            network_type: network_type.into(),
            address_type: address_type.into(),
            address: address.into(),
            ttl: 0,
            address_count: 1,
        };
        connection.validate()?;
        Ok(connection)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.network_type.is_empty() {
            return Err(ValidationError::new("network_type"));
        }
        if self.address_type.is_empty() {
            return Err(ValidationError::new("address_type"));
        }
        if self.address.is_empty() {
            return Err(ValidationError::new("address"));
        }
        Ok(())
    }

    /// Parse the body of a `c=` line (the part after `c=`)
    pub fn parse_body(body: &str) -> Result<Self, SdpError> {
        let invalid = || SdpError::InvalidLine {
            line: 1,
            text: body.to_string(),
        };

        let parts: Vec<&str> = body.split(' ').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let address_parts: Vec<&str> = parts[2].split('/').collect();
        if address_parts.len() > 3 {
            return Err(invalid());
        }

        let mut connection =
            Connection::new(parts[0], parts[1], address_parts[0]).map_err(|_| invalid())?;

        if address_parts.len() >= 2 {
            connection.ttl = address_parts[1].parse().map_err(|_| invalid())?;
            if address_parts.len() == 3 {
                connection.address_count = address_parts[2].parse().map_err(|_| invalid())?;
            }
            if connection.address_type == "IP6" {
                // IPv6 has no TTL: a single suffix is the address count
                if address_parts.len() == 3 {
                    return Err(invalid());
                }
                connection.address_count = connection.ttl;
                connection.ttl = 0;
            }
        }

        Ok(connection)
    }
}

impl std::fmt::Display for Connection {
    /// Formats the `c=` line body (without the `c=` prefix)
    ///
    /// The suffix forms are chosen so that the output re-parses to an
    /// equal value: an IP4 address count other than one forces the TTL
    /// suffix to be written as well, since the first suffix always
    /// parses as a TTL.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.network_type, self.address_type, self.address
        )?;
        if self.address_type == "IP6" {
            if self.address_count != 1 {
                write!(f, "/{}", self.address_count)?;
            }
        } else if self.address_count != 1 {
            write!(f, "/{}/{}", self.ttl, self.address_count)?;
        } else if self.ttl != 0 {
            write!(f, "/{}", self.ttl)?;
        }
        Ok(())
    }
}
