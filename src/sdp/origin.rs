//! Session origin (`o=` line)
//!
//! The origin identifies a session and orders its updates. Session
//! identity is every field except `session_version`; a strictly greater
//! `session_version` within one identity marks an update.

use std::net::IpAddr;

use crate::error::{SdpError, ValidationError};

/// The `o=` line of a session description
///
/// `<username> <sess-id> <sess-version> <nettype> <addrtype> <unicast-address>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub user_name: String,
    pub session_id: u64,
    pub session_version: u64,
    pub network_type: String,
    pub address_type: String,
    pub unicast_address: String,
}

/// Session identity: every origin field except the version
///
/// Used as part of the registry slot key. Two origins with equal identity
/// describe the same session regardless of `session_version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionIdentity {
    pub user_name: String,
    pub session_id: u64,
    pub network_type: String,
    pub address_type: String,
    pub unicast_address: String,
}

impl Origin {
    /// Create an origin with explicit fields
    ///
    /// All string fields must be non-empty.
    pub fn new(
        user_name: impl Into<String>,
        session_id: u64,
        session_version: u64,
        network_type: impl Into<String>,
        address_type: impl Into<String>,
        unicast_address: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let origin = Self {
            user_name: user_name.into(),
            session_id,
            session_version,
            network_type: network_type.into(),
            address_type: address_type.into(),
            unicast_address: unicast_address.into(),
        };
        origin.validate()?;
        Ok(origin)
    }

    /// Create an origin for a local address with the conventional defaults
    /// (`-` username, `IN` network type)
    pub fn from_address(session_id: u64, session_version: u64, address: IpAddr) -> Self {
        let address_type = match address {
            IpAddr::V4(_) => "IP4",
            IpAddr::V6(_) => "IP6",
        };
        Self {
            user_name: "-".to_string(),
            session_id,
            session_version,
            network_type: "IN".to_string(),
            address_type: address_type.to_string(),
            unicast_address: address.to_string(),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.user_name.is_empty() {
            return Err(ValidationError::new("user_name"));
        }
        if self.network_type.is_empty() {
            return Err(ValidationError::new("network_type"));
        }
        if self.address_type.is_empty() {
            return Err(ValidationError::new("address_type"));
        }
        if self.unicast_address.is_empty() {
            return Err(ValidationError::new("unicast_address"));
        }
        Ok(())
    }

    /// Parse the body of an `o=` line (the part after `o=`)
    ///
    /// Also used to decode SAP deletion payloads, which carry the same
    /// six-field tokenization.
    pub fn parse_body(body: &str) -> Result<Self, SdpError> {
        let invalid = || SdpError::InvalidLine {
            line: 1,
            text: body.to_string(),
        };

        let parts: Vec<&str> = body.split(' ').collect();
        if parts.len() != 6 {
            return Err(invalid());
        }
        let session_id: u64 = parts[1].parse().map_err(|_| invalid())?;
        let session_version: u64 = parts[2].parse().map_err(|_| invalid())?;

        Origin::new(
            parts[0],
            session_id,
            session_version,
            parts[3],
            parts[4],
            parts[5],
        )
        .map_err(|_| invalid())
    }

    /// The identity part of this origin
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            user_name: self.user_name.clone(),
            session_id: self.session_id,
            network_type: self.network_type.clone(),
            address_type: self.address_type.clone(),
            unicast_address: self.unicast_address.clone(),
        }
    }

    /// Whether `other` describes the same session (identity match,
    /// version ignored)
    pub fn is_same_session(&self, other: &Origin) -> bool {
        self.session_id == other.session_id
            && self.user_name == other.user_name
            && self.network_type == other.network_type
            && self.address_type == other.address_type
            && self.unicast_address == other.unicast_address
    }

    /// Whether `self` is a strictly newer version of the same session
    pub fn is_update_of(&self, other: &Origin) -> bool {
        self.is_same_session(other) && self.session_version > other.session_version
    }
}

impl std::fmt::Display for Origin {
    /// Formats the `o=` line body (without the `o=` prefix)
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.user_name,
            self.session_id,
            self.session_version,
            self.network_type,
            self.address_type,
            self.unicast_address
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(version: u64) -> Origin {
        Origin::new("-", 42, version, "IN", "IP4", "10.0.0.1").unwrap()
    }

    #[test]
    fn test_parse_body() {
        let o = Origin::parse_body("alice 1234 5678 IN IP4 192.168.1.5").unwrap();
        assert_eq!(o.user_name, "alice");
        assert_eq!(o.session_id, 1234);
        assert_eq!(o.session_version, 5678);
        assert_eq!(o.network_type, "IN");
        assert_eq!(o.address_type, "IP4");
        assert_eq!(o.unicast_address, "192.168.1.5");
    }

    #[test]
    fn test_parse_body_roundtrip() {
        let o = origin(7);
        let reparsed = Origin::parse_body(&o.to_string()).unwrap();
        assert_eq!(o, reparsed);
    }

    #[test]
    fn test_parse_body_wrong_field_count() {
        assert!(Origin::parse_body("alice 1234 5678 IN IP4").is_err());
        assert!(Origin::parse_body("alice 1234 5678 IN IP4 10.0.0.1 extra").is_err());
    }

    #[test]
    fn test_parse_body_bad_numeric() {
        assert!(Origin::parse_body("alice x 5678 IN IP4 10.0.0.1").is_err());
        assert!(Origin::parse_body("alice 1234 -1 IN IP4 10.0.0.1").is_err());
    }

    #[test]
    fn test_empty_field_rejected() {
        assert!(Origin::new("", 1, 1, "IN", "IP4", "10.0.0.1").is_err());
        assert!(Origin::new("-", 1, 1, "", "IP4", "10.0.0.1").is_err());
        assert!(Origin::new("-", 1, 1, "IN", "IP4", "").is_err());
    }

    #[test]
    fn test_same_session_ignores_version() {
        assert!(origin(1).is_same_session(&origin(2)));
        assert_eq!(origin(1).identity(), origin(2).identity());
    }

    #[test]
    fn test_different_identity_fields() {
        let base = origin(1);
        let mut other = origin(1);
        other.unicast_address = "10.0.0.2".to_string();
        assert!(!base.is_same_session(&other));

        let mut other = origin(1);
        other.session_id = 43;
        assert!(!base.is_same_session(&other));

        let mut other = origin(1);
        other.user_name = "bob".to_string();
        assert!(!base.is_same_session(&other));
    }

    #[test]
    fn test_is_update_of() {
        assert!(origin(2).is_update_of(&origin(1)));
        assert!(!origin(1).is_update_of(&origin(1)));
        assert!(!origin(1).is_update_of(&origin(2)));
    }

    #[test]
    fn test_from_address() {
        let o = Origin::from_address(9, 1, "10.1.2.3".parse().unwrap());
        assert_eq!(o.address_type, "IP4");
        assert_eq!(o.user_name, "-");

        let o = Origin::from_address(9, 1, "::1".parse().unwrap());
        assert_eq!(o.address_type, "IP6");
    }
}
