//! Network interface identity and status
//!
//! The library does not enumerate interfaces itself; the caller supplies
//! snapshots of `InterfaceStatus` through the client's change feed.

use std::net::Ipv4Addr;

/// A network interface a listener can run on
///
/// Identity is the OS interface index: two values with the same index are
/// the same interface even if the name or address changed.
#[derive(Debug, Clone)]
pub struct NetworkInterface {
    /// OS interface name, e.g. `eth0`
    pub name: String,
    /// OS interface index
    pub index: u32,
    /// IPv4 address used to join the multicast group on this interface
    pub ipv4: Ipv4Addr,
}

impl NetworkInterface {
    pub fn new(name: impl Into<String>, index: u32, ipv4: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            index,
            ipv4,
        }
    }
}

impl PartialEq for NetworkInterface {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for NetworkInterface {}

impl std::hash::Hash for NetworkInterface {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl std::fmt::Display for NetworkInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One entry of an interface snapshot from the change feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceStatus {
    pub interface: NetworkInterface,
    /// Operational state; only `true` interfaces get a listener
    pub is_up: bool,
}

impl InterfaceStatus {
    pub fn up(interface: NetworkInterface) -> Self {
        Self {
            interface,
            is_up: true,
        }
    }

    pub fn down(interface: NetworkInterface) -> Self {
        Self {
            interface,
            is_up: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_index() {
        let a = NetworkInterface::new("eth0", 2, Ipv4Addr::new(10, 0, 0, 1));
        let b = NetworkInterface::new("renamed", 2, Ipv4Addr::new(10, 0, 0, 2));
        let c = NetworkInterface::new("eth0", 3, Ipv4Addr::new(10, 0, 0, 1));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
