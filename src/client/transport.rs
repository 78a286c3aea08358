//! UDP multicast transport
//!
//! The listener and the announce path go through the [`Transport`] trait
//! so tests can drive the client with an in-memory implementation. The
//! production implementation is [`UdpTransport`], one socket per enabled
//! interface, joined to the well-known SAP group.

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use tokio::net::UdpSocket;

use crate::error::Result;
use crate::sap::constants::{SAP_MULTICAST_ADDR, SAP_MULTICAST_TTL, SAP_PORT};

use super::interface::NetworkInterface;

/// Datagram transport bound to one network interface
pub trait Transport: Send + Sync + Sized + 'static {
    /// Open the transport on `interface`
    fn open(interface: &NetworkInterface) -> impl Future<Output = Result<Self>> + Send;

    /// Receive one datagram
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    /// Send one datagram to the announcement group
    fn send_to_group(&self, payload: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Release the transport's network resources
    fn close(&self) -> io::Result<()>;
}

/// Production transport: a reusable UDP socket joined to 224.2.127.254:9875
pub struct UdpTransport {
    socket: UdpSocket,
    interface_addr: Ipv4Addr,
}

impl UdpTransport {
    fn bind_socket() -> io::Result<std::net::UdpSocket> {
        let socket = socket2::Socket::new(
            socket2::Domain::IPV4,
            socket2::Type::DGRAM,
            Some(socket2::Protocol::UDP),
        )?;
        // Several clients on one host listen on the same well-known port
        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;

        let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, SAP_PORT);
        socket.bind(&SocketAddr::V4(bind_addr).into())?;
        Ok(socket.into())
    }
}

impl Transport for UdpTransport {
    async fn open(interface: &NetworkInterface) -> Result<Self> {
        let socket = UdpSocket::from_std(Self::bind_socket()?)?;
        socket.join_multicast_v4(SAP_MULTICAST_ADDR, interface.ipv4)?;
        socket.set_multicast_ttl_v4(SAP_MULTICAST_TTL)?;
        socket.set_multicast_loop_v4(true)?;
        socket2::SockRef::from(&socket).set_multicast_if_v4(&interface.ipv4)?;

        tracing::debug!(
            iface = %interface,
            addr = %interface.ipv4,
            group = %SAP_MULTICAST_ADDR,
            port = SAP_PORT,
            "Joined announcement group"
        );

        Ok(Self {
            socket,
            interface_addr: interface.ipv4,
        })
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }

    async fn send_to_group(&self, payload: &[u8]) -> io::Result<usize> {
        let group = SocketAddrV4::new(SAP_MULTICAST_ADDR, SAP_PORT);
        self.socket.send_to(payload, SocketAddr::V4(group)).await
    }

    fn close(&self) -> io::Result<()> {
        self.socket
            .leave_multicast_v4(SAP_MULTICAST_ADDR, self.interface_addr)
    }
}
