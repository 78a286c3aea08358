//! Session discovery monitor
//!
//! Joins the SAP multicast group on one interface and prints every
//! session that appears, changes or disappears.
//!
//! Run with: cargo run --example session_monitor [IFACE_NAME IFACE_INDEX IFACE_IPV4]
//!
//! Examples:
//!   cargo run --example session_monitor                       # lo / index 1 / 127.0.0.1
//!   cargo run --example session_monitor eth0 2 192.168.1.10
//!
//! Generate traffic to watch, e.g. with ffmpeg:
//!   ffmpeg -re -i input.mp4 -f rtp_mpegts -sdp_file /dev/stdout \
//!     "rtp://224.2.36.42:5004?ttl=1" (announce the SDP with a SAP tool)

use std::net::Ipv4Addr;
use std::sync::Arc;

use sap::client::{InterfaceStatus, NetworkInterface, SapClient, UdpTransport};
use sap::registry::SessionEvent;
use tokio::sync::mpsc;

fn print_usage() {
    eprintln!("Usage: session_monitor [IFACE_NAME IFACE_INDEX IFACE_IPV4]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  IFACE_NAME    OS interface name (default: lo)");
    eprintln!("  IFACE_INDEX   OS interface index (default: 1)");
    eprintln!("  IFACE_IPV4    IPv4 address on that interface (default: 127.0.0.1)");
}

fn parse_interface(args: &[String]) -> Result<NetworkInterface, String> {
    match args {
        [] => Ok(NetworkInterface::new("lo", 1, Ipv4Addr::LOCALHOST)),
        [name, index, ipv4] => {
            let index: u32 = index
                .parse()
                .map_err(|_| format!("Invalid interface index: '{}'", index))?;
            let ipv4: Ipv4Addr = ipv4
                .parse()
                .map_err(|_| format!("Invalid IPv4 address: '{}'", ipv4))?;
            Ok(NetworkInterface::new(name.clone(), index, ipv4))
        }
        _ => Err("Expected zero or three arguments".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let interface = match parse_interface(&args) {
        Ok(interface) => interface,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sap=debug".parse()?)
                .add_directive("session_monitor=debug".parse()?),
        )
        .init();

    println!(
        "Monitoring SAP announcements on {} ({}) ...",
        interface, interface.ipv4
    );

    let client = Arc::new(SapClient::<UdpTransport>::new());
    let mut events = client.subscribe();
    let mut errors = client.errors();

    let (status_tx, status_rx) = mpsc::channel(16);
    status_tx.send(vec![InterfaceStatus::up(interface)]).await?;
    client.enable(status_rx).await;

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(SessionEvent::Added(session)) => {
                        println!(
                            "+ {} (id {}, v{}) on {}",
                            session.description.name,
                            session.description.origin.session_id,
                            session.description.origin.session_version,
                            session.interface,
                        );
                    }
                    Ok(SessionEvent::Replaced { old, new }) => {
                        println!(
                            "~ {} (v{} -> v{})",
                            new.description.name,
                            old.description.origin.session_version,
                            new.description.origin.session_version,
                        );
                    }
                    Ok(SessionEvent::Removed(session)) => {
                        println!("- {}", session.description.name);
                    }
                    Err(_) => break,
                }
                println!("  {} session(s) live", client.sessions().len());
            }
            error = errors.recv() => {
                if let Ok(error) = error {
                    eprintln!("! {}", error);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    client.disable().await;
    Ok(())
}
