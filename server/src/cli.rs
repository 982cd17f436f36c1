//! Command-line configuration for the treasure-hunt server.

use std::path::PathBuf;

use clap::Parser;
use protocol::config;
use protocol::mac::MacAddr;

#[derive(Debug, Parser)]
#[command(name = "treasure-server", about = "Treasure-hunt link-layer game server")]
pub struct Cli {
    /// Network interface to bind the raw socket to.
    #[arg(long, default_value = config::DEFAULT_SERVER_INTERFACE)]
    pub interface: String,

    /// This server's own MAC address, used as the frame source address.
    #[arg(long, default_value_t = config::DEFAULT_SERVER_MAC)]
    pub local_mac: MacAddr,

    /// The client's MAC address, this protocol's only peer.
    #[arg(long, default_value_t = config::DEFAULT_CLIENT_MAC)]
    pub peer_mac: MacAddr,

    /// Directory treasure payload files are read from.
    #[arg(long, default_value = config::DEFAULT_OBJECTS_DIR)]
    pub objects_dir: PathBuf,

    /// Stop-and-wait retransmission timeout, in milliseconds.
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Maximum retransmissions before a send gives up.
    #[arg(long, default_value_t = config::DEFAULT_MAX_RETRIES)]
    pub max_retries: u8,
}
