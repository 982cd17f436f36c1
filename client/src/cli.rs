//! Command-line configuration for the treasure-hunt client.

use std::path::PathBuf;

use clap::Parser;
use protocol::config;
use protocol::mac::MacAddr;

#[derive(Debug, Parser)]
#[command(name = "treasure-client", about = "Treasure-hunt link-layer game client")]
pub struct Cli {
    /// Network interface to bind the raw socket to.
    #[arg(long, default_value = config::DEFAULT_CLIENT_INTERFACE)]
    pub interface: String,

    /// This client's own MAC address, used as the frame source address.
    #[arg(long, default_value_t = config::DEFAULT_CLIENT_MAC)]
    pub local_mac: MacAddr,

    /// The server's MAC address, this protocol's only peer.
    #[arg(long, default_value_t = config::DEFAULT_SERVER_MAC)]
    pub peer_mac: MacAddr,

    /// Directory received treasure files are written to.
    #[arg(long, default_value = config::DEFAULT_RECEIVED_DIR)]
    pub received_dir: PathBuf,

    /// Stop-and-wait retransmission timeout, in milliseconds.
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Maximum retransmissions before a send gives up.
    #[arg(long, default_value_t = config::DEFAULT_MAX_RETRIES)]
    pub max_retries: u8,
}
