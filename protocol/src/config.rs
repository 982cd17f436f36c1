//! Defaults shared by both binaries' CLIs and the reliability engine.

use std::time::Duration;

use crate::mac::MacAddr;
use crate::reliable::StopWaitConfig;

/// `TIMEOUT_MS` from `original_source/treasure_protocol.h`.
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// `MAX_RETRIES` from `original_source/treasure_protocol.h`.
pub const DEFAULT_MAX_RETRIES: u8 = 5;

/// Default server interface (spec.md §6).
pub const DEFAULT_SERVER_INTERFACE: &str = "veth0";

/// Default client interface (spec.md §6).
pub const DEFAULT_CLIENT_INTERFACE: &str = "veth1";

/// `mac_servidor` from `original_source/treasure_server.c`.
pub const DEFAULT_SERVER_MAC: MacAddr = MacAddr::new([0x62, 0x42, 0x03, 0x53, 0xa4, 0x24]);

/// `mac_cliente` from `original_source/treasure_client.c`.
pub const DEFAULT_CLIENT_MAC: MacAddr = MacAddr::new([0xAA, 0xef, 0x89, 0x44, 0x14, 0xd2]);

/// Directory the server reads treasure payloads from.
pub const DEFAULT_OBJECTS_DIR: &str = "objetos";

/// Directory the client writes received payloads to.
pub const DEFAULT_RECEIVED_DIR: &str = "recebidos";

/// Builds the engine's timing config from CLI-overridable milliseconds
/// and retry count.
pub fn stop_wait_config(timeout_ms: u64, max_retries: u8) -> StopWaitConfig {
    StopWaitConfig { timeout: Duration::from_millis(timeout_ms), max_retries }
}
