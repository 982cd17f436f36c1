//! Reliable link-layer framing and file-transfer protocol for the
//! treasure-hunt game (`SPEC_FULL.md`): frame codec, checksum, sequence
//! algebra, stop-and-wait engine, movement and file-transfer message
//! encoding, and the `GameState` collaborator. Raw sockets are injected
//! through the `Transport` trait; this crate never opens one itself.

pub mod collaborators;
pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod mac;
pub mod movement;
pub mod reliable;
pub mod seq;
pub mod transfer;
pub mod transport;

pub use error::{Error, Result};
pub use mac::MacAddr;
