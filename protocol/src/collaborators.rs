//! Trait seams for the pieces spec.md §1 names as out-of-scope external
//! collaborators: treasure placement, filesystem I/O, and grid
//! rendering. The binaries supply the implementations; the core only
//! depends on these interfaces.

use std::io::{Read, Write};

use crate::error::Result;
use crate::game::{GameState, Position, NUM_TREASURES};

/// Chooses where treasures go. The server's default implementation
/// samples free cells uniformly at random
/// (`original_source/treasure_protocol.c:inicializar_jogo`); tests
/// inject a deterministic placement instead (spec.md §9's open question
/// on the randomness contract).
pub trait TreasurePlacer {
    fn place(&mut self) -> [Position; NUM_TREASURES];
}

/// File kind, chosen from extension the way
/// `original_source/treasure_protocol.c:obter_tipo_arquivo` does, with
/// unknown extensions defaulting to `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Video,
    Image,
}

impl FileKind {
    pub fn from_extension(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".mp4") {
            FileKind::Video
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            FileKind::Image
        } else {
            FileKind::Text
        }
    }

    pub fn to_frame_type(self) -> crate::core::FrameType {
        match self {
            FileKind::Text => crate::core::FrameType::Text,
            FileKind::Video => crate::core::FrameType::Video,
            FileKind::Image => crate::core::FrameType::Image,
        }
    }
}

/// A treasure file resolved and opened for reading, ready for the
/// file-transfer protocol to stream.
pub struct ResolvedFile {
    pub name: String,
    pub kind: FileKind,
    pub size: u64,
    pub reader: Box<dyn Read + Send>,
}

/// Server-side collaborator: resolves a treasure index to its backing
/// file under `objetos/`, probing `.txt`/`.jpg`/`.mp4` when the stored
/// name has no extension (spec.md §6).
pub trait FileStore {
    fn open_for_read(&self, treasure_index: usize, stored_name: &str) -> Result<ResolvedFile>;
}

/// Client-side collaborator: checks free space, creates the destination
/// file under `recebidos/`, and can abort (removing a partial file) per
/// spec.md §4.6's atomicity rule.
pub trait FileSink {
    fn check_space(&self, size: u64) -> bool;
    fn create(&mut self, name: &str) -> Result<Box<dyn Write + Send>>;
    fn abort(&mut self, name: &str);
}

/// Presents the grid to a human. The server renders its privileged view
/// (treasure positions visible); the client renders only what it has
/// discovered.
pub trait GridRenderer {
    fn render(&mut self, game: &GameState);
}
