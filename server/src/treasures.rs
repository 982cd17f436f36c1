//! Treasure placement and file resolution, grounded on
//! `original_source/treasure_protocol.c:inicializar_jogo` (random
//! placement, collisions retried) and `treasure_server.c:carregar_tipos_tesouros`
//! / `enviar_arquivo_tesouro` (extension probing).

use std::fs::File;
use std::path::{Path, PathBuf};

use rand::Rng;

use protocol::collaborators::{FileKind, FileStore, ResolvedFile, TreasurePlacer};
use protocol::error::{Error, Result};
use protocol::game::{Position, GRID_SIZE, NUM_TREASURES};

const EXTENSIONS: [&str; 3] = [".txt", ".jpg", ".mp4"];

/// Samples `NUM_TREASURES` grid cells uniformly at random, retrying on
/// collision. Matches the reference exactly, including that it never
/// excludes the player's starting cell.
pub struct RandomTreasurePlacer;

impl TreasurePlacer for RandomTreasurePlacer {
    fn place(&mut self) -> [Position; NUM_TREASURES] {
        let mut rng = rand::thread_rng();
        let mut placed: Vec<Position> = Vec::with_capacity(NUM_TREASURES);
        while placed.len() < NUM_TREASURES {
            let pos = Position::new(rng.gen_range(0..GRID_SIZE as u8), rng.gen_range(0..GRID_SIZE as u8));
            if placed.contains(&pos) {
                continue;
            }
            placed.push(pos);
        }
        placed.try_into().expect("exactly NUM_TREASURES placed")
    }
}

/// Resolves treasure file names against a directory on disk, probing
/// `.txt`/`.jpg`/`.mp4` when the stored name carries no extension yet.
pub struct ObjectsFileStore {
    dir: PathBuf,
}

impl ObjectsFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ObjectsFileStore { dir: dir.into() }
    }

    fn resolve_path(&self, treasure_index: usize, stored_name: &str) -> Option<PathBuf> {
        if stored_name.contains('.') {
            let path = self.dir.join(stored_name);
            if path.exists() {
                return Some(path);
            }
        }
        let base = if stored_name.is_empty() { (treasure_index + 1).to_string() } else { stored_name.to_string() };
        for ext in EXTENSIONS {
            let path = self.dir.join(format!("{base}{ext}"));
            if path.exists() {
                return Some(path);
            }
        }
        None
    }
}

impl FileStore for ObjectsFileStore {
    fn open_for_read(&self, treasure_index: usize, stored_name: &str) -> Result<ResolvedFile> {
        let path = self
            .resolve_path(treasure_index, stored_name)
            .ok_or_else(|| Error::InvalidState("no treasure file found for any known extension"))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or(Error::InvalidState("resolved treasure path has no file name"))?;
        let metadata = std::fs::metadata(&path)?;
        let kind = FileKind::from_extension(&name);
        let reader = File::open(&path)?;
        Ok(ResolvedFile { name, kind, size: metadata.len(), reader: Box::new(reader) })
    }
}

/// Creates the treasures directory if it doesn't exist yet, mirroring
/// `main()`'s `stat`/`mkdir` check.
pub fn ensure_objects_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(label: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("treasure-server-test-{label}-{}", std::process::id()));
            let _ = std::fs::remove_dir_all(&dir);
            std::fs::create_dir_all(&dir).unwrap();
            TempDir(dir)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn random_placer_never_collides() {
        let positions = RandomTreasurePlacer.place();
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn probes_extensions_in_order_when_stored_name_is_bare() {
        let tmp = TempDir::new("probe");
        std::fs::write(tmp.0.join("3.jpg"), b"jpegbytes").unwrap();
        let store = ObjectsFileStore::new(&tmp.0);

        let resolved = store.open_for_read(2, "3").unwrap();
        assert_eq!(resolved.name, "3.jpg");
        assert_eq!(resolved.kind, FileKind::Image);
        assert_eq!(resolved.size, 9);
    }

    #[test]
    fn errors_when_no_extension_matches() {
        let tmp = TempDir::new("missing");
        let store = ObjectsFileStore::new(&tmp.0);
        assert!(store.open_for_read(0, "1").is_err());
    }
}
