//! Destination-side file handling, grounded on
//! `original_source/treasure_protocol.c:verifica_espaco_disponivel` (10%
//! safety margin over `statvfs` free space) and
//! `treasure_client.c:iniciar_recebimento_arquivo`/`finalizar_recebimento_arquivo`.

use std::ffi::CString;
use std::fs::File;
use std::io::Write;
use std::mem;
use std::path::{Path, PathBuf};

use log::warn;

use protocol::collaborators::FileSink;
use protocol::error::Result;

pub struct ReceivedFileSink {
    dir: PathBuf,
}

impl ReceivedFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ReceivedFileSink { dir: dir.into() }
    }
}

impl FileSink for ReceivedFileSink {
    fn check_space(&self, size: u64) -> bool {
        match free_bytes(&self.dir) {
            Some(free) => {
                let needed = (size as f64 * 1.1) as u64;
                free >= needed
            }
            None => {
                warn!("statvfs failed for {:?}, assuming insufficient space", self.dir);
                false
            }
        }
    }

    fn create(&mut self, name: &str) -> Result<Box<dyn Write + Send>> {
        let path = self.dir.join(name);
        let file = File::create(path)?;
        Ok(Box::new(file))
    }

    fn abort(&mut self, name: &str) {
        let path = self.dir.join(name);
        let _ = std::fs::remove_file(path);
    }
}

/// Free space in bytes, via `statvfs`, matching the reference's
/// `f_bsize * f_bavail` computation.
fn free_bytes(dir: &Path) -> Option<u64> {
    let cpath = CString::new(dir.to_str()?).ok()?;
    let mut stat: libc::statvfs = unsafe { mem::zeroed() };
    let rc = unsafe { libc::statvfs(cpath.as_ptr(), &mut stat) };
    if rc != 0 {
        return None;
    }
    Some(stat.f_bsize as u64 * stat.f_bavail as u64)
}

/// Creates the received-files directory if it doesn't exist yet, forcing
/// mode 0777 regardless of the process umask, mirroring the reference's
/// `mkdir(DIRETORIO_RECEBIDOS, 0777)` plus its `chmod` fallback when the
/// directory already exists with different permissions.
pub fn ensure_received_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    if !dir.exists() {
        std::fs::DirBuilder::new().recursive(true).mode(0o777).create(dir)?;
    } else {
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o777))?;
    }
    Ok(())
}
