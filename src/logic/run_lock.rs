use crate::error::{Result, SprinklerError};
use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "sprinklerops.lock";

/// Exclusive advisory lock held for the duration of one run.
///
/// Overlapping scheduled invocations would otherwise both decide and both
/// start zones. The lock belongs to the open file, so the OS releases it when
/// the handle is dropped or the process dies. The file itself stays behind
/// and only records the PID of the last holder.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    _file: File,
}

impl RunLock {
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock().map_err(|e| match e {
            TryLockError::WouldBlock => SprinklerError::Busy(format!(
                "another run holds {}",
                path.display()
            )),
            TryLockError::Error(e) => SprinklerError::Io(e),
        })?;

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        tracing::debug!("Acquired run lock {}", path.display());
        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
