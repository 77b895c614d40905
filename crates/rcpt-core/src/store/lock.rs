//! Exclusive advisory lock on a sidecar file next to the store.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs4::fs_std::FileExt;
use tracing::debug;

use crate::error::StoreError;

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Held while a write transaction is in progress.
///
/// The lock belongs to the open file handle, so the operating system drops
/// it when the holder exits or is killed. The lock file itself stays on disk
/// and a leftover one never blocks the next writer.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    _file: File,
}

impl StoreLock {
    /// Lock `path` exclusively, waiting up to `timeout` for another holder.
    ///
    /// Separate handles conflict even within one process, so this serialises
    /// threads as well as processes.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StoreError::io(path, e))?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!("Acquired store lock {}", path.display());
                    return Ok(Self {
                        path: path.to_path_buf(),
                        _file: file,
                    });
                }
                Err(e) if is_contended(&e) => {
                    let waited = start.elapsed();
                    if waited >= timeout {
                        return Err(StoreError::LockTimeout {
                            path: path.to_path_buf(),
                            waited,
                        });
                    }
                    thread::sleep(RETRY_INTERVAL.min(timeout - waited));
                }
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        debug!("Released store lock {}", self.path.display());
    }
}

fn is_contended(err: &io::Error) -> bool {
    // ERROR_LOCK_VIOLATION
    err.kind() == io::ErrorKind::WouldBlock || (cfg!(windows) && err.raw_os_error() == Some(33))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.xlsx.lock");

        let lock = StoreLock::acquire(&path, Duration::from_millis(100)).unwrap();
        assert!(path.exists());
        assert_eq!(lock.path(), path.as_path());

        drop(lock);
        assert!(StoreLock::acquire(&path, Duration::ZERO).is_ok());
    }

    #[test]
    fn test_leftover_lock_file_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.xlsx.lock");
        // As left behind by a writer that was killed mid-transaction.
        fs::write(&path, "4242\n").unwrap();

        assert!(StoreLock::acquire(&path, Duration::from_millis(10)).is_ok());
    }

    #[test]
    fn test_second_holder_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.xlsx.lock");

        let _held = StoreLock::acquire(&path, Duration::from_millis(100)).unwrap();
        let err = StoreLock::acquire(&path, Duration::from_millis(50)).unwrap_err();

        match err {
            StoreError::LockTimeout { path: p, waited } => {
                assert_eq!(p, path);
                assert!(waited >= Duration::from_millis(50));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_waiter_gets_lock_after_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.xlsx.lock");

        let held = StoreLock::acquire(&path, Duration::from_millis(100)).unwrap();
        let waiter_path = path.clone();
        let waiter = thread::spawn(move || StoreLock::acquire(&waiter_path, Duration::from_secs(5)));

        thread::sleep(Duration::from_millis(50));
        drop(held);

        assert!(waiter.join().unwrap().is_ok());
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("store.xlsx.lock");

        let err = StoreLock::acquire(&path, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
