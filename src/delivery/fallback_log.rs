use super::{Channel, DeliveryStrategy};
use crate::message::ContactMessage;
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Append-only message log used when the mail transport is unavailable.
///
/// Writers are serialized in-process by a mutex and across processes by an
/// exclusive advisory lock on the file, held only for the duration of one
/// append.
pub struct FallbackLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FallbackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, entry: String) -> io::Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_locked(&path, entry.as_bytes()))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

fn append_locked(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    lock_exclusive(&file)?;
    let result = file.write_all(bytes).and_then(|_| file.flush());
    unlock(&file);
    result
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::unix::io::AsRawFd;
    if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) } != 0 {
        log::warn!("Failed to release log lock: {}", io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}

#[async_trait]
impl DeliveryStrategy for FallbackLog {
    fn channel(&self) -> Channel {
        Channel::FallbackLog
    }

    async fn deliver(&self, message: &ContactMessage) -> bool {
        match self.append(message.log_entry()).await {
            Ok(()) => {
                log::info!("Message saved to {}", self.path.display());
                true
            }
            Err(e) => {
                log::error!("Failed to append to {}: {e}", self.path.display());
                false
            }
        }
    }
}
