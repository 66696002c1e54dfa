use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory lock on the data root.
///
/// Held by every CLI invocation that writes month, report, or override
/// documents, so two `plan` processes never interleave their writes. The
/// holder's pid is kept in `<root>/.lock` while the lock is held, so a
/// waiting process can say who it is waiting on.
///
/// The lock file itself is never removed: unlinking it while another process
/// waits on the old inode would let a third process lock a fresh file.
pub struct DataLock {
    file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: {}", holder_note(.holder))]
    Timeout { path: PathBuf, holder: Option<u32> },
}

fn holder_note(holder: &Option<u32>) -> String {
    match holder {
        Some(pid) => format!("plan process {} is writing", pid),
        None => "another plan process may be writing".to_string(),
    }
}

impl DataLock {
    /// Acquire the lock, waiting up to `timeout`. Creates the data root if needed.
    pub fn acquire(data_root: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = data_root.join(".lock");
        let mut file = fs::create_dir_all(data_root)
            .and_then(|_| {
                OpenOptions::new()
                    .create(true)
                    .read(true)
                    .write(true)
                    .truncate(false)
                    .open(&lock_path)
            })
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    if let Err(e) = write_holder(&mut file) {
                        tracing::debug!(error = %e, "could not record lock holder");
                    }
                    return Ok(DataLock {
                        file,
                        path: lock_path,
                    });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => {
                    let holder = read_holder(&mut file);
                    return Err(LockError::Timeout {
                        path: lock_path,
                        holder,
                    });
                }
            }
        }
    }

    pub fn acquire_default(data_root: &Path) -> Result<Self, LockError> {
        Self::acquire(data_root, Duration::from_secs(5))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DataLock {
    fn drop(&mut self) {
        // still locked here; the flock goes with the handle
        let _ = self.file.set_len(0);
    }
}

fn write_holder(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()
}

/// Pid recorded by the current holder, if any.
fn read_holder(file: &mut File) -> Option<u32> {
    let mut text = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut text).ok()?;
    text.trim().parse().ok()
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
