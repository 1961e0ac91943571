//! File-backed session store.
//!
//! The admin slot is the configured file itself. Any other slot lives
//! next to it as `<file name>.<slot>`.
//!
//! # Atomicity
//!
//! Writes go to a temp file in the same directory which is then renamed
//! over the slot file. A rename within one filesystem is atomic, so a
//! reader sees either the old blob or the new one, never a torn write.
//! Writers (persist, delete, compare-and-swap) are additionally serialized
//! by an async mutex so a compare-and-swap's read and write can't
//! interleave with another writer of the same store.
//!
//! # Timeouts
//!
//! Blocking file work can't be cancelled, so every write or delete
//! carries a [`WriteTicket`]. Just before the rename (or the unlink) the
//! blocking task claims the ticket; a caller that times out first revokes
//! it instead. Exactly one side wins, so an operation reported as timed
//! out never takes effect later, and one that already started committing
//! is waited for while the writer lock is still held.

use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use crate::{SessionError, SessionStore, SlotKey};

/// A [`SessionStore`] that keeps each slot in its own file.
#[derive(Debug)]
pub struct FileSessionStore {
    location: PathBuf,
    timeout: Duration,
    writer: Mutex<()>,
}

impl FileSessionStore {
    /// Creates a store whose admin slot is the file at `location`.
    ///
    /// `timeout` bounds every storage operation, including waiting for
    /// the writer lock.
    pub fn new(location: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            location: location.into(),
            timeout,
            writer: Mutex::new(()),
        }
    }

    /// The configured location of the admin slot.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// The file backing `slot`.
    pub fn slot_path(&self, slot: &SlotKey) -> PathBuf {
        if slot.is_admin() {
            return self.location.clone();
        }
        let mut name = self
            .location
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(slot.as_str());
        self.location.with_file_name(name)
    }

    async fn lock_writer(&self) -> Result<MutexGuard<'_, ()>, SessionError> {
        tokio::time::timeout(self.timeout, self.writer.lock())
            .await
            .map_err(|_| timed_out("waiting for the session store lock", self.timeout))
    }

    /// Runs `fut` under the storage timeout.
    async fn bounded<T>(
        &self,
        what: &'static str,
        fut: impl Future<Output = io::Result<T>>,
    ) -> io::Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{what} exceeded {:?}", self.timeout),
            )),
        }
    }

    /// Runs `op` on the blocking pool under the storage timeout.
    ///
    /// Must be called with the writer lock held; the lock stays held
    /// until `op` has either committed or can no longer commit.
    async fn run_blocking<F>(&self, what: &'static str, op: F) -> io::Result<()>
    where
        F: FnOnce(&WriteTicket) -> io::Result<()> + Send + 'static,
    {
        let ticket = Arc::new(WriteTicket::new());
        let task_ticket = Arc::clone(&ticket);
        let mut task = tokio::task::spawn_blocking(move || op(&task_ticket));

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined.map_err(io::Error::other)?,
            Err(_) if ticket.revoke() => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{what} exceeded {:?}", self.timeout),
            )),
            // Already committing: its outcome is the operation's outcome.
            Err(_) => task.await.map_err(io::Error::other)?,
        }
    }

    async fn write_blob(&self, path: PathBuf, blob: Vec<u8>) -> io::Result<()> {
        self.run_blocking("session write", move |ticket| {
            write_atomic(&path, &blob, ticket)
        })
        .await
    }

    async fn remove_blob(&self, path: PathBuf) -> io::Result<()> {
        self.run_blocking("session delete", move |ticket| {
            if !ticket.claim() {
                return Err(revoked());
            }
            std::fs::remove_file(&path)
        })
        .await
    }

    async fn read_blob(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.bounded("session read", tokio::fs::read(path)).await
    }
}

impl SessionStore for FileSessionStore {
    async fn persist(&self, slot: &SlotKey, blob: Vec<u8>) -> Result<(), SessionError> {
        let _guard = self.lock_writer().await?;
        self.write_blob(self.slot_path(slot), blob)
            .await
            .map_err(SessionError::StorageUnavailable)?;
        tracing::debug!(%slot, "session blob persisted");
        Ok(())
    }

    async fn load(&self, slot: &SlotKey) -> Result<Vec<u8>, SessionError> {
        match self.read_blob(&self.slot_path(slot)).await {
            Ok(blob) => Ok(blob),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SessionError::NotFound(slot.clone()))
            }
            Err(e) => Err(SessionError::StorageUnavailable(e)),
        }
    }

    async fn delete(&self, slot: &SlotKey) -> Result<(), SessionError> {
        let _guard = self.lock_writer().await?;
        let path = self.slot_path(slot);
        match self.remove_blob(path).await {
            Ok(()) => {
                tracing::debug!(%slot, "session blob removed");
                Ok(())
            }
            // Already gone is the state delete asks for.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::StorageUnavailable(e)),
        }
    }

    async fn compare_and_swap(
        &self,
        slot: &SlotKey,
        expected: &[u8],
        blob: Vec<u8>,
    ) -> Result<bool, SessionError> {
        let _guard = self.lock_writer().await?;
        let path = self.slot_path(slot);

        let current = match self.read_blob(&path).await {
            Ok(current) => current,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(SessionError::StorageUnavailable(e)),
        };
        if current != expected {
            tracing::debug!(%slot, "compare-and-swap lost: slot changed");
            return Ok(false);
        }

        self.write_blob(path, blob)
            .await
            .map_err(SessionError::StorageUnavailable)?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// WriteTicket
// ---------------------------------------------------------------------------

const PENDING: u8 = 0;
const COMMITTING: u8 = 1;
const REVOKED: u8 = 2;

/// One-shot permission for a blocking operation to take effect.
///
/// Starts pending. [`claim`](Self::claim) and [`revoke`](Self::revoke)
/// race to move it out of that state; only the first succeeds.
#[derive(Debug)]
struct WriteTicket(AtomicU8);

impl WriteTicket {
    fn new() -> Self {
        Self(AtomicU8::new(PENDING))
    }

    /// Called by the blocking task right before its visible effect.
    fn claim(&self) -> bool {
        self.0
            .compare_exchange(PENDING, COMMITTING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Called by a caller that gave up waiting.
    fn revoke(&self) -> bool {
        self.0
            .compare_exchange(PENDING, REVOKED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

fn revoked() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "operation abandoned after timeout")
}

/// Writes `bytes` to a temp file beside `path`, flushes it, and renames
/// it into place if `ticket` can still be claimed. A revoked write only
/// ever touches its own temp file, which is removed on drop.
///
/// `NamedTempFile` creates the file with mode 0600 on Unix, and the
/// rename keeps that mode.
fn write_atomic(path: &Path, bytes: &[u8], ticket: &WriteTicket) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    if !ticket.claim() {
        return Err(revoked());
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn timed_out(what: &str, timeout: Duration) -> SessionError {
    SessionError::StorageUnavailable(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("{what} exceeded {timeout:?}"),
    ))
}
