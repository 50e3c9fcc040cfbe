// File:    lock.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Scoped locking around the select-read-erase sequence on a batch directory.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Batch locks.
//!
//! Two encoders racing on the same batch could both pick the lowest free pad
//! before either erases it. The encoder and decoder therefore hold a
//! [`BatchLock`] guard from the moment they list the batch until the cipher
//! stream is erased. [`LockFile`] only coordinates processes on one host that
//! see the same filesystem; nothing here protects copies of a batch held on
//! different machines.

use crate::error::{OtpError, Result};
use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Name of the advisory lock file created inside a batch directory.
pub const LOCK_FILE_NAME: &str = ".lock";

/// Acquires exclusive access to a batch directory for the lifetime of the guard.
pub trait BatchLock {
    /// Releases the lock when dropped.
    type Guard;

    /// Takes the lock on `batch_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::BatchLocked`] if someone else holds it, or an I/O error.
    fn acquire(&self, batch_dir: &Path) -> Result<Self::Guard>;
}

/// Performs no locking. Callers take responsibility for serializing access.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLock;

impl BatchLock for NoLock {
    type Guard = ();

    fn acquire(&self, _batch_dir: &Path) -> Result<()> {
        Ok(())
    }
}

/// `None` disables locking, which lets the choice be made at run time.
impl<L: BatchLock> BatchLock for Option<L> {
    type Guard = Option<L::Guard>;

    fn acquire(&self, batch_dir: &Path) -> Result<Self::Guard> {
        self.as_ref().map(|lock| lock.acquire(batch_dir)).transpose()
    }
}

/// An advisory lock file created with `O_EXCL` semantics.
///
/// Acquisition never waits: a lock file already in place fails immediately
/// with [`OtpError::BatchLocked`]. A lock left behind by a killed process
/// has to be removed by hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct LockFile;

impl BatchLock for LockFile {
    type Guard = LockFileGuard;

    fn acquire(&self, batch_dir: &Path) -> Result<LockFileGuard> {
        let path = batch_dir.join(LOCK_FILE_NAME);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(OtpError::BatchLocked { path });
            }
            Err(e) => return Err(e.into()),
        };

        let token = Uuid::new_v4();
        if let Err(e) = file.write_all(token.to_string().as_bytes()) {
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }
        debug!("Locked {} with token {token}.", batch_dir.display());
        Ok(LockFileGuard { path, token })
    }
}

/// Holds a [`LockFile`] lock; removes the lock file when dropped.
#[derive(Debug)]
pub struct LockFileGuard {
    path: PathBuf,
    token: Uuid,
}

impl LockFileGuard {
    /// The lock file held by this guard.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFileGuard {
    fn drop(&mut self) {
        // Only remove the file if it is still ours.
        match fs::read_to_string(&self.path) {
            Ok(content) if content == self.token.to_string() => {
                if let Err(e) = fs::remove_file(&self.path) {
                    warn!("Failed to remove lock file '{}': {e}", self.path.display());
                }
            }
            Ok(_) => warn!(
                "Lock file '{}' was replaced by another owner; leaving it in place.",
                self.path.display()
            ),
            Err(e) => warn!("Lock file '{}' vanished while held: {e}", self.path.display()),
        }
    }
}
