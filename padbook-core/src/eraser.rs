// File:    eraser.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Secure deletion of consumed key material, and the outcome type reporting it.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::error::{OtpError, Result};
use crate::ids::PadId;
use log::debug;
use rand::{TryRngCore, rngs::OsRng};
use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;
use zeroize::Zeroizing;

/// Overwrites and removes a file so that its prior content cannot be recovered.
pub trait SecureEraser {
    /// Erases the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::EraseFailed`] unless the wipe and the removal are both confirmed.
    fn secure_delete(&self, path: &Path) -> Result<()>;
}

/// Overwrites a file with random noise `passes` times, then with zeros, syncing
/// after every pass, before unlinking it and checking it is gone.
///
/// Journaling and copy-on-write filesystems, and SSD wear levelling, may keep
/// older copies of the blocks out of reach of any in-place overwrite.
#[derive(Debug, Clone, Copy)]
pub struct OverwriteEraser {
    passes: u8,
}

impl OverwriteEraser {
    /// Random passes applied before the final zero pass.
    pub const DEFAULT_PASSES: u8 = 3;

    /// Creates an eraser doing `passes` random passes.
    #[must_use]
    pub const fn new(passes: u8) -> Self {
        Self { passes }
    }

    /// The number of random passes.
    #[must_use]
    pub const fn passes(&self) -> u8 {
        self.passes
    }

    fn wipe(&self, path: &Path) -> io::Result<()> {
        let len = usize::try_from(fs::metadata(path)?.len()).map_err(io::Error::other)?;
        let mut file = OpenOptions::new().write(true).open(path)?;
        let mut noise = Zeroizing::new(vec![0u8; len]);
        let mut rng = OsRng;

        for _ in 0..self.passes {
            rng.try_fill_bytes(&mut noise).map_err(io::Error::other)?;
            overwrite(&mut file, &noise)?;
        }
        noise.fill(0);
        overwrite(&mut file, &noise)?;
        drop(file);

        fs::remove_file(path)?;
        if path.try_exists()? {
            return Err(io::Error::other("file is still present after unlink"));
        }
        debug!("Erased {} ({len} bytes, {} random passes).", path.display(), self.passes);
        Ok(())
    }
}

impl Default for OverwriteEraser {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PASSES)
    }
}

impl SecureEraser for OverwriteEraser {
    fn secure_delete(&self, path: &Path) -> Result<()> {
        self.wipe(path).map_err(|source| OtpError::EraseFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn overwrite(file: &mut fs::File, bytes: &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// The result of consuming a pad.
///
/// The cryptographic work is done by the time this exists, so `output` is
/// always present; `erasure` says whether the pad's cipher stream was also
/// wiped. An erase failure means the message went through but the key
/// material may still be recoverable from disk.
#[derive(Debug)]
#[must_use = "the erasure outcome must be checked"]
pub struct Consumed<T> {
    /// The pad that was used.
    pub pad: PadId,
    /// The artifact or plaintext produced.
    pub output: T,
    /// Outcome of erasing the pad's cipher stream.
    pub erasure: Result<()>,
}

impl<T> Consumed<T> {
    /// Returns the output, or [`OtpError::EraseFailed`] if the pad was not wiped.
    ///
    /// # Errors
    ///
    /// Propagates the erasure error, discarding the output.
    pub fn into_result(self) -> Result<T> {
        self.erasure.map(|()| self.output)
    }
}
