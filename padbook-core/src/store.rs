// File:    store.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: The filesystem-backed registry of numbered batches and their pad files.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! On-disk layout:
//!
//! ```text
//! <root>/<batch:04>/<index:02>p   48 bytes     prefix tag
//! <root>/<batch:04>/<index:02>s   48 bytes     suffix tag
//! <root>/<batch:04>/<index:02>c   <=2000 bytes cipher stream, gone once consumed
//! ```
//!
//! Entries that do not follow this naming are ignored.

use crate::eraser::{OverwriteEraser, SecureEraser};
use crate::error::{OtpError, Result};
use crate::ids::{BatchId, Component, PadId, PadIndex, TAG_LEN};
use log::{debug, info};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// A handle on one batch directory: the store root plus the batch id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    root: PathBuf,
    id: BatchId,
}

impl Batch {
    /// Creates a handle. The directory need not exist.
    pub fn new(root: impl Into<PathBuf>, id: BatchId) -> Self {
        Self {
            root: root.into(),
            id,
        }
    }

    /// The batch id.
    #[must_use]
    pub const fn id(&self) -> BatchId {
        self.id
    }

    /// The batch directory.
    #[must_use]
    pub fn dir(&self) -> PathBuf {
        self.root.join(self.id.to_string())
    }

    /// The file holding `component` of pad `index`.
    #[must_use]
    pub fn pad_path(&self, index: PadIndex, component: Component) -> PathBuf {
        self.dir().join(component.file_name(index))
    }

    /// Names pad `index` of this batch.
    #[must_use]
    pub const fn pad(&self, index: PadIndex) -> PadId {
        PadId {
            batch: self.id,
            index,
        }
    }
}

/// Pad counts of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchStatus {
    /// The batch described.
    pub batch: BatchId,
    /// Pads whose three files exist at full generated width.
    pub complete: usize,
    /// Pads whose cipher stream is still present.
    pub available: usize,
    /// Pads whose tags remain but whose cipher stream has been erased.
    pub consumed: usize,
}

/// Manages the batches under one root directory. Never generates randomness.
#[derive(Debug, Clone)]
pub struct PadStore<E = OverwriteEraser> {
    root: PathBuf,
    eraser: E,
}

impl PadStore {
    /// Opens the store at `root` with the default eraser. Nothing is created yet.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::with_eraser(root, OverwriteEraser::default())
    }
}

impl<E: SecureEraser> PadStore<E> {
    /// Opens the store at `root`, erasing consumed pads with `eraser`.
    pub fn with_eraser(root: impl Into<PathBuf>, eraser: E) -> Self {
        Self {
            root: root.into(),
            eraser,
        }
    }

    /// The store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A handle on batch `id` of this store.
    #[must_use]
    pub fn batch(&self, id: BatchId) -> Batch {
        Batch::new(&self.root, id)
    }

    /// Lists the batches in the store, ascending. A missing root holds no batches.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the root cannot be read.
    pub fn list_batches(&self) -> Result<Vec<Batch>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(BatchId::from_dir_name) {
                ids.insert(id);
            }
        }
        Ok(ids.into_iter().map(|id| self.batch(id)).collect())
    }

    /// Creates the directory of the next batch: `0000` in an empty store,
    /// otherwise one past the highest existing id.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::CapacityExceeded`] once batch `9999` exists, or an
    /// I/O error, including when another process created the same directory first.
    pub fn allocate_batch(&self) -> Result<Batch> {
        fs::create_dir_all(&self.root)?;
        let next = match self.list_batches()?.last() {
            None => BatchId::FIRST,
            Some(highest) => highest.id().next().ok_or_else(|| OtpError::CapacityExceeded {
                root: self.root.clone(),
            })?,
        };

        let batch = self.batch(next);
        fs::create_dir(batch.dir())?;
        info!("Allocated batch {next} at '{}'.", batch.dir().display());
        Ok(batch)
    }

    /// The lowest-numbered batch with at least one available pad.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the store cannot be read.
    pub fn first_batch_with_pads(&self) -> Result<Option<Batch>> {
        for batch in self.list_batches()? {
            if !self.list_available_pads(&batch)?.is_empty() {
                return Ok(Some(batch));
            }
        }
        Ok(None)
    }

    /// Indices of the pads whose cipher stream still exists, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::PadNotFound`] if the batch directory is missing.
    pub fn list_available_pads(&self, batch: &Batch) -> Result<Vec<PadIndex>> {
        self.list_component(batch, Component::CipherStream)
    }

    /// Indices of the pads whose prefix tag still exists, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::PadNotFound`] if the batch directory is missing.
    pub fn list_tagged_pads(&self, batch: &Batch) -> Result<Vec<PadIndex>> {
        self.list_component(batch, Component::Prefix)
    }

    fn list_component(&self, batch: &Batch, wanted: Component) -> Result<Vec<PadIndex>> {
        let entries = fs::read_dir(batch.dir()).map_err(|e| missing_as(e, batch, None))?;
        let mut indices = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            match entry.file_name().to_str().and_then(Component::parse_file_name) {
                Some((index, component)) if component == wanted => {
                    indices.insert(index);
                }
                _ => {}
            }
        }
        Ok(indices.into_iter().collect())
    }

    /// Reads up to `max_len` bytes of one pad component.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::PadNotFound`] if the batch directory or the file is missing.
    pub fn read_pad_component(
        &self,
        batch: &Batch,
        index: PadIndex,
        component: Component,
        max_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let file = File::open(batch.pad_path(index, component))
            .map_err(|e| missing_as(e, batch, Some(index)))?;
        let mut buffer = Zeroizing::new(Vec::with_capacity(max_len));
        file.take(max_len as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// Reads a full-width prefix or suffix tag.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::PadNotFound`] if the file is missing and
    /// [`OtpError::TruncatedPad`] if it is shorter than a tag.
    pub fn read_tag(&self, batch: &Batch, index: PadIndex, component: Component) -> Result<[u8; TAG_LEN]> {
        let bytes = self.read_pad_component(batch, index, component, TAG_LEN)?;
        <[u8; TAG_LEN]>::try_from(bytes.as_slice()).map_err(|_| OtpError::TruncatedPad {
            pad: batch.pad(index),
            component,
            needed: TAG_LEN,
            available: bytes.len(),
        })
    }

    /// Writes one pad component. Existing pad files are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists already or cannot be written and synced.
    pub fn write_pad_component(
        &self,
        batch: &Batch,
        index: PadIndex,
        component: Component,
        bytes: &[u8],
    ) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(batch.pad_path(index, component))?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    }

    /// Securely erases one pad component.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::EraseFailed`] if the eraser cannot confirm the wipe.
    pub fn erase_pad_component(&self, batch: &Batch, index: PadIndex, component: Component) -> Result<()> {
        let path = batch.pad_path(index, component);
        self.eraser.secure_delete(&path)?;
        info!("Erased the {component} of pad {}.", batch.pad(index));
        Ok(())
    }

    /// Counts the pads whose three files all exist at full generated width.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::PadNotFound`] if the batch directory is missing.
    pub fn count_complete_pads(&self, batch: &Batch) -> Result<usize> {
        let mut complete = 0;
        for index in self.list_tagged_pads(batch)? {
            if self.is_complete(batch, index)? {
                complete += 1;
            }
        }
        Ok(complete)
    }

    fn is_complete(&self, batch: &Batch, index: PadIndex) -> Result<bool> {
        for component in Component::ALL {
            match fs::metadata(batch.pad_path(index, component)) {
                Ok(meta) if meta.len() == component.generated_len() as u64 => {}
                Ok(_) => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }

    /// Counts complete, available and consumed pads of a batch.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::PadNotFound`] if the batch directory is missing.
    pub fn status(&self, batch: &Batch) -> Result<BatchStatus> {
        let available: BTreeSet<_> = self.list_available_pads(batch)?.into_iter().collect();
        let tagged = self.list_tagged_pads(batch)?;
        let consumed = tagged.iter().filter(|index| !available.contains(*index)).count();
        Ok(BatchStatus {
            batch: batch.id(),
            complete: self.count_complete_pads(batch)?,
            available: available.len(),
            consumed,
        })
    }

    /// SHA-256 over the name and content of every pad file of the batch, in
    /// name order, as lowercase hex.
    ///
    /// Two parties holding byte-identical copies of a batch get the same
    /// fingerprint, so comparing it out-of-band before messaging confirms the
    /// copy. Consuming a pad changes the fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::PadNotFound`] if the batch directory is missing.
    pub fn fingerprint(&self, batch: &Batch) -> Result<String> {
        let mut names = Vec::new();
        for entry in fs::read_dir(batch.dir()).map_err(|e| missing_as(e, batch, None))? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if Component::parse_file_name(name).is_some() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        let mut hasher = Sha256::new();
        for name in &names {
            let mut file = File::open(batch.dir().join(name))?;
            hasher.update(name.as_bytes());
            io::copy(&mut file, &mut hasher)?;
        }
        debug!("Fingerprinted {} pad files of batch {}.", names.len(), batch.id());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Maps "not found" onto [`OtpError::PadNotFound`] for `batch`.
fn missing_as(e: io::Error, batch: &Batch, index: Option<PadIndex>) -> OtpError {
    if e.kind() == io::ErrorKind::NotFound {
        OtpError::PadNotFound {
            batch: Some(batch.id()),
            index,
        }
    } else {
        e.into()
    }
}
