// File:    decoder.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: The receiving side: identifies the pad behind an artifact from its tags and recovers the message.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Receiving.
//!
//! The artifact carries no pad index. The receiver finds the pad by scanning
//! the prefix tags of the batch, then checks the suffix tag before touching
//! any key material. A suffix mismatch never consumes the pad.

use crate::artifact::Artifact;
use crate::crypto;
use crate::eraser::{Consumed, SecureEraser};
use crate::error::{OtpError, Result};
use crate::ids::{Component, PadIndex, TAG_LEN};
use crate::lock::BatchLock;
use crate::store::{Batch, PadStore};
use log::{debug, info, warn};

/// Decrypts artifacts with the pads of a store.
#[derive(Debug)]
pub struct Decoder<'a, E, L> {
    store: &'a PadStore<E>,
    lock: L,
}

impl<'a, E: SecureEraser, L: BatchLock> Decoder<'a, E, L> {
    /// Creates a decoder over `store`, holding `lock` while a pad is consumed.
    pub const fn new(store: &'a PadStore<E>, lock: L) -> Self {
        Self { store, lock }
    }

    /// Parses `artifact` and decrypts it with the matching pad of `batch`.
    ///
    /// The recovered bytes are returned as they are; no text encoding is assumed.
    ///
    /// # Errors
    ///
    /// [`OtpError::MalformedArtifact`] before any pad is looked at, then the
    /// errors of [`Decoder::decode_artifact`].
    pub fn decode(&self, batch: &Batch, artifact: &[u8]) -> Result<Consumed<Vec<u8>>> {
        let artifact = Artifact::parse(artifact)?;
        self.decode_artifact(batch, &artifact)
    }

    /// Decrypts a parsed artifact with the matching pad of `batch` and erases
    /// that pad's cipher stream.
    ///
    /// # Errors
    ///
    /// * [`OtpError::PadNotFound`] if no prefix tag matches or the pad's
    ///   cipher stream is gone.
    /// * [`OtpError::SuffixMismatch`] if the identified pad's suffix differs.
    /// * [`OtpError::TruncatedPad`] if fewer key bytes remain than the payload needs.
    /// * [`OtpError::BatchLocked`] if another process holds the batch.
    pub fn decode_artifact(&self, batch: &Batch, artifact: &Artifact) -> Result<Consumed<Vec<u8>>> {
        if !batch.dir().is_dir() {
            return Err(OtpError::PadNotFound {
                batch: Some(batch.id()),
                index: None,
            });
        }
        let _guard = self.lock.acquire(&batch.dir())?;

        let index = self.identify(batch, artifact)?;
        let pad = batch.pad(index);
        if self.store.read_tag(batch, index, Component::Suffix)? != *artifact.suffix() {
            warn!("Suffix of pad {pad} does not match the artifact; leaving the pad untouched.");
            return Err(OtpError::SuffixMismatch { pad });
        }

        let needed = artifact.ciphertext().len();
        let key = self
            .store
            .read_pad_component(batch, index, Component::CipherStream, needed)?;
        if key.len() < needed {
            return Err(OtpError::TruncatedPad {
                pad,
                component: Component::CipherStream,
                needed,
                available: key.len(),
            });
        }

        let plaintext = crypto::subtract_stream(artifact.ciphertext(), &key);
        let erasure = self.store.erase_pad_component(batch, index, Component::CipherStream);
        info!("Decoded {needed} bytes with pad {pad}.");
        Ok(Consumed {
            pad,
            output: plaintext,
            erasure,
        })
    }

    /// Finds the pad of `batch` whose prefix tag equals the artifact's.
    ///
    /// Pads are scanned in index order and the first exact match wins. Pads
    /// whose cipher stream is gone still take part, so a replayed artifact is
    /// recognised and then refused rather than reported as unknown. A prefix
    /// file cut short by an interrupted generation never matches.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::PadNotFound`] if no tag matches.
    pub fn identify(&self, batch: &Batch, artifact: &Artifact) -> Result<PadIndex> {
        let tagged = self.store.list_tagged_pads(batch)?;
        debug!("Scanning {} prefix tags in batch {}.", tagged.len(), batch.id());
        for index in tagged {
            let prefix = self.store.read_pad_component(batch, index, Component::Prefix, TAG_LEN)?;
            if prefix.as_slice() == artifact.prefix().as_slice() {
                return Ok(index);
            }
        }
        Err(OtpError::PadNotFound {
            batch: Some(batch.id()),
            index: None,
        })
    }

    /// Finds the batch of the store holding the pad that produced `artifact`,
    /// scanning batches in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::PadNotFound`] if no batch has a matching prefix tag.
    pub fn locate(&self, artifact: &Artifact) -> Result<Batch> {
        for batch in self.store.list_batches()? {
            match self.identify(&batch, artifact) {
                Ok(index) => {
                    debug!("Artifact matches pad {}.", batch.pad(index));
                    return Ok(batch);
                }
                Err(OtpError::PadNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Err(OtpError::PadNotFound {
            batch: None,
            index: None,
        })
    }
}
