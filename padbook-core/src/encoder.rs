// File:    encoder.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: The sending side: consumes the oldest unused pad of a batch to frame one message.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::artifact::Artifact;
use crate::crypto;
use crate::eraser::{Consumed, SecureEraser};
use crate::error::{OtpError, Result};
use crate::ids::{Component, STREAM_LEN};
use crate::lock::BatchLock;
use crate::store::{Batch, PadStore};
use log::info;

/// Encrypts messages with the pads of a store.
#[derive(Debug)]
pub struct Encoder<'a, E, L> {
    store: &'a PadStore<E>,
    lock: L,
}

impl<'a, E: SecureEraser, L: BatchLock> Encoder<'a, E, L> {
    /// Creates an encoder over `store`, holding `lock` while a pad is consumed.
    pub const fn new(store: &'a PadStore<E>, lock: L) -> Self {
        Self { store, lock }
    }

    /// Encrypts `plaintext` with the lowest-numbered available pad of `batch`
    /// and erases that pad's cipher stream.
    ///
    /// Both parties consume pads in index order, so messages processed in
    /// send order line up on each side. An erase failure does not discard
    /// the artifact; it is reported in [`Consumed::erasure`].
    ///
    /// # Errors
    ///
    /// * [`OtpError::InvalidMessageLength`] for an empty or over-long message.
    /// * [`OtpError::NoPadsAvailable`] if the batch is missing or exhausted.
    /// * [`OtpError::BatchLocked`] if another process holds the batch.
    /// * [`OtpError::TruncatedPad`] if the chosen pad is short of key bytes.
    pub fn encode(&self, batch: &Batch, plaintext: &[u8]) -> Result<Consumed<Artifact>> {
        if plaintext.is_empty() || plaintext.len() > STREAM_LEN {
            return Err(OtpError::InvalidMessageLength {
                len: plaintext.len(),
                max: STREAM_LEN,
            });
        }
        let no_pads = || OtpError::NoPadsAvailable { batch: batch.id() };
        if !batch.dir().is_dir() {
            return Err(no_pads());
        }

        let _guard = self.lock.acquire(&batch.dir())?;
        let index = *self.store.list_available_pads(batch)?.first().ok_or_else(no_pads)?;
        let pad = batch.pad(index);

        let prefix = self.store.read_tag(batch, index, Component::Prefix)?;
        let suffix = self.store.read_tag(batch, index, Component::Suffix)?;
        let key = self
            .store
            .read_pad_component(batch, index, Component::CipherStream, plaintext.len())?;
        if key.len() < plaintext.len() {
            return Err(OtpError::TruncatedPad {
                pad,
                component: Component::CipherStream,
                needed: plaintext.len(),
                available: key.len(),
            });
        }

        let artifact = Artifact::new(prefix, crypto::add_stream(plaintext, &key), suffix);
        let erasure = self.store.erase_pad_component(batch, index, Component::CipherStream);
        info!("Encoded {} bytes with pad {pad}.", plaintext.len());
        Ok(Consumed {
            pad,
            output: artifact,
            erasure,
        })
    }
}
