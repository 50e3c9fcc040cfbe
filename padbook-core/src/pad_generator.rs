// File:    pad_generator.rs
// Author:  apezoo
// Date:    2025-07-17
//
// Description: Provides functionality for filling new pad batches with high-quality random material.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::entropy::{EntropySource, OsEntropy};
use crate::eraser::SecureEraser;
use crate::error::{OtpError, Result};
use crate::ids::{BatchId, Component, PadIndex};
use crate::store::{Batch, PadStore};
use log::info;
use serde::Serialize;
use zeroize::Zeroizing;

/// What a completed generation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// The new batch.
    pub batch: BatchId,
    /// Pads written in full.
    pub pads_written: usize,
}

/// Fills new batches from an entropy source.
#[derive(Debug)]
pub struct PadGenerator<S = OsEntropy> {
    entropy: S,
}

impl PadGenerator {
    /// Creates a generator drawing from the operating system's random source.
    #[must_use]
    pub const fn with_os_entropy() -> Self {
        Self::new(OsEntropy)
    }
}

impl<S: EntropySource> PadGenerator<S> {
    /// Creates a generator drawing from `entropy`.
    pub const fn new(entropy: S) -> Self {
        Self { entropy }
    }

    /// Allocates the next batch of `store` and writes all of its pads.
    ///
    /// Generation is not transactional. A failure after allocation leaves a
    /// partially filled batch behind and is reported as
    /// [`OtpError::IncompleteBatch`] with the number of pads fully written.
    ///
    /// # Errors
    ///
    /// Returns the allocation error as is, or [`OtpError::IncompleteBatch`].
    pub fn generate_batch<E: SecureEraser>(&mut self, store: &PadStore<E>) -> Result<GenerationReport> {
        let batch = store.allocate_batch()?;
        let mut pads_written = 0;
        for index in PadIndex::all() {
            if let Err(source) = self.write_pad(store, &batch, index) {
                return Err(OtpError::IncompleteBatch {
                    batch: batch.id(),
                    pads_written,
                    source: Box::new(source),
                });
            }
            pads_written += 1;
        }

        info!("Generated {pads_written} pads in batch {}.", batch.id());
        Ok(GenerationReport {
            batch: batch.id(),
            pads_written,
        })
    }

    fn write_pad<E: SecureEraser>(&mut self, store: &PadStore<E>, batch: &Batch, index: PadIndex) -> Result<()> {
        for component in Component::ALL {
            let mut buffer = Zeroizing::new(vec![0u8; component.generated_len()]);
            self.entropy.fill(&mut buffer)?;
            store.write_pad_component(batch, index, component, &buffer)?;
        }
        Ok(())
    }
}
