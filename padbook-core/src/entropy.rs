// File:    entropy.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: The random source pads are filled from.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::error::{OtpError, Result};
use rand::{TryRngCore, rngs::OsRng};

/// A source of cryptographically strong random bytes.
pub trait EntropySource {
    /// Fills `dest` entirely with random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::Entropy`] if the source cannot deliver.
    fn fill(&mut self, dest: &mut [u8]) -> Result<()>;
}

/// The operating system's random number generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        let mut rng = OsRng;
        // Use the failable `try_fill_bytes` so a broken source is reported, not a panic.
        rng.try_fill_bytes(dest)
            .map_err(|e| OtpError::Entropy(e.to_string()))
    }
}
