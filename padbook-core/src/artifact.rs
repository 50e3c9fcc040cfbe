// File:    artifact.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Framing of the transmitted file: the pad's prefix tag, the ciphertext, the pad's suffix tag.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::error::{OtpError, Result};
use crate::ids::{STREAM_LEN, TAG_LEN};
use sha2::{Digest, Sha256};

/// Shortest well-formed artifact: two tags around a one-byte payload.
pub const MIN_ARTIFACT_LEN: usize = 2 * TAG_LEN + 1;

/// A framed ciphertext, `prefix || ciphertext || suffix`, with no length field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    prefix: [u8; TAG_LEN],
    ciphertext: Vec<u8>,
    suffix: [u8; TAG_LEN],
}

impl Artifact {
    /// Frames `ciphertext` between a pad's tags.
    #[must_use]
    pub const fn new(prefix: [u8; TAG_LEN], ciphertext: Vec<u8>, suffix: [u8; TAG_LEN]) -> Self {
        Self {
            prefix,
            ciphertext,
            suffix,
        }
    }

    /// Splits a received artifact into its three regions.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::MalformedArtifact`] if the input is shorter than
    /// two tags, carries an empty payload, or carries more than a cipher
    /// stream can cover.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let malformed = |reason| OtpError::MalformedArtifact {
            len: bytes.len(),
            reason,
        };
        if bytes.len() < MIN_ARTIFACT_LEN {
            return Err(malformed(if bytes.len() < 2 * TAG_LEN {
                "shorter than the prefix and suffix tags"
            } else {
                "empty payload"
            }));
        }
        if bytes.len() - 2 * TAG_LEN > STREAM_LEN {
            return Err(malformed("payload longer than a cipher stream"));
        }

        let (prefix, rest) = bytes
            .split_first_chunk::<TAG_LEN>()
            .ok_or_else(|| malformed("missing prefix tag"))?;
        let (ciphertext, suffix) = rest
            .split_last_chunk::<TAG_LEN>()
            .ok_or_else(|| malformed("missing suffix tag"))?;
        Ok(Self::new(*prefix, ciphertext.to_vec(), *suffix))
    }

    /// The prefix tag identifying the pad.
    #[must_use]
    pub const fn prefix(&self) -> &[u8; TAG_LEN] {
        &self.prefix
    }

    /// The encrypted payload.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// The suffix tag confirming the pad.
    #[must_use]
    pub const fn suffix(&self) -> &[u8; TAG_LEN] {
        &self.suffix
    }

    /// The artifact as transmitted.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 * TAG_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.prefix);
        bytes.extend_from_slice(&self.ciphertext);
        bytes.extend_from_slice(&self.suffix);
        bytes
    }

    /// SHA-256 of the transmitted bytes, as lowercase hex, for comparing
    /// copies over a second channel. It is not an authentication tag.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.prefix);
        hasher.update(&self.ciphertext);
        hasher.update(self.suffix);
        format!("{:x}", hasher.finalize())
    }
}
