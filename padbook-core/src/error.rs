// File:    error.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: The error type shared by pad generation, consumption and erasure.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::ids::{BatchId, Component, PadId, PadIndex};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`OtpError`].
pub type Result<T> = std::result::Result<T, OtpError>;

/// Everything that can go wrong while managing or consuming pads.
///
/// None of these are retried internally: re-reading a pad after a failed
/// consumption is never safe.
#[derive(Debug, Error)]
pub enum OtpError {
    /// The store already holds batch `9999`.
    #[error("no free batch identifier left in '{}'", .root.display())]
    CapacityExceeded {
        /// The store root.
        root: PathBuf,
    },

    /// The batch is missing or every pad in it has been consumed.
    #[error("batch {batch} has no unused pads left")]
    NoPadsAvailable {
        /// The exhausted batch.
        batch: BatchId,
    },

    /// No pad matches, or the files of the referenced pad are gone.
    #[error("no matching pad found{}", pad_location(.batch, .index))]
    PadNotFound {
        /// The batch searched, if the search was limited to one.
        batch: Option<BatchId>,
        /// The pad whose files were expected, if one was identified.
        index: Option<PadIndex>,
    },

    /// The identified pad's suffix tag disagrees with the artifact.
    #[error("suffix tag of pad {pad} does not match the artifact; it may be corrupt or tampered with")]
    SuffixMismatch {
        /// The pad identified by the prefix tag.
        pad: PadId,
    },

    /// Fewer key bytes remain in the pad than the message needs.
    #[error("pad {pad} holds {available} bytes of {component} but {needed} are required")]
    TruncatedPad {
        /// The pad being read.
        pad: PadId,
        /// The component that came up short.
        component: Component,
        /// Bytes required.
        needed: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// The artifact cannot be split into prefix, payload and suffix.
    #[error("malformed artifact of {len} bytes: {reason}")]
    MalformedArtifact {
        /// Length of the rejected input.
        len: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Secure deletion could not be confirmed; the key material may still be on disk.
    #[error("failed to securely erase '{}': {source}", .path.display())]
    EraseFailed {
        /// The file that should have been erased.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },

    /// The plaintext is empty or longer than a cipher stream.
    #[error("message length {len} is outside 1..={max}")]
    InvalidMessageLength {
        /// Length of the rejected plaintext.
        len: usize,
        /// Longest message a single pad can carry.
        max: usize,
    },

    /// A batch id or pad index could not be parsed.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Another process holds the batch lock.
    #[error("batch is locked by another process ('{}')", .path.display())]
    BatchLocked {
        /// The lock file found in place.
        path: PathBuf,
    },

    /// The random source failed.
    #[error("entropy source failed: {0}")]
    Entropy(String),

    /// Generation stopped part way; only `pads_written` pads of the batch are usable.
    #[error("generation of batch {batch} stopped after {pads_written} complete pads: {source}")]
    IncompleteBatch {
        /// The partially filled batch.
        batch: BatchId,
        /// Pads written in full before the failure.
        pads_written: usize,
        /// What stopped generation.
        #[source]
        source: Box<OtpError>,
    },

    /// The settings file could not be parsed or written.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl OtpError {
    /// Whether the error points at tampering, protocol misuse or key material left on disk,
    /// as opposed to a provisioning or usage problem.
    #[must_use]
    pub const fn is_security_alert(&self) -> bool {
        matches!(
            self,
            Self::SuffixMismatch { .. } | Self::TruncatedPad { .. } | Self::EraseFailed { .. }
        )
    }
}

fn pad_location(batch: &Option<BatchId>, index: &Option<PadIndex>) -> String {
    match (batch, index) {
        (Some(batch), Some(index)) => format!(" for pad {batch}/{index}"),
        (Some(batch), None) => format!(" in batch {batch}"),
        (None, Some(index)) => format!(" at index {index}"),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_not_found_names_the_location() {
        let err = OtpError::PadNotFound {
            batch: BatchId::new(4),
            index: PadIndex::new(9),
        };
        assert_eq!(err.to_string(), "no matching pad found for pad 0004/09");

        let err = OtpError::PadNotFound { batch: None, index: None };
        assert_eq!(err.to_string(), "no matching pad found");
    }

    #[test]
    fn only_integrity_and_erasure_failures_are_alerts() {
        let pad = PadId {
            batch: BatchId::FIRST,
            index: PadIndex::new(0).unwrap(),
        };
        assert!(OtpError::SuffixMismatch { pad }.is_security_alert());
        assert!(
            OtpError::EraseFailed {
                path: PathBuf::from("00c"),
                source: io::Error::other("disk gone"),
            }
            .is_security_alert()
        );
        assert!(!OtpError::NoPadsAvailable { batch: BatchId::FIRST }.is_security_alert());
        assert!(!OtpError::MalformedArtifact { len: 90, reason: "short" }.is_security_alert());
    }
}
