// File:    lib.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: The main library crate for padbook-core, orchestrating pad batches, message framing and erasure.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! # Padbook Core Library
//!
//! Pre-shared one-time pads, provisioned in numbered batches of one hundred.
//!
//! A [`PadGenerator`] fills a fresh batch through the [`PadStore`]. After the
//! batch has been copied to the peer out-of-band, the [`Encoder`] consumes the
//! lowest unused pad to frame a message as `prefix || ciphertext || suffix`,
//! and the [`Decoder`] on the other side finds the same pad by its prefix tag,
//! confirms it with the suffix tag and recovers the plaintext. Both sides
//! securely erase the cipher stream once it has been used.

/// Artifact framing: the transmitted `prefix || ciphertext || suffix` file.
pub mod artifact;
/// Modular-addition stream arithmetic.
pub mod crypto;
/// Pad identification on the receiving side.
pub mod decoder;
/// Pad consumption on the sending side.
pub mod encoder;
/// Sources of cryptographically strong random bytes.
pub mod entropy;
/// Secure deletion of consumed key material.
pub mod eraser;
/// The error type shared by every operation.
pub mod error;
/// Typed batch and pad identifiers.
pub mod ids;
/// Scoped locking around the select-read-erase critical section.
pub mod lock;
/// Utilities for generating new pad batches.
pub mod pad_generator;
/// Store settings persisted alongside the batches.
pub mod settings;
/// The filesystem-backed registry of batches and pads.
pub mod store;

pub use artifact::Artifact;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use entropy::{EntropySource, OsEntropy};
pub use eraser::{Consumed, OverwriteEraser, SecureEraser};
pub use error::{OtpError, Result};
pub use ids::{BatchId, Component, PadId, PadIndex};
pub use lock::{BatchLock, LockFile, NoLock};
pub use pad_generator::{GenerationReport, PadGenerator};
pub use settings::StoreSettings;
pub use store::{Batch, BatchStatus, PadStore};
