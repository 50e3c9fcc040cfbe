// File:    crypto.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Handles the core cryptographic operations: combining a message with a pad's key stream by addition modulo 256.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! This module contains the core cryptographic operations.
//!
//! Pads are combined with messages by byte-wise addition modulo 256 rather
//! than XOR, so decryption is a separate subtraction rather than the same
//! operation applied twice.

/// Adds a key stream to a message, byte by byte, modulo 256.
///
/// # Panics
///
/// Panics if the slices are not of equal length.
#[must_use]
pub fn add_stream(message: &[u8], key: &[u8]) -> Vec<u8> {
    assert_eq!(
        message.len(),
        key.len(),
        "Message and key stream must have the same length."
    );
    message
        .iter()
        .zip(key.iter())
        .map(|(m, k)| m.wrapping_add(*k))
        .collect()
}

/// Subtracts a key stream from a ciphertext, byte by byte, modulo 256.
///
/// # Panics
///
/// Panics if the slices are not of equal length.
#[must_use]
pub fn subtract_stream(ciphertext: &[u8], key: &[u8]) -> Vec<u8> {
    assert_eq!(
        ciphertext.len(),
        key.len(),
        "Ciphertext and key stream must have the same length."
    );
    ciphertext
        .iter()
        .zip(key.iter())
        .map(|(c, k)| c.wrapping_sub(*k))
        .collect()
}
