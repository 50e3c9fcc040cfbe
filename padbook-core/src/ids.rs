// File:    ids.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Typed identifiers for batches, pads and pad components, and the on-disk names derived from them.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Batch and pad identifiers.
//!
//! Directory and file names are parsed into these types once, at the store
//! boundary. Anything that does not parse is simply not a batch or a pad.

use crate::error::OtpError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width in bytes of the prefix and suffix tags.
pub const TAG_LEN: usize = 48;
/// Width in bytes of a freshly generated cipher stream.
pub const STREAM_LEN: usize = 2000;
/// Number of pads in a batch.
pub const PADS_PER_BATCH: u8 = 100;
/// Highest batch identifier a store can hold.
pub const MAX_BATCH_ID: u16 = 9999;

/// A batch identifier, `0000` to `9999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct BatchId(u16);

impl BatchId {
    /// The identifier given to the first batch of an empty store.
    pub const FIRST: Self = Self(0);

    /// Creates an identifier, or `None` if `value` is above [`MAX_BATCH_ID`].
    #[must_use]
    pub const fn new(value: u16) -> Option<Self> {
        if value > MAX_BATCH_ID {
            None
        } else {
            Some(Self(value))
        }
    }

    /// The numeric value.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// The following identifier, or `None` once the range is exhausted.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// Parses a batch directory name. Only exactly four ASCII digits qualify.
    #[must_use]
    pub fn from_dir_name(name: &str) -> Option<Self> {
        if name.len() != 4 || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        name.parse().ok().and_then(Self::new)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = OtpError;

    /// Accepts one to four digits, so `7` and `0007` name the same batch.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OtpError::InvalidIdentifier(s.to_string()));
        }
        s.parse::<u16>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| OtpError::InvalidIdentifier(s.to_string()))
    }
}

impl TryFrom<u16> for BatchId {
    type Error = OtpError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| OtpError::InvalidIdentifier(value.to_string()))
    }
}

impl From<BatchId> for u16 {
    fn from(id: BatchId) -> Self {
        id.0
    }
}

/// A pad index within its batch, `00` to `99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PadIndex(u8);

impl PadIndex {
    /// Creates an index, or `None` if `value` is not below [`PADS_PER_BATCH`].
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value < PADS_PER_BATCH {
            Some(Self(value))
        } else {
            None
        }
    }

    /// The numeric value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Every index of a batch, ascending.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..PADS_PER_BATCH).map(Self)
    }
}

impl fmt::Display for PadIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl TryFrom<u8> for PadIndex {
    type Error = OtpError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| OtpError::InvalidIdentifier(value.to_string()))
    }
}

impl From<PadIndex> for u8 {
    fn from(index: PadIndex) -> Self {
        index.0
    }
}

/// A pad, named by its batch and its index in that batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PadId {
    /// The batch holding the pad.
    pub batch: BatchId,
    /// The pad's position within the batch.
    pub index: PadIndex,
}

impl fmt::Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.batch, self.index)
    }
}

/// One of the three files making up a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// The 48-byte identification tag written in front of the ciphertext.
    Prefix,
    /// The 48-byte confirmation tag written after the ciphertext.
    Suffix,
    /// The secret key stream.
    CipherStream,
}

impl Component {
    /// All components, in generation order.
    pub const ALL: [Self; 3] = [Self::Prefix, Self::Suffix, Self::CipherStream];

    /// The marker character closing the component's file name.
    #[must_use]
    pub const fn marker(self) -> char {
        match self {
            Self::Prefix => 'p',
            Self::Suffix => 's',
            Self::CipherStream => 'c',
        }
    }

    /// The number of bytes a freshly generated component holds.
    #[must_use]
    pub const fn generated_len(self) -> usize {
        match self {
            Self::Prefix | Self::Suffix => TAG_LEN,
            Self::CipherStream => STREAM_LEN,
        }
    }

    /// The file name of this component for `index`, e.g. `07c`.
    #[must_use]
    pub fn file_name(self, index: PadIndex) -> String {
        format!("{index}{}", self.marker())
    }

    /// Parses a pad file name: exactly two ASCII digits and a marker.
    #[must_use]
    pub fn parse_file_name(name: &str) -> Option<(PadIndex, Self)> {
        let bytes = name.as_bytes();
        if bytes.len() != 3 || !bytes[..2].iter().all(u8::is_ascii_digit) {
            return None;
        }
        let component = match bytes[2] {
            b'p' => Self::Prefix,
            b's' => Self::Suffix,
            b'c' => Self::CipherStream,
            _ => return None,
        };
        let index = PadIndex::new((bytes[0] - b'0') * 10 + (bytes[1] - b'0'))?;
        Some((index, component))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::CipherStream => "cipher stream",
        };
        f.write_str(name)
    }
}
