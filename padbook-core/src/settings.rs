// File:    settings.rs
// Author:  apezoo
// Date:    2025-08-02
//
// Description: Loads and saves the per-store settings file kept next to the batches.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::eraser::OverwriteEraser;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the settings file in the store root. Not a batch, so batch scans skip it.
pub const SETTINGS_FILE: &str = "padbook.json";

/// Settings shared by every operation on one store.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct StoreSettings {
    /// Random overwrite passes before the final zero pass when erasing a cipher stream.
    pub erase_passes: u8,
    /// Whether to take the advisory lock file around every encode and decode.
    pub lock_batches: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            erase_passes: OverwriteEraser::DEFAULT_PASSES,
            lock_batches: true,
        }
    }
}

impl StoreSettings {
    /// The eraser these settings describe.
    #[must_use]
    pub const fn eraser(&self) -> OverwriteEraser {
        OverwriteEraser::new(self.erase_passes)
    }
}

fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

/// Loads the settings of the store at `root`, falling back to defaults when
/// no settings file exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings(root: &Path) -> Result<StoreSettings> {
    let path = settings_path(root);
    if path.exists() {
        let settings_str = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&settings_str)?)
    } else {
        Ok(StoreSettings::default())
    }
}

/// Saves the settings of the store at `root`.
///
/// # Errors
///
/// Returns an error if the settings cannot be serialized or written.
pub fn save_settings(root: &Path, settings: &StoreSettings) -> Result<()> {
    let settings_str = serde_json::to_string_pretty(settings)?;
    fs::write(settings_path(root), settings_str)?;
    Ok(())
}
