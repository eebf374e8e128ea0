//! User options of a mask run and their persistence between runs.

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, read_to_string, write};
use std::path::PathBuf;

/// What to do with the masks once they are built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskOptions {
    /// Report the masks once built.
    #[serde(rename = "showMask")]
    pub show: bool,
    /// Save one file per mask.
    #[serde(rename = "saveMask")]
    pub save: bool,
    /// Where masks are saved. Empty when not chosen.
    pub directory: PathBuf,
    /// Appended to the image or slice name before the extension.
    #[serde(rename = "suffixname")]
    pub suffix: String,
    #[serde(rename = "saveas")]
    pub extension: OutputFormat,
}

impl Default for MaskOptions {
    fn default() -> Self {
        MaskOptions {
            show: true,
            save: false,
            directory: PathBuf::new(),
            suffix: String::new(),
            extension: OutputFormat::Tif,
        }
    }
}

/// TOML file remembering the options of the last run.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PreferenceStore { path: path.into() }
    }

    /// Options of the last run, or the defaults when nothing was stored yet.
    pub fn load(&self) -> Result<MaskOptions> {
        if !self.path.exists() {
            warn!(
                "could not find preferences at {}, falling back to defaults",
                self.path.display()
            );
            return Ok(MaskOptions::default());
        }
        let s = read_to_string(&self.path).with_context(|| self.path.display().to_string())?;
        toml::from_str(&s).with_context(|| self.path.display().to_string())
    }

    pub fn store(&self, options: &MaskOptions) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent).with_context(|| parent.display().to_string())?;
        }
        write(&self.path, toml::to_string(options)?)
            .with_context(|| self.path.display().to_string())?;
        debug!("stored preferences in {}", self.path.display());
        Ok(())
    }
}
