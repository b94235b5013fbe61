use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::pairwise::{DEFAULT_BINS, DEFAULT_BLOCK_SIZE};
use crate::error::{Error, Result};
use crate::render::RenderConfig;

// ---------------------------------------------------------------------------
// Configuration file
// ---------------------------------------------------------------------------

/// Everything tunable about a run. Every field has a default, so a config
/// file only needs the keys it changes:
///
/// ```json
/// { "analysis": { "histogram_bins": 200 }, "output_dir": "figures" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub render: RenderConfig,
    pub analysis: AnalysisConfig,
    /// Directory interactive saves are written to.
    pub output_dir: PathBuf,
    /// Default figure name is `<prefix>_<plot kind>`.
    pub figure_prefix: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        ExplorerConfig {
            render: RenderConfig::default(),
            analysis: AnalysisConfig::default(),
            output_dir: PathBuf::from("."),
            figure_prefix: "fusion".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub histogram_bins: usize,
    /// Pairs processed between progress / cancellation checkpoints.
    pub block_size: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            histogram_bins: DEFAULT_BINS,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ExplorerConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ExplorerConfig = serde_json::from_str(&text)?;
        debug!("configuration from {}: {config:?}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Defaults, or the given file when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis.histogram_bins == 0 {
            return Err(Error::Config("histogram_bins must be > 0".to_string()));
        }
        if self.analysis.block_size == 0 {
            return Err(Error::Config("block_size must be > 0".to_string()));
        }
        if self.render.width < 320 || self.render.height < 240 {
            return Err(Error::Config(format!(
                "figure size {}x{} is too small",
                self.render.width, self.render.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explorer.json");
        std::fs::write(&path, r#"{ "analysis": { "histogram_bins": 200 } }"#).unwrap();

        let config = ExplorerConfig::from_file(&path).unwrap();
        assert_eq!(config.analysis.histogram_bins, 200);
        assert_eq!(config.analysis.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.figure_prefix, "fusion");
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn zero_bins_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explorer.json");
        std::fs::write(&path, r#"{ "analysis": { "histogram_bins": 0 } }"#).unwrap();

        assert!(matches!(ExplorerConfig::from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn figures_too_small_for_labels_are_rejected() {
        let mut config = ExplorerConfig::default();
        config.render.width = 200;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn missing_path_means_defaults() {
        assert_eq!(ExplorerConfig::load(None).unwrap(), ExplorerConfig::default());
    }
}
