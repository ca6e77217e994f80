//! Engine configuration.
//!
//! A single [`EngineConfig`] is built once when the process starts and is
//! passed by shared reference to every component afterwards. Nothing mutates
//! it after construction, so concurrent requests can share it freely.

use crate::error::{RedactorError, RedactorResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for extraction, matching and redaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Characters of surrounding text kept on each side of a match.
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    #[serde(default)]
    pub validation: ValidationOptions,

    #[serde(default)]
    pub redaction: RedactionConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            validation: ValidationOptions::default(),
            redaction: RedactionConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> RedactorResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| RedactorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> RedactorResult<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| RedactorError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> RedactorResult<()> {
        if !self.redaction.min_box_size.is_finite() || self.redaction.min_box_size < 0.0 {
            return Err(RedactorError::Config {
                reason: "redaction.min_box_size must be a non-negative number".to_string(),
            });
        }
        Ok(())
    }
}

/// Switches that change how strict individual validators are.
///
/// These can also be supplied per request to override the process defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Require the weighted mod-11 check digit on resident registration numbers.
    ///
    /// Numbers issued after October 2020 carry a random tail, so this is off
    /// unless asked for.
    #[serde(default)]
    pub rrn_checksum: bool,

    /// Only accept card numbers whose leading digits belong to a known issuer.
    #[serde(default = "default_true")]
    pub card_iin_filter: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            rrn_checksum: false,
            card_iin_filter: true,
        }
    }
}

/// Colour painted over committed redactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillColor {
    #[default]
    Black,
    White,
}

impl FillColor {
    /// RGB components in the 0.0..=1.0 range.
    pub fn rgb(self) -> [f32; 3] {
        match self {
            FillColor::Black => [0.0, 0.0, 0.0],
            FillColor::White => [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    #[serde(default)]
    pub fill: FillColor,

    /// Boxes narrower or shorter than this (in PDF points) are not drawn.
    #[serde(default = "default_min_box_size")]
    pub min_box_size: f64,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            fill: FillColor::default(),
            min_box_size: default_min_box_size(),
        }
    }
}

/// How presentation streams are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideStrategy {
    /// Record walk only.
    Structured,
    /// Raw two-byte scan only.
    Heuristic,
    /// Record walk, then the raw scan when the walk found nothing.
    #[default]
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub slide_strategy: SlideStrategy,

    /// Windows code page assumed for 8-bit text when a stream does not declare one.
    #[serde(default = "default_code_page")]
    pub default_code_page: u16,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            slide_strategy: SlideStrategy::default(),
            default_code_page: default_code_page(),
        }
    }
}

fn default_context_window() -> usize {
    25
}

fn default_true() -> bool {
    true
}

fn default_min_box_size() -> f64 {
    0.5
}

fn default_code_page() -> u16 {
    949
}
