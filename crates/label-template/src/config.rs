//! Tunable rendering parameters

use crate::Result;
use label_text::{WidthModel, DEFAULT_CHAR_WIDTH_FACTOR, DEFAULT_SHRINK_STEP};
use serde::{Deserialize, Serialize};

/// Top-level configuration; every value has a default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub fit: FitConfig,
    pub export: ExportConfig,
}

impl LabelConfig {
    /// Load from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Font-fit estimate parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Millimetres per point for a full-width character
    #[serde(rename = "charWidthFactor")]
    pub char_width_factor: f64,

    /// Shrink decrement in points
    #[serde(rename = "shrinkStep")]
    pub shrink_step: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            char_width_factor: DEFAULT_CHAR_WIDTH_FACTOR,
            shrink_step: DEFAULT_SHRINK_STEP,
        }
    }
}

impl FitConfig {
    pub fn width_model(&self) -> WidthModel {
        WidthModel {
            char_width_factor: self.char_width_factor,
            shrink_step: self.shrink_step,
        }
    }
}

/// Layout parameters shared by the PDF exporter and the preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Strip under a barcode reserved for its caption, in mm
    #[serde(rename = "captionHeightMm")]
    pub caption_height_mm: f64,

    /// Caption font size in points
    #[serde(rename = "captionFontSize")]
    pub caption_font_size: f64,

    /// Label border stroke in points
    #[serde(rename = "borderWidthPt")]
    pub border_width_pt: f64,

    /// Line pitch as a multiple of the font size
    #[serde(rename = "lineHeightFactor")]
    pub line_height_factor: f64,

    /// Appended to clamped text
    pub ellipsis: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            caption_height_mm: 3.0,
            caption_font_size: 8.0,
            border_width_pt: 0.5,
            line_height_factor: 1.2,
            ellipsis: "...".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = LabelConfig::default();
        assert_eq!(config.fit.width_model(), WidthModel::default());
        assert_eq!(config.export.caption_height_mm, 3.0);
        assert_eq!(config.export.ellipsis, "...");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LabelConfig::from_json(r#"{ "fit": { "charWidthFactor": 0.35 } }"#).unwrap();
        assert_eq!(config.fit.char_width_factor, 0.35);
        assert_eq!(config.fit.shrink_step, 0.5);
        assert_eq!(config.export, ExportConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        assert!(LabelConfig::from_json("42").is_err());
        assert!(LabelConfig::from_json(r#"{ "fit": { "shrinkStep": "x" } }"#).is_err());
    }
}
