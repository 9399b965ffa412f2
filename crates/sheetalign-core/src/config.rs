// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration. Every tunable constant of the alignment pipeline
// lives here with its default; hosts may override any subset from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Complete alignment configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub preprocess: PreprocessConfig,
    pub features: FeatureConfig,
    pub fallback: FallbackConfig,
    pub warp: WarpConfig,
    pub marks: MarkConfig,
}

impl AlignConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Binarization voting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Side of the Gaussian neighbourhood for adaptive thresholding (odd).
    pub adaptive_block_size: u32,
    /// Constant subtracted from the weighted neighbourhood mean.
    pub adaptive_c: f32,
    /// Fixed global threshold.
    pub fixed_threshold: u8,
    /// Contours must exceed this area (px²) to count toward a candidate's score.
    pub min_contour_area: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            adaptive_block_size: 11,
            adaptive_c: 2.0,
            fixed_threshold: 128,
            min_contour_area: 10.0,
        }
    }
}

/// Feature point extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Minimum accumulator votes for a Hough line.
    pub hough_vote_threshold: u32,
    /// Non-maximum suppression radius in the Hough accumulator.
    pub hough_suppression_radius: u32,
    /// Shortest segment kept, in pixels.
    pub min_line_length: f64,
    /// Largest run of missing pixels bridged within one segment.
    pub max_line_gap: u32,
    /// Contours must exceed this area (px²) to be polygon-approximated.
    pub min_contour_area: f64,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// Merge distance for near-duplicate points.
    pub dedup_threshold: f64,
    /// Points required for detection to count as successful.
    pub min_points: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            hough_vote_threshold: 50,
            hough_suppression_radius: 8,
            min_line_length: 50.0,
            max_line_gap: 10,
            min_contour_area: 100.0,
            approx_epsilon_ratio: 0.02,
            dedup_threshold: crate::types::DEFAULT_DEDUP_THRESHOLD,
            min_points: 4,
        }
    }
}

/// Outer-frame fallback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Global threshold; pixels at or below it are foreground.
    pub threshold: u8,
    /// Smallest acceptable frame, as a fraction of the image area.
    pub min_frame_ratio: f64,
    /// Polygon approximation tolerance as a fraction of the frame perimeter.
    pub approx_epsilon_ratio: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            threshold: 127,
            min_frame_ratio: 0.10,
            approx_epsilon_ratio: 0.02,
        }
    }
}

/// Resampling filter used by the warper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationKind {
    Nearest,
    Bilinear,
}

/// Perspective warp settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    pub interpolation: InterpolationKind,
    /// Value written to every channel of unmapped output pixels.
    pub background: u8,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            interpolation: InterpolationKind::Nearest,
            background: 0,
        }
    }
}

/// Option-mark candidate extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkConfig {
    pub min_area: f64,
    pub max_area: f64,
    /// `4π·area/perimeter²` below this is treated as noise.
    pub min_circularity: f64,
    /// Marks whose top edges lie within this many pixels share a row.
    pub row_band: f64,
}

impl Default for MarkConfig {
    fn default() -> Self {
        Self {
            min_area: 30.0,
            max_area: 5000.0,
            min_circularity: 0.6,
            row_band: 20.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            AlignConfig::from_json(r#"{ "features": { "dedup_threshold": 4.0 } }"#).unwrap();
        assert_eq!(config.features.dedup_threshold, 4.0);
        assert_eq!(config.features.hough_vote_threshold, 50);
        assert_eq!(config.preprocess, PreprocessConfig::default());
    }

    #[test]
    fn interpolation_is_lowercase_in_json() {
        let config = AlignConfig::from_json(r#"{ "warp": { "interpolation": "bilinear" } }"#)
            .unwrap();
        assert_eq!(config.warp.interpolation, InterpolationKind::Bilinear);
    }

    #[test]
    fn load_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("align.json");
        let mut config = AlignConfig::default();
        config.fallback.threshold = 90;
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        assert_eq!(AlignConfig::load(&path).unwrap(), config);
    }
}
