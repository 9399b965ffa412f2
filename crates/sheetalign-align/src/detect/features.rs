// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Feature point detection — line segment endpoints plus the corners of every
// quadrilateral contour, merged into one deduplicated point set.

use sheetalign_core::config::FeatureConfig;
use sheetalign_core::error::{AlignError, Result};
use sheetalign_core::{FeaturePointSet, Point2D};
use tracing::{debug, info, instrument, warn};

use super::segments::{SegmentOptions, detect_segments};
use crate::geometry::{approximate_closed, closed_perimeter, external_contours, polygon_area};
use crate::preprocess::BinaryImage;

/// Outcome of feature detection. `success` holds iff at least
/// `min_points` unique points were found.
#[derive(Debug, Clone)]
pub struct Detection {
    pub points: FeaturePointSet,
    pub success: bool,
}

impl Detection {
    fn failed(threshold: f64) -> Self {
        Self {
            points: FeaturePointSet::new(threshold),
            success: false,
        }
    }
}

/// Extracts alignment feature points from a binary mask.
#[derive(Debug, Clone, Default)]
pub struct FeatureDetector {
    config: FeatureConfig,
}

impl FeatureDetector {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Detect feature points. Never fails: internal errors are logged and
    /// reported as an unsuccessful, empty detection.
    #[instrument(skip_all, fields(width = binary.width(), height = binary.height()))]
    pub fn detect(&self, binary: &BinaryImage) -> Detection {
        match self.try_detect(binary) {
            Ok(detection) => {
                info!(
                    points = detection.points.len(),
                    success = detection.success,
                    "Feature detection complete"
                );
                detection
            }
            Err(err) => {
                warn!(%err, "Feature detection failed");
                Detection::failed(self.config.dedup_threshold)
            }
        }
    }

    fn try_detect(&self, binary: &BinaryImage) -> Result<Detection> {
        if binary.width() == 0 || binary.height() == 0 {
            return Err(AlignError::Detection("empty mask".into()));
        }

        let endpoints = self.line_endpoints(binary);
        let corners = self.quad_corners(binary);
        debug!(
            endpoints = endpoints.len(),
            corners = corners.len(),
            "Feature candidates collected"
        );

        let points = FeaturePointSet::from_candidates(
            endpoints.into_iter().chain(corners),
            self.config.dedup_threshold,
        );
        if points.points().iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(AlignError::Detection("non-finite feature point".into()));
        }
        let success = points.len() >= self.config.min_points;
        Ok(Detection { points, success })
    }

    /// Both endpoints of every detected line segment.
    fn line_endpoints(&self, binary: &BinaryImage) -> Vec<Point2D> {
        let options = SegmentOptions {
            vote_threshold: self.config.hough_vote_threshold,
            suppression_radius: self.config.hough_suppression_radius,
            min_length: self.config.min_line_length,
            max_gap: self.config.max_line_gap,
        };
        detect_segments(binary.mask(), options)
            .into_iter()
            .flat_map(|s| [s.start, s.end])
            .collect()
    }

    /// Vertices of every sufficiently large contour that simplifies to exactly
    /// four corners.
    fn quad_corners(&self, binary: &BinaryImage) -> Vec<Point2D> {
        external_contours(binary.mask())
            .into_iter()
            .filter(|c| polygon_area(&c.points) > self.config.min_contour_area)
            .filter_map(|c| {
                let epsilon = self.config.approx_epsilon_ratio * closed_perimeter(&c.points);
                let approx = approximate_closed(&c.points, epsilon);
                (approx.len() == 4).then_some(approx)
            })
            .flatten()
            .collect()
    }
}
