// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Option-mark candidates — round, filled blobs on an aligned sheet, reported
// in reading order for the visualization layer. Deciding which marks count
// as answers is left to the caller.

use std::f64::consts::PI;

use image::GrayImage;
use imageproc::contrast::otsu_level;
use sheetalign_core::config::MarkConfig;
use sheetalign_core::error::{AlignError, Result};
use sheetalign_core::{Contour, MarkRecord, RasterImage};
use tracing::{debug, instrument};

use crate::geometry::{closed_perimeter, external_contours, polygon_area};
use crate::preprocess::threshold_inverse;
use crate::raster::to_gray;

/// Finds option-mark candidates on aligned sheets.
#[derive(Debug, Clone, Default)]
pub struct MarkDetector {
    config: MarkConfig,
}

impl MarkDetector {
    pub fn new(config: MarkConfig) -> Self {
        Self { config }
    }

    /// Candidate marks sorted top-to-bottom, then left-to-right within rows.
    #[instrument(skip_all, fields(width = aligned.width(), height = aligned.height()))]
    pub fn detect(&self, aligned: &RasterImage) -> Result<Vec<MarkRecord>> {
        if aligned.is_empty() {
            return Err(AlignError::Input("cannot search an empty image for marks".into()));
        }
        let gray = to_gray(aligned)?;
        let mask = threshold_inverse(&gray, otsu_level(&gray));

        let marks: Vec<MarkRecord> = external_contours(&mask)
            .iter()
            .filter_map(|contour| self.measure(contour, &mask))
            .collect();
        debug!(marks = marks.len(), "Mark candidates measured");

        Ok(sort_reading_order(marks, self.config.row_band))
    }

    fn measure(&self, contour: &Contour, mask: &GrayImage) -> Option<MarkRecord> {
        let area = polygon_area(&contour.points);
        if area < self.config.min_area || area > self.config.max_area {
            return None;
        }
        let perimeter = closed_perimeter(&contour.points);
        if perimeter <= 0.0 {
            return None;
        }
        let circularity = 4.0 * PI * area / (perimeter * perimeter);
        if circularity < self.config.min_circularity {
            return None;
        }

        let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
        let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
        for p in &contour.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let width = max_x - min_x + 1.0;
        let height = max_y - min_y + 1.0;

        let mut filled = 0usize;
        for y in min_y as u32..=max_y as u32 {
            for x in min_x as u32..=max_x as u32 {
                if mask.get_pixel(x, y).0[0] > 0 {
                    filled += 1;
                }
            }
        }
        let fill_ratio = filled as f64 / (width * height);

        Some(MarkRecord {
            x: min_x,
            y: min_y,
            width,
            height,
            area,
            circularity,
            confidence: circularity.clamp(0.0, 1.0) * fill_ratio,
        })
    }
}

/// Order marks into rows: a row starts at the topmost remaining mark and takes
/// every mark whose `y` is within `row_band` of it; rows are then sorted by `x`.
pub fn sort_reading_order(mut marks: Vec<MarkRecord>, row_band: f64) -> Vec<MarkRecord> {
    marks.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut ordered = Vec::with_capacity(marks.len());
    let mut row: Vec<MarkRecord> = Vec::new();
    let mut row_top = f64::NEG_INFINITY;
    for mark in marks {
        if !row.is_empty() && mark.y - row_top > row_band {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            ordered.append(&mut row);
        }
        if row.is_empty() {
            row_top = mark.y;
        }
        row.push(mark);
    }
    row.sort_by(|a, b| a.x.total_cmp(&b.x));
    ordered.append(&mut row);
    ordered
}
