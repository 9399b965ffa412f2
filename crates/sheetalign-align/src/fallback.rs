// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame fallback — aligns a sample by its largest quadrilateral outline when
// feature points are unavailable.

use sheetalign_core::config::{FallbackConfig, WarpConfig};
use sheetalign_core::error::{AlignError, Result};
use sheetalign_core::{AlignmentMethod, AlignmentResult, Point2D, RasterImage, Size};
use tracing::{debug, info, instrument, warn};

use crate::geometry::{
    approximate_closed, closed_perimeter, external_contours, polygon_area, sort_by_angle,
};
use crate::preprocess::threshold_inverse;
use crate::raster::to_gray;
use crate::transform::{Warper, compute_homography};

/// Aligns a sample by mapping its outer frame onto the template rectangle.
#[derive(Debug, Clone, Default)]
pub struct FallbackAligner {
    config: FallbackConfig,
    warper: Warper,
}

impl FallbackAligner {
    pub fn new(config: FallbackConfig, warp: WarpConfig) -> Self {
        Self {
            config,
            warper: Warper::new(warp),
        }
    }

    /// Align `sample` into a `template_size` canvas, reporting failures in the
    /// result rather than as an error.
    pub fn align(&self, sample: &RasterImage, template_size: Size) -> AlignmentResult {
        match self.try_align(sample, template_size) {
            Ok(image) => AlignmentResult::aligned(image, AlignmentMethod::Fallback),
            Err(err) => {
                warn!(%err, "Frame fallback failed");
                AlignmentResult::failed(&err)
            }
        }
    }

    /// Align `sample` into a `template_size` canvas.
    #[instrument(skip_all, fields(width = sample.width(), height = sample.height()))]
    pub fn try_align(&self, sample: &RasterImage, template_size: Size) -> Result<RasterImage> {
        let corners = self.locate_frame(sample)?;

        let (w, h) = (template_size.width as f64, template_size.height as f64);
        let destination = [
            Point2D::new(0.0, 0.0),
            Point2D::new(w, 0.0),
            Point2D::new(w, h),
            Point2D::new(0.0, h),
        ];

        let homography = compute_homography(&corners, &destination)?;
        let aligned = self.warper.warp(sample, &homography, template_size)?;
        info!("Sample aligned by outer frame");
        Ok(aligned)
    }

    /// Find the four corners of the sample's outer frame, in angular order
    /// around their centroid.
    pub fn locate_frame(&self, sample: &RasterImage) -> Result<[Point2D; 4]> {
        if sample.is_empty() {
            return Err(AlignError::Input(format!(
                "cannot align a {}x{} image",
                sample.width(),
                sample.height()
            )));
        }

        let mask = threshold_inverse(&to_gray(sample)?, self.config.threshold);
        let frame_area = sample.size().area();
        let required = frame_area * self.config.min_frame_ratio;

        let largest = external_contours(&mask)
            .into_iter()
            .map(|c| (polygon_area(&c.points), c))
            .max_by(|a, b| a.0.total_cmp(&b.0));
        drop(mask);

        let (area, contour) = match largest {
            Some((area, contour)) if area >= required => (area, contour),
            Some((area, _)) => return Err(AlignError::NoOuterFrameFound { area, required }),
            None => return Err(AlignError::NoOuterFrameFound { area: 0.0, required }),
        };
        debug!(area, required, "Outer frame candidate found");

        let epsilon = self.config.approx_epsilon_ratio * closed_perimeter(&contour.points);
        let approx = approximate_closed(&contour.points, epsilon);
        let mut corners: [Point2D; 4] = approx
            .as_slice()
            .try_into()
            .map_err(|_| AlignError::NotQuadrilateral {
                vertices: approx.len(),
            })?;

        sort_by_angle(&mut corners);
        debug!(?corners, "Outer frame corners");
        Ok(corners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blank_gray, draw_frame, gray_raster};
    use image::Luma;
    use imageproc::drawing::draw_filled_circle_mut;
    use sheetalign_core::Channels;

    #[test]
    fn dark_bordered_quad_covering_half_the_image_aligns() {
        // 300x225 frame inside a 400x300 image: 56% of the area.
        let mut gray = blank_gray(400, 300, 240);
        draw_frame(&mut gray, (50, 37), (300, 225), 6, 20);
        let sample = gray_raster(gray);

        let aligner = FallbackAligner::default();
        let corners = aligner.locate_frame(&sample).unwrap();
        assert!((corners[0].x - 50.0).abs() <= 1.0 && (corners[0].y - 37.0).abs() <= 1.0);
        assert!((corners[2].x - 349.0).abs() <= 1.0 && (corners[2].y - 261.0).abs() <= 1.0);

        let result = aligner.align(&sample, Size::new(320, 240));
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.method, Some(AlignmentMethod::Fallback));
        assert_eq!(result.image.unwrap().size(), Size::new(320, 240));
    }

    #[test]
    fn blank_image_has_no_outer_frame() {
        let sample = RasterImage::filled(200, 150, Channels::Rgb, 255);
        let err = FallbackAligner::default()
            .try_align(&sample, Size::new(200, 150))
            .unwrap_err();
        assert!(matches!(err, AlignError::NoOuterFrameFound { .. }));
    }

    #[test]
    fn small_frame_is_rejected() {
        let mut gray = blank_gray(400, 300, 240);
        draw_frame(&mut gray, (10, 10), (60, 60), 4, 20);
        let err = FallbackAligner::default()
            .try_align(&gray_raster(gray), Size::new(400, 300))
            .unwrap_err();
        assert!(matches!(err, AlignError::NoOuterFrameFound { area, required }
            if area > 0.0 && area < required));
    }

    #[test]
    fn round_outline_is_not_a_quadrilateral() {
        let mut gray = blank_gray(300, 300, 240);
        draw_filled_circle_mut(&mut gray, (150, 150), 120, Luma([20u8]));
        let err = FallbackAligner::default()
            .try_align(&gray_raster(gray), Size::new(300, 300))
            .unwrap_err();
        assert!(matches!(err, AlignError::NotQuadrilateral { vertices } if vertices != 4));
    }

    #[test]
    fn failures_are_reported_in_the_result() {
        let sample = RasterImage::filled(50, 50, Channels::Gray, 255);
        let result = FallbackAligner::default().align(&sample, Size::new(50, 50));
        assert!(!result.success);
        assert!(result.image.is_none());
        assert!(result.error.unwrap().contains("no outer frame"));
    }
}
