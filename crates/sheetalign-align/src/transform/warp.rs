// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective warper — resamples a raster into a fixed-size canvas through a
// homography.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, warp_into_with};
use sheetalign_core::config::{InterpolationKind, WarpConfig};
use sheetalign_core::error::{AlignError, Result};
use sheetalign_core::{Point2D, RasterImage, Size};
use tracing::{debug, instrument};

use super::homography::HomographyMatrix;
use crate::raster::{raster_from_dynamic, raster_to_dynamic};

/// Warps rasters through a homography into a canvas of a requested size.
#[derive(Debug, Clone, Default)]
pub struct Warper {
    config: WarpConfig,
}

impl Warper {
    pub fn new(config: WarpConfig) -> Self {
        Self { config }
    }

    /// Produce an `out_size` raster where each pixel `q` is sampled from
    /// `image` at `H⁻¹·q`. Pixels whose source falls outside `image` keep the
    /// background value. The channel layout of `image` is preserved.
    #[instrument(skip_all, fields(out_w = out_size.width, out_h = out_size.height))]
    pub fn warp(
        &self,
        image: &RasterImage,
        homography: &HomographyMatrix,
        out_size: Size,
    ) -> Result<RasterImage> {
        if out_size.is_empty() {
            return Err(AlignError::Transform(format!(
                "cannot warp into a {}x{} canvas",
                out_size.width, out_size.height
            )));
        }

        let inverse = homography.inverse()?;
        let mapping = move |x: f32, y: f32| match inverse.apply(Point2D::new(x as f64, y as f64)) {
            Some(p) => (p.x as f32, p.y as f32),
            None => (-1.0, -1.0),
        };
        let interpolation = match self.config.interpolation {
            InterpolationKind::Nearest => Interpolation::Nearest,
            InterpolationKind::Bilinear => Interpolation::Bilinear,
        };
        let bg = self.config.background;
        let Size { width, height } = out_size;

        let warped = match raster_to_dynamic(image)? {
            DynamicImage::ImageLuma8(src) => {
                let mut out = GrayImage::new(width, height);
                warp_into_with(&src, mapping, interpolation, Luma([bg]), &mut out);
                DynamicImage::ImageLuma8(out)
            }
            DynamicImage::ImageRgb8(src) => {
                let mut out = RgbImage::new(width, height);
                warp_into_with(&src, mapping, interpolation, Rgb([bg; 3]), &mut out);
                DynamicImage::ImageRgb8(out)
            }
            DynamicImage::ImageRgba8(src) => {
                let mut out = RgbaImage::new(width, height);
                warp_into_with(&src, mapping, interpolation, Rgba([bg; 4]), &mut out);
                DynamicImage::ImageRgba8(out)
            }
            _ => return Err(AlignError::Input("unsupported raster layout".into())),
        };

        debug!("Perspective warp applied");
        raster_from_dynamic(warped)
    }
}
