// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preprocessor — grayscale conversion and binarization voting.
//
// Three thresholding methods run on the same grayscale image; each resulting
// mask is scored by how many plausible external contours it contains and the
// best one wins. Ink (dark) is foreground in every mask.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::separable_filter_equal;
use sheetalign_core::RasterImage;
use sheetalign_core::config::PreprocessConfig;
use sheetalign_core::error::{AlignError, Result};
use tracing::{debug, info, instrument};

use crate::geometry::{external_contours, polygon_area};
use crate::raster::to_gray;

type LevelImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Value of foreground pixels in every mask produced by this crate.
pub const FOREGROUND: u8 = 255;

/// How a binary mask was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMethod {
    /// Global threshold maximising between-class variance.
    Otsu,
    /// Gaussian-weighted local mean minus a constant.
    AdaptiveGaussian,
    /// Fixed global threshold.
    Fixed,
}

/// Single-channel foreground mask plus the vote it received.
#[derive(Debug, Clone)]
pub struct BinaryImage {
    mask: GrayImage,
    method: ThresholdMethod,
    score: usize,
}

impl BinaryImage {
    pub fn new(mask: GrayImage, method: ThresholdMethod, score: usize) -> Self {
        Self {
            mask,
            method,
            score,
        }
    }

    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    pub fn method(&self) -> ThresholdMethod {
        self.method
    }

    /// Number of external contours above the minimum area.
    pub fn score(&self) -> usize {
        self.score
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }
}

/// Chooses the most structured binarization of an input raster.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Binarize `image` with every method and keep the highest-scoring mask.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn binarize(&self, image: &RasterImage) -> Result<BinaryImage> {
        if image.is_empty() {
            return Err(AlignError::Preprocess(format!(
                "cannot binarize a {}x{} image",
                image.width(),
                image.height()
            )));
        }

        let gray = to_gray(image)?;

        let otsu = threshold_inverse(&gray, otsu_level(&gray));
        let adaptive =
            adaptive_gaussian(&gray, self.config.adaptive_block_size, self.config.adaptive_c);
        let fixed = threshold_inverse(&gray, self.config.fixed_threshold);
        drop(gray);

        let candidates = vec![
            self.scored(otsu, ThresholdMethod::Otsu),
            self.scored(adaptive, ThresholdMethod::AdaptiveGaussian),
            self.scored(fixed, ThresholdMethod::Fixed),
        ];

        let winner = select_best(candidates)
            .ok_or_else(|| AlignError::Preprocess("no binarization candidates".into()))?;
        info!(method = ?winner.method, score = winner.score, "Binarization selected");
        Ok(winner)
    }

    fn scored(&self, mask: GrayImage, method: ThresholdMethod) -> BinaryImage {
        let score = count_valid_contours(&mask, self.config.min_contour_area);
        debug!(?method, score, "Binarization candidate scored");
        BinaryImage::new(mask, method, score)
    }
}

/// Pick the candidate with the highest score. Ties go to the earliest
/// candidate; every other candidate is dropped here.
pub fn select_best(candidates: Vec<BinaryImage>) -> Option<BinaryImage> {
    let mut best: Option<BinaryImage> = None;
    for candidate in candidates {
        match &best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Count external contours whose enclosed area exceeds `min_area`.
pub fn count_valid_contours(mask: &GrayImage, min_area: f64) -> usize {
    external_contours(mask)
        .iter()
        .filter(|c| polygon_area(&c.points) > min_area)
        .count()
}

/// Mark pixels at or below `level` as foreground.
pub fn threshold_inverse(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] <= level {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

/// Mark pixels at or below their Gaussian-weighted neighbourhood mean minus
/// `c` as foreground.
///
/// The neighbourhood is `block_size`×`block_size` (rounded up to odd).
pub fn adaptive_gaussian(gray: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    let local_mean = gaussian_local_mean(gray, block_size);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y).0[0] as f32;
        let threshold = local_mean.get_pixel(x, y).0[0] - c;
        if value <= threshold {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

/// Normalised 1-D Gaussian with exactly `block_size` taps (odd, at least 3).
///
/// Sigma follows the usual derivation from the window width:
/// `0.3·((n − 1)/2 − 1) + 0.8`.
pub fn gaussian_kernel(block_size: u32) -> Vec<f32> {
    let taps = block_size.max(3) | 1;
    let sigma = 0.3 * ((taps as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (taps / 2) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// Gaussian-weighted mean over a `block_size` window, kept in `f32` so the
/// separable passes do not truncate.
fn gaussian_local_mean(gray: &GrayImage, block_size: u32) -> LevelImage {
    let levels = LevelImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([gray.get_pixel(x, y).0[0] as f32])
    });
    separable_filter_equal(&levels, &gaussian_kernel(block_size))
}
