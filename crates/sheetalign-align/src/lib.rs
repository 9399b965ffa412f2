// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sheetalign-align — Template alignment for photographed answer sheets.
//
// Binarizes a sample, detects feature points, and warps it onto the template's
// pixel grid through a homography, falling back to the sheet's outer frame
// when features are scarce. Also locates option-mark candidates on aligned
// sheets.

pub mod detect;
pub mod fallback;
pub mod geometry;
pub mod marks;
pub mod orchestrator;
pub mod preprocess;
pub mod raster;
pub mod transform;

#[cfg(test)]
mod test_support;

// Re-export the primary structs so callers can use `sheetalign_align::AlignmentOrchestrator` etc.
pub use detect::{Detection, FeatureDetector};
pub use fallback::FallbackAligner;
pub use marks::MarkDetector;
pub use orchestrator::AlignmentOrchestrator;
pub use preprocess::{BinaryImage, Preprocessor};
pub use raster::{decode_raster, load_raster, save_raster};
pub use transform::{HomographyMatrix, Warper, compute_homography};
