// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometric transforms — four-point homography estimation and perspective
// warping into the template's pixel grid.

pub mod homography;
pub mod warp;

pub use homography::{HomographyMatrix, compute_homography};
pub use warp::Warper;
