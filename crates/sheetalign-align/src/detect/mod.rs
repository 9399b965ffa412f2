// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Feature detection — Hough line segments and quadrilateral contour corners.

pub mod features;
pub mod segments;

pub use features::{Detection, FeatureDetector};
pub use segments::{LineSegment, SegmentOptions, detect_segments};
