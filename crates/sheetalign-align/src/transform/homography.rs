// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exact four-point homography estimation.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use sheetalign_core::Point2D;
use sheetalign_core::error::{AlignError, Result};

const EPS: f64 = 1e-12;

/// A 3×3 projective transform normalised so that `h[2][2] == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomographyMatrix(Matrix3<f64>);

impl HomographyMatrix {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Map a point. `None` when it lands on the line at infinity.
    pub fn apply(&self, p: Point2D) -> Option<Point2D> {
        let v = self.0 * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= EPS {
            return None;
        }
        let (x, y) = (v[0] / w, v[1] / w);
        (x.is_finite() && y.is_finite()).then(|| Point2D::new(x, y))
    }

    pub fn inverse(&self) -> Result<Self> {
        self.0
            .try_inverse()
            .filter(|m| m.iter().all(|v| v.is_finite()))
            .map(Self)
            .ok_or_else(|| AlignError::Transform("homography is not invertible".into()))
    }
}

/// Solve the homography mapping `src[i]` onto `dst[i]` for `i in 0..4`.
///
/// Correspondences are taken positionally and only the first four entries of
/// each slice are read. No plausibility check is made: collinear or repeated
/// points make the linear system singular and yield a `Transform` error.
pub fn compute_homography(src: &[Point2D], dst: &[Point2D]) -> Result<HomographyMatrix> {
    if src.len() < 4 || dst.len() < 4 {
        return Err(AlignError::Transform(format!(
            "need 4 correspondences, got {} source and {} destination points",
            src.len(),
            dst.len()
        )));
    }

    // h = [h00 h01 h02 h10 h11 h12 h20 h21], h22 fixed at 1.
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for (i, (s, d)) in src.iter().zip(dst).take(4).enumerate() {
        let (x, y, u, v) = (s.x, s.y, d.x, d.y);
        let r = 2 * i;
        a.set_row(
            r,
            &SMatrix::<f64, 1, 8>::from_row_slice(&[x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u]),
        );
        a.set_row(
            r + 1,
            &SMatrix::<f64, 1, 8>::from_row_slice(&[0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v]),
        );
        b[r] = u;
        b[r + 1] = v;
    }

    let h = a
        .lu()
        .solve(&b)
        .ok_or_else(|| AlignError::Transform("correspondences are degenerate".into()))?;
    if h.iter().any(|v| !v.is_finite()) {
        return Err(AlignError::Transform("homography has non-finite entries".into()));
    }

    Ok(HomographyMatrix(Matrix3::new(
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
    )))
}
