// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for sheetalign.

use thiserror::Error;

use crate::types::SessionState;

/// Top-level error type for all alignment operations.
#[derive(Debug, Error)]
pub enum AlignError {
    // -- Input errors --
    #[error("invalid input image: {0}")]
    Input(String),

    #[error("image decode failed: {0}")]
    Decode(String),

    // -- Pipeline errors --
    #[error("preprocessing failed: {0}")]
    Preprocess(String),

    /// Recovered by the fallback path; only surfaces from direct detector use.
    #[error("feature detection failed: {0}")]
    Detection(String),

    #[error("no outer frame found: largest contour area {area:.0} px² is below {required:.0} px²")]
    NoOuterFrameFound { area: f64, required: f64 },

    #[error("outer frame is not a quadrilateral: approximation has {vertices} vertices")]
    NotQuadrilateral { vertices: usize },

    #[error("transform estimation failed: {0}")]
    Transform(String),

    // -- Session errors --
    #[error("alignment session is not ready (state: {0})")]
    NotReady(SessionState),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AlignError>;
