// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for sheet alignment: rasters, points, point sets, template
// sessions, alignment results, and option-mark records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AlignError, Result};
use crate::human_errors::{HumanError, humanize_error};

/// Unique identifier for a template session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Rasters ------------------------------------------------------------------

/// Number of interleaved channels in a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channels {
    Gray,
    Rgb,
    Rgba,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }

    pub fn from_count(count: usize) -> Result<Self> {
        match count {
            1 => Ok(Channels::Gray),
            3 => Ok(Channels::Rgb),
            4 => Ok(Channels::Rgba),
            other => Err(AlignError::Input(format!(
                "unsupported channel count {other} (expected 1, 3 or 4)"
            ))),
        }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A decoded, row-major, 8-bit raster supplied by the host.
///
/// The pipeline only ever borrows a `RasterImage`; it never mutates the
/// caller's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: Channels,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap a pixel buffer, checking that its length matches the dimensions.
    pub fn new(width: u32, height: u32, channels: Channels, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * channels.count();
        if data.len() != expected {
            return Err(AlignError::Input(format!(
                "pixel buffer holds {} bytes, {width}x{height}x{} needs {expected}",
                data.len(),
                channels.count()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A raster with every byte set to `value`.
    pub fn filled(width: u32, height: u32, channels: Channels, value: u8) -> Self {
        let len = width as usize * height as usize * channels.count();
        Self {
            width,
            height,
            channels,
            data: vec![value; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }
}

// -- Geometry -----------------------------------------------------------------

/// A point in floating-point image coordinates (x right, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Closed polygonal boundary of a connected region, in tracing order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<Point2D>,
}

impl Contour {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Default merge distance for [`FeaturePointSet`], in pixels.
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 10.0;

/// Ordered set of feature points with near-duplicate suppression.
///
/// A candidate is dropped when an already kept point lies strictly closer than
/// `threshold` on *both* axes. The first occurrence always wins, so insertion
/// order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePointSet {
    points: Vec<Point2D>,
    threshold: f64,
}

impl FeaturePointSet {
    pub fn new(threshold: f64) -> Self {
        Self {
            points: Vec::new(),
            threshold,
        }
    }

    /// Build a set from candidates in order, merging near-duplicates.
    pub fn from_candidates<I>(candidates: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = Point2D>,
    {
        let mut set = Self::new(threshold);
        for point in candidates {
            set.insert(point);
        }
        set
    }

    /// Insert a point unless it merges with an existing one. Returns whether
    /// the point was kept.
    pub fn insert(&mut self, point: Point2D) -> bool {
        let threshold = self.threshold;
        let duplicate = self.points.iter().any(|kept| {
            (kept.x - point.x).abs() < threshold && (kept.y - point.y).abs() < threshold
        });
        if duplicate {
            return false;
        }
        self.points.push(point);
        true
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for FeaturePointSet {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_THRESHOLD)
    }
}

// -- Sessions -----------------------------------------------------------------

/// Lifecycle states of an alignment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No template has been supplied yet (or the session was torn down).
    Uninitialized,
    /// Template analysis is running.
    Initializing,
    /// Template points are recorded; samples can be aligned.
    Ready,
    /// A sample is being aligned.
    Aligning,
    /// Template analysis faulted. Re-initialize with a new template.
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Ready => "ready",
            SessionState::Aligning => "aligning",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Where a session's template points came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointSource {
    /// Feature detection found at least four points.
    Detected,
    /// Detection failed; the four image corners stand in.
    ImageCorners,
}

/// Reference geometry recorded from the template image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSession {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub template_points: FeaturePointSet,
    pub template_size: Size,
    pub point_source: PointSource,
    pub ready: bool,
}

impl TemplateSession {
    pub fn new(
        template_points: FeaturePointSet,
        template_size: Size,
        point_source: PointSource,
    ) -> Self {
        Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            template_points,
            template_size,
            point_source,
            ready: true,
        }
    }
}

// -- Results ------------------------------------------------------------------

/// Which path produced an aligned image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentMethod {
    /// Feature points + homography.
    Primary,
    /// Largest quadrilateral frame.
    Fallback,
}

/// Outcome of a single alignment call. Never carries a partial image.
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    pub success: bool,
    pub image: Option<RasterImage>,
    pub error: Option<String>,
    /// Plain-language rendering of `error` for end users.
    pub human: Option<HumanError>,
    pub method: Option<AlignmentMethod>,
}

impl AlignmentResult {
    pub fn aligned(image: RasterImage, method: AlignmentMethod) -> Self {
        Self {
            success: true,
            image: Some(image),
            error: None,
            human: None,
            method: Some(method),
        }
    }

    pub fn failed(err: &AlignError) -> Self {
        Self {
            success: false,
            image: None,
            error: Some(err.to_string()),
            human: Some(humanize_error(err)),
            method: None,
        }
    }
}

/// A candidate option mark found on an aligned sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkRecord {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub area: f64,
    pub circularity: f64,
    pub confidence: f64,
}
