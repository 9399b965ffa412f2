// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Alignment orchestrator — owns one template session and sequences the
// pipeline for every sample.
//
// State machine:
//
//   Uninitialized ─▶ Initializing ─▶ Ready ─▶ Aligning ─▶ Ready
//                          └──────▶ Failed
//
// The public entry points are async so a host can await image decoding; the
// numeric pipeline itself runs synchronously inside each call.

use std::path::Path;

use sheetalign_core::config::AlignConfig;
use sheetalign_core::error::{AlignError, Result};
use sheetalign_core::{
    AlignmentMethod, AlignmentResult, FeaturePointSet, Point2D, PointSource, RasterImage,
    SessionState, TemplateSession,
};
use tracing::{info, instrument, warn};

use crate::detect::FeatureDetector;
use crate::fallback::FallbackAligner;
use crate::preprocess::Preprocessor;
use crate::raster::load_raster;
use crate::transform::{Warper, compute_homography};

/// Aligns samples against a single template session.
///
/// Independent sessions are independent orchestrators. `&mut self` on the
/// aligning entry points means one orchestrator never runs two alignments at
/// once; hosts that share one across tasks wrap it in a `tokio::sync::Mutex`.
pub struct AlignmentOrchestrator {
    preprocessor: Preprocessor,
    detector: FeatureDetector,
    warper: Warper,
    fallback: FallbackAligner,
    state: SessionState,
    session: Option<TemplateSession>,
}

impl Default for AlignmentOrchestrator {
    fn default() -> Self {
        Self::new(AlignConfig::default())
    }
}

impl AlignmentOrchestrator {
    pub fn new(config: AlignConfig) -> Self {
        Self {
            preprocessor: Preprocessor::new(config.preprocess),
            detector: FeatureDetector::new(config.features),
            warper: Warper::new(config.warp.clone()),
            fallback: FallbackAligner::new(config.fallback, config.warp),
            state: SessionState::Uninitialized,
            session: None,
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The active template session, if initialization succeeded.
    pub fn session(&self) -> Option<&TemplateSession> {
        self.session.as_ref()
    }

    // -- Template -------------------------------------------------------------

    /// Record the template's reference geometry.
    ///
    /// When fewer than the required feature points are found, the template's
    /// four image corners are recorded instead. Any fault leaves the
    /// orchestrator `Failed` with no session.
    #[instrument(skip_all, fields(width = template.width(), height = template.height()))]
    pub async fn initialize_with_template(
        &mut self,
        template: &RasterImage,
    ) -> Result<&TemplateSession> {
        self.state = SessionState::Initializing;
        self.session = None;

        match self.build_session(template) {
            Ok(session) => {
                info!(
                    session = %session.id,
                    points = session.template_points.len(),
                    source = ?session.point_source,
                    "Template session ready"
                );
                self.state = SessionState::Ready;
                Ok(&*self.session.insert(session))
            }
            Err(err) => {
                warn!(%err, "Template initialization failed");
                self.state = SessionState::Failed;
                Err(err)
            }
        }
    }

    /// Decode a template file, then initialize from it.
    pub async fn initialize_from_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<&TemplateSession> {
        match load_raster(path).await {
            Ok(template) => self.initialize_with_template(&template).await,
            Err(err) => {
                self.state = SessionState::Failed;
                self.session = None;
                Err(err)
            }
        }
    }

    fn build_session(&self, template: &RasterImage) -> Result<TemplateSession> {
        if template.is_empty() {
            return Err(AlignError::Input(format!(
                "template is {}x{}",
                template.width(),
                template.height()
            )));
        }

        let binary = self.preprocessor.binarize(template)?;
        let detection = self.detector.detect(&binary);
        drop(binary);

        let size = template.size();
        let (points, source) = if detection.success {
            (detection.points, PointSource::Detected)
        } else {
            warn!(
                points = detection.points.len(),
                "Template features insufficient; using image corners"
            );
            let (w, h) = (size.width as f64, size.height as f64);
            let corners = FeaturePointSet::from_candidates(
                [
                    Point2D::new(0.0, 0.0),
                    Point2D::new(w, 0.0),
                    Point2D::new(w, h),
                    Point2D::new(0.0, h),
                ],
                0.0,
            );
            (corners, PointSource::ImageCorners)
        };

        Ok(TemplateSession::new(points, size, source))
    }

    /// Drop the template session and return to `Uninitialized`.
    pub fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            info!(session = %session.id, "Template session torn down");
        }
        self.state = SessionState::Uninitialized;
    }

    // -- Samples --------------------------------------------------------------

    /// Align a sample to the template.
    ///
    /// Requires a `Ready` session; otherwise a failure result is returned and
    /// the state is left untouched. Every fault is reported in the result.
    #[instrument(skip_all, fields(width = sample.width(), height = sample.height()))]
    pub async fn align_user_image(&mut self, sample: &RasterImage) -> AlignmentResult {
        if self.state != SessionState::Ready {
            return AlignmentResult::failed(&AlignError::NotReady(self.state));
        }

        self.state = SessionState::Aligning;
        let outcome = self.align_sample(sample);
        self.state = SessionState::Ready;

        match outcome {
            Ok((image, method)) => {
                info!(?method, "Sample aligned");
                AlignmentResult::aligned(image, method)
            }
            Err(err) => {
                warn!(%err, "Sample alignment failed");
                AlignmentResult::failed(&err)
            }
        }
    }

    /// Decode a sample file, then align it.
    pub async fn align_path(&mut self, path: impl AsRef<Path>) -> AlignmentResult {
        if self.state != SessionState::Ready {
            return AlignmentResult::failed(&AlignError::NotReady(self.state));
        }
        match load_raster(path).await {
            Ok(sample) => self.align_user_image(&sample).await,
            Err(err) => AlignmentResult::failed(&err),
        }
    }

    fn align_sample(&self, sample: &RasterImage) -> Result<(RasterImage, AlignmentMethod)> {
        let session = self
            .session
            .as_ref()
            .ok_or(AlignError::NotReady(SessionState::Uninitialized))?;
        if sample.is_empty() {
            return Err(AlignError::Input(format!(
                "sample is {}x{}",
                sample.width(),
                sample.height()
            )));
        }

        let binary = self.preprocessor.binarize(sample)?;
        let detection = self.detector.detect(&binary);
        drop(binary);

        if detection.success {
            match self.align_by_points(sample, detection.points.points(), session) {
                Ok(image) => return Ok((image, AlignmentMethod::Primary)),
                Err(err) => warn!(%err, "Feature alignment failed; trying frame fallback"),
            }
        } else {
            info!(
                points = detection.points.len(),
                "Too few sample features; trying frame fallback"
            );
        }

        let image = self.fallback.try_align(sample, session.template_size)?;
        Ok((image, AlignmentMethod::Fallback))
    }

    /// Map the first four sample points onto the first four template points.
    fn align_by_points(
        &self,
        sample: &RasterImage,
        sample_points: &[Point2D],
        session: &TemplateSession,
    ) -> Result<RasterImage> {
        let template_points = session.template_points.points();
        let homography = compute_homography(sample_points, template_points)?;
        self.warper.warp(sample, &homography, session.template_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        blank_gray, draw_frame, gray_raster, rotate_and_scale, sheet_template,
    };
    use sheetalign_core::{Channels, Size};

    #[tokio::test]
    async fn framed_template_records_detected_points() {
        let mut orchestrator = AlignmentOrchestrator::default();
        let template = gray_raster(sheet_template());

        let session = orchestrator.initialize_with_template(&template).await.unwrap();
        assert!(session.ready);
        assert!(session.template_points.len() >= 4);
        assert_eq!(session.point_source, PointSource::Detected);
        assert_eq!(session.template_size, Size::new(800, 600));
        assert_eq!(orchestrator.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn featureless_template_falls_back_to_image_corners() {
        let mut orchestrator = AlignmentOrchestrator::default();
        let template = RasterImage::filled(320, 240, Channels::Gray, 255);

        let session = orchestrator.initialize_with_template(&template).await.unwrap();
        assert_eq!(session.point_source, PointSource::ImageCorners);
        let corners: Vec<(f64, f64)> = session
            .template_points
            .points()
            .iter()
            .map(|p| (p.x, p.y))
            .collect();
        assert_eq!(corners, vec![(0.0, 0.0), (320.0, 0.0), (320.0, 240.0), (0.0, 240.0)]);
    }

    #[tokio::test]
    async fn empty_template_fails_initialization() {
        let mut orchestrator = AlignmentOrchestrator::default();
        let template = RasterImage::filled(0, 0, Channels::Gray, 0);

        assert!(orchestrator.initialize_with_template(&template).await.is_err());
        assert_eq!(orchestrator.state(), SessionState::Failed);
        assert!(orchestrator.session().is_none());
    }

    #[tokio::test]
    async fn aligning_before_initialization_does_not_mutate_state() {
        let mut orchestrator = AlignmentOrchestrator::default();
        let sample = gray_raster(sheet_template());

        let result = orchestrator.align_user_image(&sample).await;
        assert!(!result.success);
        assert!(result.image.is_none());
        assert!(result.error.unwrap().contains("not ready"));
        assert_eq!(orchestrator.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn rotated_and_scaled_sample_aligns_to_template_size() {
        let mut orchestrator = AlignmentOrchestrator::default();
        let template = gray_raster(sheet_template());
        orchestrator.initialize_with_template(&template).await.unwrap();

        let sample = rotate_and_scale(&template, 3.0, 0.95);
        let result = orchestrator.align_user_image(&sample).await;

        assert!(result.success, "{:?}", result.error);
        // Feature points are paired by position, so this covers the feature
        // path end to end, not pixel agreement with the template.
        assert_eq!(result.method, Some(AlignmentMethod::Primary));
        let aligned = result.image.unwrap();
        assert_eq!(aligned.size(), Size::new(800, 600));
        assert_eq!(orchestrator.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn featureless_sample_uses_frame_fallback() {
        let mut orchestrator = AlignmentOrchestrator::default();
        orchestrator
            .initialize_with_template(&gray_raster(sheet_template()))
            .await
            .unwrap();

        // Neither features nor a frame to fall back on.
        let blank = RasterImage::filled(400, 300, Channels::Rgb, 255);
        let result = orchestrator.align_user_image(&blank).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("no outer frame"));
        assert_eq!(orchestrator.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn framed_sample_aligns_to_template_size() {
        let mut orchestrator = AlignmentOrchestrator::default();
        orchestrator
            .initialize_with_template(&gray_raster(sheet_template()))
            .await
            .unwrap();

        let mut gray = blank_gray(500, 400, 240);
        draw_frame(&mut gray, (60, 50), (380, 300), 4, 10);
        let result = orchestrator.align_user_image(&gray_raster(gray)).await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.image.unwrap().size(), Size::new(800, 600));
    }

    #[tokio::test]
    async fn teardown_returns_to_uninitialized() {
        let mut orchestrator = AlignmentOrchestrator::default();
        orchestrator
            .initialize_with_template(&gray_raster(sheet_template()))
            .await
            .unwrap();
        orchestrator.teardown();

        assert_eq!(orchestrator.state(), SessionState::Uninitialized);
        assert!(orchestrator.session().is_none());
        let result = orchestrator.align_user_image(&gray_raster(sheet_template())).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let mut first = AlignmentOrchestrator::default();
        let mut second = AlignmentOrchestrator::default();
        first
            .initialize_with_template(&gray_raster(sheet_template()))
            .await
            .unwrap();
        second
            .initialize_with_template(&RasterImage::filled(100, 80, Channels::Gray, 255))
            .await
            .unwrap();

        let a = first.session().unwrap();
        let b = second.session().unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.template_size, Size::new(800, 600));
        assert_eq!(b.template_size, Size::new(100, 80));
    }

    #[tokio::test]
    async fn align_path_reports_decode_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let mut orchestrator = AlignmentOrchestrator::default();
        orchestrator
            .initialize_with_template(&gray_raster(sheet_template()))
            .await
            .unwrap();
        let result = orchestrator.align_path(&path).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("decode"));
        assert_eq!(orchestrator.state(), SessionState::Ready);
    }
}
