// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster I/O — conversion between host `RasterImage` buffers and the `image`
// crate's buffers, grayscale extraction, and awaitable decode/encode.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, Rgba};
use sheetalign_core::error::{AlignError, Result};
use sheetalign_core::{Channels, RasterImage};
use tracing::{debug, info, instrument};

/// Copy a decoded `DynamicImage` into a `RasterImage`.
///
/// 8-bit gray, RGB and RGBA layouts are kept as-is; every other layout
/// (16-bit, float, gray+alpha) is normalised to 8-bit RGBA.
pub fn raster_from_dynamic(image: DynamicImage) -> Result<RasterImage> {
    let (width, height) = (image.width(), image.height());
    let (channels, data) = match image {
        DynamicImage::ImageLuma8(buf) => (Channels::Gray, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (Channels::Rgb, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (Channels::Rgba, buf.into_raw()),
        other => (Channels::Rgba, other.to_rgba8().into_raw()),
    };
    RasterImage::new(width, height, channels, data)
}

/// Copy a `RasterImage` into a `DynamicImage` of matching layout.
pub fn raster_to_dynamic(raster: &RasterImage) -> Result<DynamicImage> {
    let (w, h) = (raster.width(), raster.height());
    let data = raster.data().to_vec();
    let image = match raster.channels() {
        Channels::Gray => {
            ImageBuffer::<Luma<u8>, _>::from_raw(w, h, data).map(DynamicImage::ImageLuma8)
        }
        Channels::Rgb => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, data).map(DynamicImage::ImageRgb8)
        }
        Channels::Rgba => {
            ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, data).map(DynamicImage::ImageRgba8)
        }
    };
    image.ok_or_else(|| AlignError::Input(format!("pixel buffer does not fit {w}x{h}")))
}

/// Single-channel view of a raster.
///
/// Gray input is copied unchanged; RGB is converted to luma; RGBA drops alpha
/// before conversion.
pub fn to_gray(raster: &RasterImage) -> Result<GrayImage> {
    match raster.channels() {
        Channels::Gray => {
            GrayImage::from_raw(raster.width(), raster.height(), raster.data().to_vec())
                .ok_or_else(|| AlignError::Input("gray buffer does not fit its dimensions".into()))
        }
        Channels::Rgb => Ok(raster_to_dynamic(raster)?.to_luma8()),
        Channels::Rgba => {
            let rgb = raster_to_dynamic(raster)?.to_rgb8();
            Ok(DynamicImage::ImageRgb8(rgb).to_luma8())
        }
    }
}

/// Decode encoded image bytes (JPEG, PNG, TIFF, ...) into a raster.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode_raster(data: &[u8]) -> Result<RasterImage> {
    let image = image::load_from_memory(data)
        .map_err(|err| AlignError::Decode(format!("failed to decode image: {err}")))?;
    debug!(width = image.width(), height = image.height(), "Image decoded from bytes");
    raster_from_dynamic(image)
}

/// Read and fully decode an image file.
///
/// The file read is async; decoding runs on the blocking pool so a host's
/// async executor is never stalled. The raster is only returned once decoding
/// has finished.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_raster(path: impl AsRef<Path>) -> Result<RasterImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let raster = tokio::task::spawn_blocking(move || decode_raster(&bytes))
        .await
        .map_err(|err| AlignError::Decode(format!("decode task failed: {err}")))??;
    info!(
        width = raster.width(),
        height = raster.height(),
        channels = raster.channels().count(),
        "Image loaded"
    );
    Ok(raster)
}

/// Write a raster to a file. The format is inferred from the file extension.
pub fn save_raster(raster: &RasterImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    raster_to_dynamic(raster)?.save(path).map_err(|err| {
        AlignError::Input(format!("failed to save image to {}: {err}", path.display()))
    })
}

/// Wrap a gray buffer as a single-channel raster.
pub fn raster_from_gray(gray: GrayImage) -> Result<RasterImage> {
    raster_from_dynamic(DynamicImage::ImageLuma8(gray))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_input_is_copied_unchanged() {
        let raster = RasterImage::new(2, 2, Channels::Gray, vec![0, 64, 128, 255]).unwrap();
        let gray = to_gray(&raster).unwrap();
        assert_eq!(gray.into_raw(), vec![0, 64, 128, 255]);
    }

    #[test]
    fn rgba_alpha_does_not_affect_gray() {
        let opaque = RasterImage::new(1, 1, Channels::Rgba, vec![200, 100, 50, 255]).unwrap();
        let clear = RasterImage::new(1, 1, Channels::Rgba, vec![200, 100, 50, 0]).unwrap();
        let rgb = RasterImage::new(1, 1, Channels::Rgb, vec![200, 100, 50]).unwrap();
        let expected = to_gray(&rgb).unwrap().into_raw();
        assert_eq!(to_gray(&opaque).unwrap().into_raw(), expected);
        assert_eq!(to_gray(&clear).unwrap().into_raw(), expected);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_raster(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AlignError::Decode(_)));
    }

    #[tokio::test]
    async fn saved_png_loads_with_same_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        let raster = RasterImage::filled(37, 21, Channels::Rgb, 180);
        save_raster(&raster, &path).unwrap();

        let loaded = load_raster(&path).await.unwrap();
        assert_eq!(loaded.size(), raster.size());
        assert_eq!(loaded.channels(), Channels::Rgb);
        assert_eq!(loaded.data(), raster.data());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = load_raster("/nonexistent/sheet.png").await.unwrap_err();
        assert!(matches!(err, AlignError::Io(_)));
    }
}
