//! Image resize collaborator: the trait the pipeline calls, and the
//! production implementation built on `image` + `fast_image_resize`.

use fast_image_resize as fir;
use fast_image_resize::images::Image as FirImage;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, Resizer};
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How edges are filled when an operation needs pixels outside the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendMode {
    WhiteFill,
    BlackFill,
    Mirror,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gravity {
    Centre,
    North,
    South,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Nearest,
    Bilinear,
    CatmullRom,
    Lanczos3,
}

/// Parameters for one resize call. The pipeline always passes
/// `crop: false`, white-fill, centre gravity and bilinear interpolation;
/// the full surface exists so any conformant resizer is substitutable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResizeOptions {
    pub target_height: u32,
    pub crop: bool,
    pub extend: ExtendMode,
    pub gravity: Gravity,
    pub interpolation: Interpolation,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("image decode failed: {0}")]
    Decode(#[source] image::ImageError),
    #[error("resize failed: {0}")]
    Scale(String),
    #[error("jpeg encode failed: {0}")]
    Encode(#[source] image::ImageError),
    #[error("unsupported resize option: {0}")]
    Unsupported(&'static str),
}

/// Resizes raw image bytes to a height-normalized JPEG thumbnail.
///
/// Implementations must be cheap to call repeatedly; the pipeline invokes
/// them from blocking workers.
pub trait ImageResizer: Send + Sync {
    fn resize(&self, bytes: &[u8], options: &ResizeOptions) -> Result<Vec<u8>, ResizeError>;
}

/// Production resizer: decode with `image`, scale with `fast_image_resize`,
/// re-encode as JPEG at the requested quality.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeResizer;

impl NativeResizer {
    fn filter(interpolation: Interpolation) -> ResizeAlg {
        match interpolation {
            Interpolation::Nearest => ResizeAlg::Nearest,
            Interpolation::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
            Interpolation::CatmullRom => ResizeAlg::Convolution(FilterType::CatmullRom),
            Interpolation::Lanczos3 => ResizeAlg::Convolution(FilterType::Lanczos3),
        }
    }
}

impl ImageResizer for NativeResizer {
    fn resize(&self, bytes: &[u8], options: &ResizeOptions) -> Result<Vec<u8>, ResizeError> {
        if options.crop {
            return Err(ResizeError::Unsupported("crop"));
        }

        let decoded = image::load_from_memory(bytes).map_err(ResizeError::Decode)?;
        let src_rgb = decoded.to_rgb8();
        let (orig_w, orig_h) = src_rgb.dimensions();
        if orig_w == 0 || orig_h == 0 {
            return Err(ResizeError::Scale("source image is empty".to_string()));
        }

        let target_h = options.target_height.max(1);
        // Width follows the aspect ratio.
        let target_w =
            (((orig_w as u64) * (target_h as u64)).div_ceil(orig_h as u64) as u32).max(1);

        let src_image = FirImage::from_vec_u8(orig_w, orig_h, src_rgb.into_raw(), PixelType::U8x3)
            .map_err(|e| ResizeError::Scale(e.to_string()))?;
        let mut dst_image = FirImage::new(target_w, target_h, PixelType::U8x3);
        let fir_options =
            fir::ResizeOptions::new().resize_alg(Self::filter(options.interpolation));
        Resizer::new()
            .resize(&src_image, &mut dst_image, &fir_options)
            .map_err(|e| ResizeError::Scale(e.to_string()))?;

        let resized = RgbImage::from_raw(target_w, target_h, dst_image.into_vec())
            .ok_or_else(|| ResizeError::Scale("resized buffer has wrong length".to_string()))?;

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, options.quality)
            .encode_image(&resized)
            .map_err(ResizeError::Encode)?;
        Ok(out)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Deterministic JPEG bytes for fixtures, `width` x `height`.
    pub fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 90)
            .encode_image(&img)
            .unwrap();
        out
    }

    /// Records every call and returns canned bytes, or fails on the
    /// listed call indices (0-based).
    #[derive(Default)]
    pub struct RecordingResizer {
        pub calls: Mutex<Vec<ResizeOptions>>,
        pub fail_on: Vec<usize>,
    }

    impl RecordingResizer {
        pub fn failing_on(indices: &[usize]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: indices.to_vec(),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl ImageResizer for RecordingResizer {
        fn resize(&self, _bytes: &[u8], options: &ResizeOptions) -> Result<Vec<u8>, ResizeError> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push(*options);
            if self.fail_on.contains(&index) {
                Err(ResizeError::Scale("scripted failure".to_string()))
            } else {
                Ok(b"thumbnail-bytes".to_vec())
            }
        }
    }

    #[test]
    fn native_resizer_normalizes_height() {
        let bytes = sample_jpeg(80, 40);
        let options = ResizeOptions {
            target_height: 20,
            crop: false,
            extend: ExtendMode::WhiteFill,
            gravity: Gravity::Centre,
            interpolation: Interpolation::Bilinear,
            quality: 90,
        };
        let out = NativeResizer.resize(&bytes, &options).unwrap();
        let thumb = image::load_from_memory(&out).unwrap();
        assert_eq!(thumb.height(), 20);
        assert_eq!(thumb.width(), 40);
    }

    #[test]
    fn native_resizer_never_produces_zero_width() {
        let bytes = sample_jpeg(1, 400);
        let options = ResizeOptions {
            target_height: 100,
            crop: false,
            extend: ExtendMode::WhiteFill,
            gravity: Gravity::Centre,
            interpolation: Interpolation::Bilinear,
            quality: 90,
        };
        let out = NativeResizer.resize(&bytes, &options).unwrap();
        let thumb = image::load_from_memory(&out).unwrap();
        assert_eq!(thumb.height(), 100);
        assert!(thumb.width() >= 1);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let options = ResizeOptions {
            target_height: 500,
            crop: false,
            extend: ExtendMode::WhiteFill,
            gravity: Gravity::Centre,
            interpolation: Interpolation::Bilinear,
            quality: 90,
        };
        let err = NativeResizer.resize(b"not an image", &options).unwrap_err();
        assert!(matches!(err, ResizeError::Decode(_)));
    }

    #[test]
    fn crop_is_rejected() {
        let bytes = sample_jpeg(10, 10);
        let options = ResizeOptions {
            target_height: 5,
            crop: true,
            extend: ExtendMode::WhiteFill,
            gravity: Gravity::Centre,
            interpolation: Interpolation::Bilinear,
            quality: 90,
        };
        let err = NativeResizer.resize(&bytes, &options).unwrap_err();
        assert!(matches!(err, ResizeError::Unsupported("crop")));
    }
}
