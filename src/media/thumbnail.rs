use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, GenericImageView};

use crate::{
    config::PhotoConfig,
    error::{AppError, Result},
};
use super::{EncodedImage, ThumbnailEncoder};

/// Downscales to fit a square and re-encodes as RGB JPEG. Images already
/// inside the bounds are re-encoded at their original size.
pub struct JpegThumbnailer {
    max_dimension: u32,
    quality: u8,
}

impl JpegThumbnailer {
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &PhotoConfig) -> Self {
        Self::new(config.max_dimension, config.jpeg_quality)
    }
}

impl ThumbnailEncoder for JpegThumbnailer {
    fn encode_thumbnail(&self, bytes: &[u8]) -> Result<EncodedImage> {
        if bytes.is_empty() {
            return Err(AppError::ImageProcessing("Empty image upload".to_string()));
        }

        let image = image::load_from_memory(bytes)
            .map_err(|e| AppError::ImageProcessing(e.to_string()))?;

        let (width, height) = image.dimensions();
        let image = if width > self.max_dimension || height > self.max_dimension {
            image.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
        } else {
            image
        };

        let rgb = image.to_rgb8();
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.quality)
            .encode_image(&rgb)
            .map_err(|e| AppError::ImageProcessing(e.to_string()))?;

        Ok(EncodedImage {
            width: rgb.width(),
            height: rgb.height(),
            bytes: encoded,
        })
    }
}
