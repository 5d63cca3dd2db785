pub mod thumbnail;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::Result;

pub use thumbnail::JpegThumbnailer;

/// A photo ready to be stored on a member.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Turns an uploaded image of any supported format into a bounded-size
/// thumbnail.
pub trait ThumbnailEncoder: Send + Sync {
    fn encode_thumbnail(&self, bytes: &[u8]) -> Result<EncodedImage>;
}

/// `data:` URI for embedding a stored JPEG thumbnail in a page.
pub fn jpeg_data_uri(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))
}
