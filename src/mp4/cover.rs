// Cover art decoding
//
// The crate does not ship an image codec. Callers that want decoded artwork
// plug one in through `ImageCodec`; the raw `covr` bytes are kept either way.

use crate::error::ImageError;

/// A decoded image. The pixel layout is whatever the codec produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Image decoding capability supplied by the caller.
pub trait ImageCodec {
    /// Width and height of the encoded image, without decoding pixels.
    fn decode_bounds(&self, data: &[u8]) -> Result<(u32, u32), ImageError>;

    /// Decode keeping every `sample_size`-th pixel in each direction.
    fn decode(&self, data: &[u8], sample_size: u32) -> Result<Bitmap, ImageError>;

    /// Resample `image` to exactly `width` x `height`.
    fn scale(&self, image: &Bitmap, width: u32, height: u32) -> Result<Bitmap, ImageError>;
}

/// Smallest power-of-two subsampling that brings the longer edge to `max_size`.
pub fn sample_size_for(width: u32, height: u32, max_size: u32) -> u32 {
    let mut sample_size = 1;
    if width > max_size || height > max_size {
        let mut size = width.max(height);
        while size > max_size {
            sample_size *= 2;
            size /= 2;
        }
    }
    sample_size
}

/// Decode `data` into a bounded cover and its thumbnail.
pub fn decode_cover(
    codec: &dyn ImageCodec,
    data: &[u8],
    max_size: u32,
    thumbnail_size: u32,
) -> Result<(Bitmap, Bitmap), ImageError> {
    let (width, height) = codec.decode_bounds(data)?;
    let sample_size = sample_size_for(width, height, max_size);
    let cover = codec.decode(data, sample_size)?;

    let scale = cover.width.max(cover.height) as f32 / thumbnail_size as f32;
    let small = if scale > 0.0 {
        let w = (cover.width as f32 / scale) as u32;
        let h = (cover.height as f32 / scale) as u32;
        match codec.scale(&cover, w, h) {
            Ok(small) => small,
            Err(e) => {
                log::debug!("cover thumbnail failed, using full cover: {}", e);
                cover.clone()
            }
        }
    } else {
        cover.clone()
    };

    Ok((cover, small))
}
