use std::path::Path;

use image::{ColorType, DynamicImage, ImageBuffer, Rgb, RgbImage};

use crate::error::{DataError, DataResult};

/// Decodes an image as 8-bit RGB. Sources deeper than 8 bits per channel
/// (16-bit TIFF exports) are rescaled linearly onto `0..=255`.
pub fn load_rgb8(path: &Path) -> DataResult<RgbImage> {
    if !path.exists() {
        return Err(DataError::MissingFile(path.to_path_buf()));
    }
    let img = image::open(path).map_err(|e| DataError::UnreadableImage {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(to_rgb8_rescaled(&img))
}

pub fn bits_per_channel(color: ColorType) -> u16 {
    let channels = u16::from(color.channel_count()).max(1);
    u16::from(color.bytes_per_pixel()) * 8 / channels
}

pub fn to_rgb8_rescaled(img: &DynamicImage) -> RgbImage {
    if bits_per_channel(img.color()) <= 8 {
        return img.to_rgb8();
    }
    let wide = img.to_rgb16();
    let (w, h) = wide.dimensions();
    ImageBuffer::from_fn(w, h, |x, y| {
        let p = wide.get_pixel(x, y);
        Rgb([rescale_u16(p[0]), rescale_u16(p[1]), rescale_u16(p[2])])
    })
}

// Truncating, matching a float `v / 65535 * 255` cast to u8.
fn rescale_u16(v: u16) -> u8 {
    (f32::from(v) / 65535.0 * 255.0) as u8
}
