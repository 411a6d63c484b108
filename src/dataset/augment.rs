use image::RgbImage;
use image::imageops::{self, FilterType};
use rand::Rng;

use crate::config::AugParams;

/// Applies one draw of `params` to `img` and resizes to the output shape.
pub fn augment<R: Rng + ?Sized>(img: RgbImage, params: &AugParams, rng: &mut R) -> RgbImage {
    let mut img = img;

    if params.rotation {
        img = match rng.gen_range(0..4u8) {
            1 => imageops::rotate90(&img),
            2 => imageops::rotate180(&img),
            3 => imageops::rotate270(&img),
            _ => img,
        };
    }
    if params.flip && rng.gen::<f32>() < params.flip_prob {
        imageops::flip_horizontal_in_place(&mut img);
    }

    let mut img = resize_to(img, params);

    if params.brightness {
        let factor = draw(rng, params.brightness_range);
        scale_brightness(&mut img, factor);
    }
    if params.contrast {
        let factor = draw(rng, params.contrast_range);
        scale_contrast(&mut img, factor);
    }
    img
}

pub fn resize_to(img: RgbImage, params: &AugParams) -> RgbImage {
    let [out_h, out_w] = params.output_shape;
    let (w, h) = img.dimensions();
    if (w, h) == (out_w, out_h) {
        return img;
    }
    if w == 0 || h == 0 {
        return RgbImage::new(out_w, out_h);
    }
    if !params.keep_aspect_ratio {
        return imageops::resize(&img, out_w, out_h, FilterType::Triangle);
    }

    let scale = (out_w as f32 / w as f32).min(out_h as f32 / h as f32);
    let new_w = ((w as f32 * scale).round() as u32).clamp(1, out_w);
    let new_h = ((h as f32 * scale).round() as u32).clamp(1, out_h);
    let resized = imageops::resize(&img, new_w, new_h, FilterType::Triangle);

    let mut canvas = RgbImage::new(out_w, out_h);
    let x = i64::from((out_w - new_w) / 2);
    let y = i64::from((out_h - new_h) / 2);
    imageops::replace(&mut canvas, &resized, x, y);
    canvas
}

fn draw<R: Rng + ?Sized>(rng: &mut R, range: [f32; 2]) -> f32 {
    if range[0] >= range[1] {
        return range[0];
    }
    rng.gen_range(range[0]..range[1])
}

fn scale_brightness(img: &mut RgbImage, factor: f32) {
    for p in img.pixels_mut() {
        for v in p.0.iter_mut() {
            *v = clamp_u8(f32::from(*v) * factor);
        }
    }
}

fn scale_contrast(img: &mut RgbImage, factor: f32) {
    let n = (img.width() as usize * img.height() as usize * 3).max(1);
    let mean = img.as_raw().iter().map(|&v| f32::from(v)).sum::<f32>() / n as f32;
    for p in img.pixels_mut() {
        for v in p.0.iter_mut() {
            *v = clamp_u8((f32::from(*v) - mean) * factor + mean);
        }
    }
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
