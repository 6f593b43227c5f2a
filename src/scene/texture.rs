use crate::core::color::srgb_to_linear;
use image::{RgbaImage, imageops::FilterType};
use log::debug;
use nalgebra::{Vector2, Vector3};
use std::sync::Arc;

/// An sRGB color texture sampled with repeat wrapping.
#[derive(Debug, Clone)]
pub struct Texture {
    pub image: Arc<RgbaImage>,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image: Arc::new(image),
            width,
            height,
        }
    }

    /// Downscales so neither side exceeds `max_size`, preserving aspect ratio.
    /// Images already within the limit are returned untouched.
    pub fn fit_within(image: RgbaImage, max_size: u32) -> RgbaImage {
        let (w, h) = image.dimensions();
        if max_size == 0 || (w <= max_size && h <= max_size) {
            return image;
        }
        let ratio = max_size as f32 / w.max(h) as f32;
        let nw = ((w as f32 * ratio).round() as u32).clamp(1, max_size);
        let nh = ((h as f32 * ratio).round() as u32).clamp(1, max_size);
        debug!("Downscaling texture {}x{} -> {}x{}", w, h, nw, nh);
        image::imageops::resize(&image, nw, nh, FilterType::Triangle)
    }

    /// Bilinear sample in linear RGB.
    pub fn sample(&self, uv: Vector2<f32>) -> Vector3<f32> {
        if self.width == 0 || self.height == 0 {
            return Vector3::new(1.0, 1.0, 1.0);
        }
        let u = uv.x - uv.x.floor();
        let v = uv.y - uv.y.floor();

        // Pixel centers sit at +0.5.
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;
        let x0 = x.floor() as i32;
        let y0 = y.floor() as i32;
        let wx = x - x0 as f32;
        let wy = y - y0 as f32;

        let top = self.texel(x0, y0) * (1.0 - wx) + self.texel(x0 + 1, y0) * wx;
        let bottom = self.texel(x0, y0 + 1) * (1.0 - wx) + self.texel(x0 + 1, y0 + 1) * wx;
        srgb_to_linear(top * (1.0 - wy) + bottom * wy)
    }

    fn texel(&self, x: i32, y: i32) -> Vector3<f32> {
        let xw = x.rem_euclid(self.width as i32) as u32;
        let yw = y.rem_euclid(self.height as i32) as u32;
        let p = self.image.get_pixel(xw, yw);
        Vector3::new(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0
    }
}

#[cfg(test)]
mod tests {
    use super::Texture;
    use image::{Rgba, RgbaImage};
    use nalgebra::Vector2;

    #[test]
    fn oversized_image_keeps_aspect_ratio() {
        let img = RgbaImage::new(4096, 1024);
        let fitted = Texture::fit_within(img, 2048);
        assert_eq!(fitted.dimensions(), (2048, 512));
    }

    #[test]
    fn small_image_is_untouched() {
        let img = RgbaImage::new(300, 200);
        assert_eq!(Texture::fit_within(img, 2048).dimensions(), (300, 200));
    }

    #[test]
    fn uniform_texture_samples_its_color() {
        let tex = Texture::from_rgba(RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])));
        let c = tex.sample(Vector2::new(1.37, -0.2));
        assert!((c.x - 1.0).abs() < 1e-5);
    }
}
