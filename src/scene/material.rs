use crate::core::color::hex_to_linear;
use crate::scene::texture::Texture;
use nalgebra::{Vector2, Vector3};
use std::sync::Arc;

/// Metallic-roughness surface description.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: Option<String>,
    /// Linear base color factor.
    pub base_color: Vector3<f32>,
    pub base_color_texture: Option<Arc<Texture>>,
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: Vector3<f32>,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: Vector3::new(1.0, 1.0, 1.0),
            base_color_texture: None,
            metallic: 0.0,
            roughness: 1.0,
            emissive: Vector3::zeros(),
            double_sided: false,
        }
    }
}

impl Material {
    /// Untextured material from a `0xRRGGBB` sRGB color.
    pub fn solid(hex: u32, metallic: f32, roughness: f32) -> Self {
        Self {
            base_color: hex_to_linear(hex),
            metallic,
            roughness,
            ..Default::default()
        }
    }

    /// Base color factor times the texture sample, if any.
    #[inline]
    pub fn albedo(&self, uv: Vector2<f32>) -> Vector3<f32> {
        match &self.base_color_texture {
            Some(tex) => self.base_color.component_mul(&tex.sample(uv)),
            None => self.base_color,
        }
    }
}
