use nalgebra::Vector3;

/// ACES filmic curve (Narkowicz fit), clamped to [0, 1].
pub fn aces_tone_mapping(color: Vector3<f32>) -> Vector3<f32> {
    color.map(|x| ((x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14)).clamp(0.0, 1.0))
}

pub fn linear_to_srgb(color: Vector3<f32>) -> Vector3<f32> {
    color.map(|x| x.max(0.0).powf(1.0 / 2.2))
}

pub fn srgb_to_linear(color: Vector3<f32>) -> Vector3<f32> {
    color.map(|x| x.max(0.0).powf(2.2))
}

/// `0xRRGGBB` -> linear RGB.
pub fn hex_to_linear(hex: u32) -> Vector3<f32> {
    srgb_to_linear(Vector3::new(
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ))
}

/// Quantizes a display-ready color to opaque RGBA8.
#[inline]
pub fn to_rgba8(color: Vector3<f32>) -> [u8; 4] {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
    [q(color.x), q(color.y), q(color.z), 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantizes_and_clamps_to_bytes() {
        assert_eq!(to_rgba8(Vector3::new(1.0, -0.5, 0.5)), [255, 0, 128, 255]);
    }

    #[test]
    fn hex_white_is_linear_white() {
        let white = hex_to_linear(0xFFFFFF);
        assert!((white - Vector3::new(1.0, 1.0, 1.0)).norm() < 1e-6);
    }
}
