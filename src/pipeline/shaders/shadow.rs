use crate::core::geometry::Vertex;
use crate::core::pipeline::Shader;
use crate::scene::material::Material;
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Depth-only pass from the shadow-casting light.
pub struct ShadowShader {
    pub mvp_matrix: Matrix4<f32>,
}

impl ShadowShader {
    pub fn new(model: Matrix4<f32>, light_space: Matrix4<f32>) -> Self {
        Self {
            mvp_matrix: light_space * model,
        }
    }
}

impl Shader for ShadowShader {
    // Nothing to interpolate; depth comes from the clip position.
    type Varying = f32;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, f32) {
        (self.mvp_matrix * vertex.position.to_homogeneous(), 0.0)
    }

    fn fragment(&self, _: f32, _: Option<&Material>) -> Vector3<f32> {
        Vector3::zeros()
    }
}

/// Depth map rendered from a directional light, with the matrix that
/// produced it.
#[derive(Debug, Clone)]
pub struct ShadowMap {
    pub size: usize,
    pub depth: Vec<f32>,
    pub light_space: Matrix4<f32>,
    pub bias: f32,
    /// PCF radius in texels; 0 disables filtering.
    pub pcf_kernel: i32,
}

impl ShadowMap {
    /// Fraction of light reaching `world_pos`, in [0, 1].
    pub fn visibility(&self, world_pos: &Point3<f32>, n_dot_l: f32) -> f32 {
        if self.size == 0 || self.depth.len() < self.size * self.size {
            return 1.0;
        }
        let p = self.light_space * world_pos.to_homogeneous();
        if p.w.abs() < 1e-9 {
            return 1.0;
        }
        let ndc = p.xyz() / p.w;
        let u = ndc.x * 0.5 + 0.5;
        let v = 0.5 - ndc.y * 0.5;
        let current = ndc.z * 0.5 + 0.5;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) || current > 1.0 {
            return 1.0;
        }

        // Steeper surfaces need more bias to avoid acne.
        let bias = self.bias.max(0.01 * (1.0 - n_dot_l));
        let last = (self.size - 1) as f32;
        let cx = (u * last).round() as i32;
        let cy = (v * last).round() as i32;
        let k = self.pcf_kernel.max(0);

        let mut lit = 0.0;
        for dy in -k..=k {
            for dx in -k..=k {
                let x = (cx + dx).clamp(0, last as i32) as usize;
                let y = (cy + dy).clamp(0, last as i32) as usize;
                if current - bias <= self.depth[y * self.size + x] {
                    lit += 1.0;
                }
            }
        }
        lit / ((2 * k + 1) * (2 * k + 1)) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::ShadowMap;
    use nalgebra::{Matrix4, Point3};

    fn map(depth: f32) -> ShadowMap {
        ShadowMap {
            size: 4,
            depth: vec![depth; 16],
            light_space: Matrix4::identity(),
            bias: 0.001,
            pcf_kernel: 1,
        }
    }

    #[test]
    fn occluded_point_is_dark() {
        // z = 0.5 maps to depth 0.75, behind the stored 0.2.
        let v = map(0.2).visibility(&Point3::new(0.0, 0.0, 0.5), 1.0);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn unoccluded_point_is_lit() {
        let v = map(1.0).visibility(&Point3::new(0.0, 0.0, 0.5), 1.0);
        assert_eq!(v, 1.0);
    }

    #[test]
    fn points_outside_the_map_are_lit() {
        let v = map(0.0).visibility(&Point3::new(3.0, 0.0, 0.0), 1.0);
        assert_eq!(v, 1.0);
    }
}
