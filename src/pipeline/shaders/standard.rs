use crate::core::geometry::Vertex;
use crate::core::pipeline::Shader;
use crate::pipeline::shaders::shadow::ShadowMap;
use crate::scene::light::Light;
use crate::scene::material::Material;
use nalgebra::{Matrix3, Matrix4, Point3, Vector2, Vector3, Vector4};
use std::f32::consts::PI;
use std::ops::{Add, Mul};

#[derive(Clone, Copy, Debug)]
pub struct StandardVarying {
    pub world_pos: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Add for StandardVarying {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            world_pos: self.world_pos + other.world_pos,
            normal: self.normal + other.normal,
            uv: self.uv + other.uv,
        }
    }
}

impl Mul<f32> for StandardVarying {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            world_pos: self.world_pos * scalar,
            normal: self.normal * scalar,
            uv: self.uv * scalar,
        }
    }
}

/// Metallic-roughness shading (Cook-Torrance) with ambient fill and an
/// optional shadow map for the shadow-casting directional light.
pub struct StandardShader<'a> {
    pub model_matrix: Matrix4<f32>,
    pub view_projection: Matrix4<f32>,
    pub normal_matrix: Matrix3<f32>,
    pub camera_pos: Point3<f32>,
    pub lights: &'a [Light],
    pub ambient: Vector3<f32>,
    pub shadow_map: Option<&'a ShadowMap>,
    pub fallback_material: Material,
}

impl<'a> StandardShader<'a> {
    pub fn new(
        model: Matrix4<f32>,
        view_projection: Matrix4<f32>,
        camera_pos: Point3<f32>,
        lights: &'a [Light],
        ambient: Vector3<f32>,
    ) -> Self {
        let model_3x3 = model.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = model_3x3.try_inverse().unwrap_or(model_3x3).transpose();
        Self {
            model_matrix: model,
            view_projection,
            normal_matrix,
            camera_pos,
            lights,
            ambient,
            shadow_map: None,
            fallback_material: Material::default(),
        }
    }

    pub fn with_shadow_map(mut self, shadow_map: Option<&'a ShadowMap>) -> Self {
        self.shadow_map = shadow_map;
        self
    }

    fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
        let a = roughness * roughness;
        let a2 = a * a;
        let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
        a2 / (PI * denom * denom).max(1e-4)
    }

    fn geometry_schlick_ggx(n_dot_x: f32, roughness: f32) -> f32 {
        let r = roughness + 1.0;
        let k = r * r / 8.0;
        n_dot_x / (n_dot_x * (1.0 - k) + k).max(1e-4)
    }

    fn fresnel_schlick(cos_theta: f32, f0: Vector3<f32>) -> Vector3<f32> {
        let f = (1.0 - cos_theta).clamp(0.0, 1.0).powi(5);
        f0 + (Vector3::new(1.0, 1.0, 1.0) - f0) * f
    }
}

impl Shader for StandardShader<'_> {
    type Varying = StandardVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, StandardVarying) {
        let world = self.model_matrix * vertex.position.to_homogeneous();
        let clip = self.view_projection * world;
        (
            clip,
            StandardVarying {
                world_pos: world.xyz(),
                normal: self.normal_matrix * vertex.normal,
                uv: vertex.texcoord,
            },
        )
    }

    fn fragment(&self, varying: StandardVarying, material: Option<&Material>) -> Vector3<f32> {
        let mat = material.unwrap_or(&self.fallback_material);
        let albedo = mat.albedo(varying.uv);
        let metallic = mat.metallic.clamp(0.0, 1.0);
        // Fully smooth surfaces blow up the GGX peak.
        let roughness = mat.roughness.clamp(0.04, 1.0);

        let world_pos = Point3::from(varying.world_pos);
        let v = (self.camera_pos - world_pos)
            .try_normalize(1e-9)
            .unwrap_or_else(Vector3::z);
        let mut n = varying.normal.try_normalize(1e-9).unwrap_or(v);
        // Back faces of double-sided surfaces light like front faces.
        if n.dot(&v) < 0.0 {
            n = -n;
        }

        let f0 = Vector3::new(0.04, 0.04, 0.04).lerp(&albedo, metallic);
        let n_dot_v = n.dot(&v).max(0.0);
        let mut lo = Vector3::zeros();

        for light in self.lights {
            let l = light.direction_to_light(&world_pos);
            let n_dot_l = n.dot(&l);
            if n_dot_l <= 0.0 {
                continue;
            }
            let h = (v + l).try_normalize(1e-9).unwrap_or(n);

            let shadow = match self.shadow_map {
                Some(map) if light.casts_shadow() => map.visibility(&world_pos, n_dot_l),
                _ => 1.0,
            };
            if shadow <= 0.0 {
                continue;
            }

            let d = Self::distribution_ggx(n.dot(&h).max(0.0), roughness);
            let g = Self::geometry_schlick_ggx(n_dot_v, roughness)
                * Self::geometry_schlick_ggx(n_dot_l, roughness);
            let f = Self::fresnel_schlick(h.dot(&v).max(0.0), f0);

            let specular = f * (d * g / (4.0 * n_dot_v * n_dot_l + 1e-4));
            let k_d = (Vector3::new(1.0, 1.0, 1.0) - f) * (1.0 - metallic);
            let brdf = k_d.component_mul(&albedo) / PI + specular;

            // Light intensities are in display units, so undo the 1/PI.
            lo += brdf.component_mul(&light.radiance(&world_pos)) * (n_dot_l * shadow * PI);
        }

        self.ambient.component_mul(&albedo) + lo + mat.emissive
    }
}
