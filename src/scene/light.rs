use nalgebra::{Point3, Vector3};

/// (constant, linear, quadratic) falloff for point lights.
pub const POINT_ATTENUATION: (f32, f32, f32) = (1.0, 0.0, 0.01);

/// A light source in the stage.
#[derive(Debug, Clone)]
pub enum Light {
    /// Parallel rays shining from `position` towards the origin.
    Directional {
        position: Point3<f32>,
        color: Vector3<f32>,
        intensity: f32,
        cast_shadow: bool,
    },
    Point {
        position: Point3<f32>,
        color: Vector3<f32>,
        intensity: f32,
        /// (constant, linear, quadratic)
        attenuation: (f32, f32, f32),
    },
}

impl Light {
    pub fn new_directional(position: Point3<f32>, intensity: f32, cast_shadow: bool) -> Self {
        Self::Directional {
            position,
            color: Vector3::new(1.0, 1.0, 1.0),
            intensity,
            cast_shadow,
        }
    }

    pub fn new_point(position: Point3<f32>, intensity: f32) -> Self {
        Self::Point {
            position,
            color: Vector3::new(1.0, 1.0, 1.0),
            intensity,
            attenuation: POINT_ATTENUATION,
        }
    }

    /// Unit vector from `surface_point` towards the light.
    pub fn direction_to_light(&self, surface_point: &Point3<f32>) -> Vector3<f32> {
        let to_light = match self {
            Light::Directional { position, .. } => position.coords,
            Light::Point { position, .. } => position - surface_point,
        };
        to_light.try_normalize(1e-12).unwrap_or_else(Vector3::y)
    }

    /// Radiance arriving at `surface_point`, attenuated for point lights.
    pub fn radiance(&self, surface_point: &Point3<f32>) -> Vector3<f32> {
        match self {
            Light::Directional {
                color, intensity, ..
            } => color * *intensity,
            Light::Point {
                position,
                color,
                intensity,
                attenuation: (c, l, q),
            } => {
                let d = (position - surface_point).norm();
                color * (*intensity / (c + l * d + q * d * d).max(1e-4))
            }
        }
    }

    pub fn casts_shadow(&self) -> bool {
        matches!(self, Light::Directional { cast_shadow: true, .. })
    }
}
