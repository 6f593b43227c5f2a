use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};

/// Perspective camera looking at a target point.
///
/// View and projection matrices are cached and rebuilt whenever the
/// camera is moved or the viewport aspect changes.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov_y_rad: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,

    view_matrix: Matrix4<f32>,
    projection_matrix: Matrix4<f32>,
}

impl Camera {
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        fov_y_deg: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let mut cam = Self {
            position,
            target,
            up: Vector3::y(),
            fov_y_rad: fov_y_deg.to_radians(),
            aspect_ratio,
            near,
            far,
            view_matrix: Matrix4::identity(),
            projection_matrix: Matrix4::identity(),
        };
        cam.update_matrices();
        cam
    }

    pub fn look_from(&mut self, position: Point3<f32>, target: Point3<f32>) {
        self.position = position;
        self.target = target;
        self.update_matrices();
    }

    /// Returns true when the aspect actually changed.
    pub fn set_aspect(&mut self, aspect_ratio: f32) -> bool {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return false;
        }
        if (self.aspect_ratio - aspect_ratio).abs() < 1e-6 {
            return false;
        }
        self.aspect_ratio = aspect_ratio;
        self.update_matrices();
        true
    }

    pub fn update_matrices(&mut self) {
        self.view_matrix = TransformFactory::look_at(&self.position, &self.target, &self.up);
        self.projection_matrix =
            TransformFactory::perspective(self.aspect_ratio, self.fov_y_rad, self.near, self.far);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view_matrix
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix * self.view_matrix
    }
}
