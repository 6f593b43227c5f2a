use crate::scene::camera::Camera;
use nalgebra::{Point3, Vector2, Vector3};
use serde::Deserialize;
use std::f32::consts::{PI, TAU};

/// Keeps the polar angle strictly inside (0, PI) so the view never flips.
const POLAR_EPS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fraction of the remaining motion applied per 60 Hz frame.
    pub damping: f32,
    /// Turns per minute while auto-rotating.
    pub auto_rotate_speed: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 1.0,
            max_distance: 100.0,
            damping: 0.05,
            auto_rotate_speed: 0.5,
        }
    }
}

/// Orbit/pan/zoom camera navigation around a target point, with inertia.
///
/// Input methods only queue motion; `update` integrates it into the camera.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub settings: OrbitSettings,
    pub auto_rotate: bool,
    target: Point3<f32>,
    radius: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
    /// Angle from +Y.
    phi: f32,
    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vector3<f32>,
    zoom_scale: f32,
    home: (Point3<f32>, Point3<f32>),
}

impl OrbitControls {
    pub fn new(settings: OrbitSettings, position: Point3<f32>, target: Point3<f32>) -> Self {
        let mut controls = Self {
            settings,
            auto_rotate: false,
            target,
            radius: 1.0,
            theta: 0.0,
            phi: PI / 2.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vector3::zeros(),
            zoom_scale: 1.0,
            home: (position, target),
        };
        controls.set_from(position, target);
        controls
    }

    fn set_from(&mut self, position: Point3<f32>, target: Point3<f32>) {
        let offset = position - target;
        self.target = target;
        self.radius = offset
            .norm()
            .clamp(self.settings.min_distance, self.settings.max_distance);
        self.theta = offset.x.atan2(offset.z);
        self.phi = (offset.y / offset.norm().max(1e-6))
            .clamp(-1.0, 1.0)
            .acos()
            .clamp(POLAR_EPS, PI - POLAR_EPS);
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.pan_offset = Vector3::zeros();
        self.zoom_scale = 1.0;
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn polar_angle(&self) -> f32 {
        self.phi
    }

    pub fn position(&self) -> Point3<f32> {
        let sin_phi = self.phi.sin();
        self.target
            + Vector3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            )
    }

    /// Drag in pixels; a full viewport height turns the camera once around.
    pub fn rotate(&mut self, drag: Vector2<f32>, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.delta_theta -= TAU * drag.x / h * self.settings.rotate_speed;
        self.delta_phi -= TAU * drag.y / h * self.settings.rotate_speed;
    }

    /// Drag in pixels; the target follows the cursor at the target's depth.
    pub fn pan(&mut self, drag: Vector2<f32>, viewport_height: f32, camera: &Camera) {
        let h = viewport_height.max(1.0);
        let world_per_px = 2.0 * self.radius * (camera.fov_y_rad * 0.5).tan() / h;
        let forward = (self.target - self.position()).normalize();
        let right = forward.cross(&Vector3::y()).try_normalize(1e-6).unwrap_or_else(Vector3::x);
        let up = right.cross(&forward);
        self.pan_offset +=
            (right * -drag.x + up * drag.y) * world_per_px * self.settings.pan_speed;
    }

    /// Scroll in points; positive values move the camera closer.
    pub fn zoom(&mut self, scroll: f32) {
        if scroll != 0.0 {
            let factor = 0.95_f32.powf(scroll / 50.0 * self.settings.zoom_speed);
            self.zoom_scale = (self.zoom_scale * factor).clamp(1e-3, 1e3);
        }
    }

    pub fn reset(&mut self) {
        let (position, target) = self.home;
        self.set_from(position, target);
    }

    /// True while inertia is still moving the camera.
    pub fn is_moving(&self) -> bool {
        self.auto_rotate
            || self.delta_theta.abs() > 1e-5
            || self.delta_phi.abs() > 1e-5
            || self.pan_offset.norm() > 1e-5
            || (self.zoom_scale - 1.0).abs() > 1e-6
    }

    /// Integrates queued motion over `dt` seconds and moves `camera`.
    /// Returns true when the camera actually changed.
    pub fn update(&mut self, dt: f32, camera: &mut Camera) -> bool {
        if self.auto_rotate {
            self.theta -= TAU / 60.0 * self.settings.auto_rotate_speed * dt;
        }

        let d = self.settings.damping.clamp(0.0, 1.0);
        // Fraction applied this frame, normalized to 60 Hz.
        let k = if d > 0.0 && d < 1.0 {
            1.0 - (1.0 - d).powf((dt * 60.0).max(0.0))
        } else {
            1.0
        };

        self.theta += self.delta_theta * k;
        self.phi = (self.phi + self.delta_phi * k).clamp(POLAR_EPS, PI - POLAR_EPS);
        self.target += self.pan_offset * k;
        self.delta_theta *= 1.0 - k;
        self.delta_phi *= 1.0 - k;
        self.pan_offset *= 1.0 - k;

        self.radius = (self.radius * self.zoom_scale)
            .clamp(self.settings.min_distance, self.settings.max_distance);
        self.zoom_scale = 1.0;

        let position = self.position();
        let moved = (position - camera.position).norm() > 1e-6
            || (self.target - camera.target).norm() > 1e-6;
        if moved {
            camera.look_from(position, self.target);
        }
        moved
    }
}
