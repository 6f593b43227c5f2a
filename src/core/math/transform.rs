use nalgebra::{Matrix4, Point2, Point3, UnitQuaternion, Vector3, Vector4};

/// Builds the right-handed matrices used by the viewer.
///
/// Camera space looks down -Z, clip space follows the OpenGL convention
/// (NDC depth in [-1, 1]).
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    pub fn translation(t: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, t.x,
            0.0, 1.0, 0.0, t.y,
            0.0, 0.0, 1.0, t.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn scaling(s: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            s.x, 0.0, 0.0, 0.0,
            0.0, s.y, 0.0, 0.0,
            0.0, 0.0, s.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotation_y(angle_rad: f32) -> Matrix4<f32> {
        let (s, c) = angle_rad.sin_cos();
        Matrix4::new(
             c,  0.0, s,   0.0,
             0.0, 1.0, 0.0, 0.0,
            -s,  0.0, c,   0.0,
             0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Translation * Rotation * Scale, the order scene nodes compose in.
    pub fn trs(
        translation: &Vector3<f32>,
        rotation: &UnitQuaternion<f32>,
        scale: &Vector3<f32>,
    ) -> Matrix4<f32> {
        Self::translation(translation) * rotation.to_homogeneous() * Self::scaling(scale)
    }

    /// World -> view transform for an eye looking at `target`.
    pub fn look_at(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        let back = (eye - target).normalize();
        let right = up.cross(&back).normalize();
        let true_up = back.cross(&right);

        let rotation = Matrix4::new(
            right.x,   right.y,   right.z,   0.0,
            true_up.x, true_up.y, true_up.z, 0.0,
            back.x,    back.y,    back.z,    0.0,
            0.0,       0.0,       0.0,       1.0,
        );
        rotation * Self::translation(&-eye.coords)
    }

    pub fn perspective(aspect: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        let f = 1.0 / (fov_y_rad * 0.5).tan();
        let range_inv = 1.0 / (near - far);
        Matrix4::new(
            f / aspect, 0.0, 0.0,                      0.0,
            0.0,        f,   0.0,                      0.0,
            0.0,        0.0, (far + near) * range_inv, 2.0 * far * near * range_inv,
            0.0,        0.0, -1.0,                     0.0,
        )
    }

    pub fn orthographic(half_width: f32, half_height: f32, near: f32, far: f32) -> Matrix4<f32> {
        let range_inv = 1.0 / (near - far);
        Matrix4::new(
            1.0 / half_width, 0.0,               0.0,             0.0,
            0.0,              1.0 / half_height, 0.0,             0.0,
            0.0,              0.0,               2.0 * range_inv, (far + near) * range_inv,
            0.0,              0.0,               0.0,             1.0,
        )
    }
}

/// Clip space -> screen pixels. Screen Y grows downward.
#[inline]
pub fn clip_to_screen(clip: &Vector4<f32>, width: f32, height: f32) -> Point2<f32> {
    let inv_w = 1.0 / clip.w;
    Point2::new(
        (clip.x * inv_w + 1.0) * 0.5 * width,
        (1.0 - clip.y * inv_w) * 0.5 * height,
    )
}

#[cfg(test)]
mod tests {
    use super::{TransformFactory, clip_to_screen};
    use nalgebra::{Point3, UnitQuaternion, Vector3, Vector4};

    #[test]
    fn trs_scales_before_translating() {
        let m = TransformFactory::trs(
            &Vector3::new(1.0, 0.0, 0.0),
            &UnitQuaternion::identity(),
            &Vector3::new(2.0, 2.0, 2.0),
        );
        let p = m.transform_point(&Point3::new(1.0, 1.0, 0.0));
        assert_eq!(p, Point3::new(3.0, 2.0, 0.0));
    }

    #[test]
    fn look_at_moves_target_onto_negative_z() {
        let view = TransformFactory::look_at(
            &Point3::new(0.0, 0.0, 5.0),
            &Point3::origin(),
            &Vector3::y(),
        );
        let p = view.transform_point(&Point3::origin());
        assert!((p.z + 5.0).abs() < 1e-5);
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
    }

    #[test]
    fn clip_center_maps_to_screen_center() {
        let p = clip_to_screen(&Vector4::new(0.0, 0.0, 0.5, 1.0), 200.0, 100.0);
        assert_eq!((p.x, p.y), (100.0, 50.0));
    }
}
