use nalgebra::{Point3, Vector2, Vector3};

/// A single vertex in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    /// glTF convention: (0, 0) is the top-left corner of the image.
    pub texcoord: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, texcoord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }
}

/// Unit normal of the triangle (a, b, c) wound counter-clockwise.
///
/// Degenerate triangles yield +Y so lighting stays finite.
pub fn face_normal(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Vector3<f32> {
    (b - a)
        .cross(&(c - a))
        .try_normalize(1e-12)
        .unwrap_or_else(Vector3::y)
}

#[cfg(test)]
mod tests {
    use super::face_normal;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn ccw_triangle_in_xy_plane_faces_z() {
        let n = face_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(n, Vector3::z());
    }

    #[test]
    fn degenerate_triangle_falls_back_to_up() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert_eq!(face_normal(&p, &p, &p), Vector3::y());
    }
}
