use crate::core::geometry::Vertex;
use crate::core::math::bounds::Aabb;
use nalgebra::{Point3, Vector2, Vector3};

/// Indexed triangle list with a single material.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub vertices: Vec<Vertex>,
    /// Three indices per triangle.
    pub indices: Vec<u32>,
    /// Index into the owning model's material list.
    pub material_id: Option<usize>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, material_id: Option<usize>) -> Self {
        Self {
            name: None,
            vertices,
            indices,
            material_id,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Model-space bounds of the vertices.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }

    /// Axis-aligned box centered on `center`, counter-clockwise faces pointing out.
    pub fn create_box(center: Point3<f32>, size: Vector3<f32>, material_id: Option<usize>) -> Self {
        let h = size * 0.5;
        // (normal, u axis, v axis) per face; corners = n +- u +- v
        let faces = [
            (Vector3::x(), -Vector3::z(), Vector3::y()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
            (Vector3::y(), Vector3::x(), -Vector3::z()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), -Vector3::x(), Vector3::y()),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (n, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let offset = (n + u * su + v * sv).component_mul(&h);
                vertices.push(Vertex::new(
                    center + offset,
                    n,
                    Vector2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5),
                ));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices, material_id)
    }

    /// Square on the XZ plane at height `y`, facing +Y.
    pub fn create_plane(size: f32, y: f32, material_id: Option<usize>) -> Self {
        let h = size * 0.5;
        let corners = [(-h, h), (h, h), (h, -h), (-h, -h)];
        let vertices = corners
            .iter()
            .map(|&(x, z)| {
                Vertex::new(
                    Point3::new(x, y, z),
                    Vector3::y(),
                    Vector2::new(x / size + 0.5, z / size + 0.5),
                )
            })
            .collect();
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3], material_id)
    }
}
