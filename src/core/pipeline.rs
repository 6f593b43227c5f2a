use crate::core::geometry::Vertex;
use crate::scene::material::Material;
use nalgebra::{Vector3, Vector4};
use std::ops::{Add, Mul};

/// Per-vertex data that can be blended across a triangle.
///
/// `a * wa + b * wb + c * wc` must be meaningful for barycentric weights,
/// and the value is shared between rasterizer threads.
pub trait Interpolatable:
    Copy + Clone + Add<Output = Self> + Mul<f32, Output = Self> + Send + Sync
{
}

impl<T> Interpolatable for T where
    T: Copy + Clone + Add<Output = T> + Mul<f32, Output = T> + Send + Sync
{
}

/// Programmable stages of the pipeline.
///
/// Shaders are invoked concurrently from the rasterizer's worker bands, so
/// they must be `Send + Sync` and free of interior mutation.
pub trait Shader: Send + Sync {
    type Varying: Interpolatable;

    /// Transforms a vertex into homogeneous clip space and returns the
    /// varying to interpolate across the primitive.
    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying);

    /// Linear RGB color of one fragment.
    fn fragment(&self, varying: Self::Varying, material: Option<&Material>) -> Vector3<f32>;
}
