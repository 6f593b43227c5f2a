use crate::core::math::bounds::Aabb;
use crate::core::math::transform::TransformFactory;
use crate::scene::material::Material;
use crate::scene::mesh::Mesh;
use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use rayon::prelude::*;

/// Position, rotation and scale of a model's root node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootTransform {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for RootTransform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl RootTransform {
    pub fn matrix(&self) -> Matrix4<f32> {
        TransformFactory::trs(&self.position, &self.rotation, &self.scale)
    }
}

/// Counts shown next to the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelStats {
    pub meshes: usize,
    pub triangles: usize,
    pub vertices: usize,
    pub materials: usize,
    pub textures: usize,
}

/// A decoded asset: meshes baked into model space, their materials, and the
/// root transform the viewer is free to adjust.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub root: RootTransform,
}

impl Model {
    pub fn new(name: impl Into<String>, meshes: Vec<Mesh>, materials: Vec<Material>) -> Self {
        Self {
            name: name.into(),
            meshes,
            materials,
            root: RootTransform::default(),
        }
    }

    pub fn world_matrix(&self) -> Matrix4<f32> {
        self.root.matrix()
    }

    pub fn material(&self, mesh: &Mesh) -> Option<&Material> {
        mesh.material_id.and_then(|id| self.materials.get(id))
    }

    /// Exact world-space bounds of every vertex under the root transform.
    pub fn world_bounds(&self) -> Aabb {
        let world = self.world_matrix();
        self.meshes
            .par_iter()
            .map(|mesh| {
                let mut bounds = Aabb::empty();
                for v in &mesh.vertices {
                    bounds.expand(&world.transform_point(&v.position));
                }
                bounds
            })
            .reduce(Aabb::empty, |a, b| a.union(&b))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            meshes: self.meshes.len(),
            triangles: self.triangle_count(),
            vertices: self.meshes.iter().map(|m| m.vertices.len()).sum(),
            materials: self.materials.len(),
            textures: self
                .materials
                .iter()
                .filter(|m| m.base_color_texture.is_some())
                .count(),
        }
    }
}
