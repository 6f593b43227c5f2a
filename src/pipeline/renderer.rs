use crate::core::framebuffer::FrameBuffer;
use crate::core::pipeline::Shader;
use crate::core::rasterizer::{CullMode, Rasterizer, ScreenTriangle};
use crate::scene::material::Material;
use crate::scene::mesh::Mesh;
use crate::scene::model::Model;
use nalgebra::Vector3;
use rayon::prelude::*;

/// Owns a framebuffer and drives the rasterizer over models.
pub struct Renderer {
    pub rasterizer: Rasterizer,
    pub framebuffer: FrameBuffer,
}

impl Renderer {
    /// `samples`: 1 for no AA, 2 for 2x2 SSAA, etc.
    pub fn new(width: usize, height: usize, samples: usize) -> Self {
        Self {
            rasterizer: Rasterizer::new(),
            framebuffer: FrameBuffer::new(width, height, samples),
        }
    }

    pub fn resize(&mut self, width: usize, height: usize, samples: usize) {
        self.framebuffer.resize(width, height, samples);
    }

    pub fn clear(&mut self, color: Vector3<f32>) {
        self.framebuffer.clear(color);
    }

    /// Draws every mesh of `model`; `shader` already carries the model matrix.
    pub fn draw_model<S: Shader>(&mut self, model: &Model, shader: &S) {
        for mesh in &model.meshes {
            self.draw_mesh(mesh, shader, model.material(mesh));
        }
    }

    pub fn draw_mesh<S: Shader>(&mut self, mesh: &Mesh, shader: &S, material: Option<&Material>) {
        let double_sided = material.is_some_and(|m| m.double_sided);
        self.rasterizer.set_cull_mode(if double_sided {
            CullMode::None
        } else {
            CullMode::Back
        });
        let triangles = self.assemble(mesh, shader);
        self.rasterizer
            .draw(&mut self.framebuffer, shader, &triangles, material);
    }

    /// Depth only, both faces, for shadow maps.
    pub fn draw_model_depth<S: Shader>(&mut self, model: &Model, shader: &S) {
        self.rasterizer.set_cull_mode(CullMode::None);
        for mesh in &model.meshes {
            let triangles = self.assemble(mesh, shader);
            self.rasterizer.draw_depth(&mut self.framebuffer, &triangles);
        }
    }

    /// Vertex stage and primitive assembly, parallel over triangles.
    /// Submission order is preserved.
    fn assemble<S: Shader>(&self, mesh: &Mesh, shader: &S) -> Vec<ScreenTriangle<S::Varying>> {
        let target = (
            self.framebuffer.buffer_width,
            self.framebuffer.buffer_height,
        );
        let vertex_count = mesh.vertices.len();
        mesh.indices
            .par_chunks_exact(3)
            .fold(Vec::new, |mut out, tri| {
                let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
                if a < vertex_count && b < vertex_count && c < vertex_count {
                    self.rasterizer.setup(
                        shader,
                        [&mesh.vertices[a], &mesh.vertices[b], &mesh.vertices[c]],
                        target,
                        &mut out,
                    );
                }
                out
            })
            .reduce(Vec::new, |mut left, mut right| {
                left.append(&mut right);
                left
            })
    }
}

#[cfg(test)]
mod tests {
    use super::Renderer;
    use crate::pipeline::shaders::standard::StandardShader;
    use crate::scene::light::Light;
    use crate::scene::material::Material;
    use crate::scene::mesh::Mesh;
    use crate::scene::model::Model;
    use crate::scene::camera::Camera;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn cube_in_view_covers_the_center_pixel() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 5.0), Point3::origin(), 60.0, 1.0, 0.1, 100.0);
        let cube = Model::new(
            "cube",
            vec![Mesh::create_box(Point3::origin(), Vector3::new(2.0, 2.0, 2.0), Some(0))],
            vec![Material::solid(0xff0000, 0.0, 1.0)],
        );
        let lights = [Light::new_directional(Point3::new(0.0, 0.0, 10.0), 1.0, false)];
        let shader = StandardShader::new(
            cube.world_matrix(),
            camera.view_projection(),
            camera.position,
            &lights,
            Vector3::zeros(),
        );

        let mut renderer = Renderer::new(32, 32, 1);
        renderer.clear(Vector3::zeros());
        renderer.draw_model(&cube, &shader);

        let center = renderer.framebuffer.get_pixel(16, 16).unwrap_or_default();
        let corner = renderer.framebuffer.get_pixel(0, 0).unwrap_or_default();
        assert!(center.x > 0.5 && center.y < 0.05);
        assert_eq!(corner, Vector3::zeros());
    }
}
