use crate::core::color::{aces_tone_mapping, linear_to_srgb, to_rgba8};
use crate::core::framebuffer::FrameBuffer;
use crate::core::math::transform::TransformFactory;
use crate::io::config::RenderConfig;
use crate::pipeline::renderer::Renderer;
use crate::pipeline::shaders::shadow::{ShadowMap, ShadowShader};
use crate::pipeline::shaders::standard::StandardShader;
use crate::scene::light::Light;
use crate::scene::stage::Stage;
use image::RgbaImage;
use log::debug;
use nalgebra::{Matrix4, Point3, Vector3};
use rayon::prelude::*;

/// Light-space matrix for the first shadow-casting directional light.
pub fn light_space_matrix(stage: &Stage, settings: &RenderConfig) -> Option<Matrix4<f32>> {
    let light_pos = stage.lights.iter().find_map(|light| match light {
        Light::Directional {
            position,
            cast_shadow: true,
            ..
        } => Some(*position),
        _ => None,
    })?;

    let target = Point3::origin();
    let dir = (target - light_pos).try_normalize(1e-6)?;
    let up = if dir.y.abs() > 0.9 {
        Vector3::z()
    } else {
        Vector3::y()
    };
    let view = TransformFactory::look_at(&light_pos, &target, &up);
    let ortho = settings.shadow_ortho_size.max(0.1);
    let distance = (light_pos - target).norm();
    let projection = TransformFactory::orthographic(ortho, ortho, 0.1, distance + ortho * 2.0);
    Some(projection * view)
}

/// Renders the content's depth from the shadow-casting light.
///
/// The ground only receives shadows, so it is left out of the map.
pub fn render_shadow_pass(
    stage: &Stage,
    settings: &RenderConfig,
    shadow_renderer: &mut Renderer,
) -> Option<ShadowMap> {
    let light_space = light_space_matrix(stage, settings)?;
    let size = settings.shadow_map_size.max(16);
    shadow_renderer.resize(size, size, 1);
    shadow_renderer.clear(Vector3::zeros());

    let content = stage.content_model();
    let shader = ShadowShader::new(content.world_matrix(), light_space);
    shadow_renderer.draw_model_depth(content, &shader);
    debug!("Shadow pass: {}x{} for '{}'", size, size, content.name);

    Some(ShadowMap {
        size,
        depth: shadow_renderer.framebuffer.depth().to_vec(),
        light_space,
        bias: settings.shadow_bias,
        pcf_kernel: settings.pcf_kernel_size,
    })
}

pub fn render_main_pass(stage: &Stage, renderer: &mut Renderer, shadow_map: Option<&ShadowMap>) {
    renderer.clear(stage.background);
    let view_projection = stage.camera.view_projection();

    for model in stage.drawables() {
        let shader = StandardShader::new(
            model.world_matrix(),
            view_projection,
            stage.camera.position,
            &stage.lights,
            stage.ambient,
        )
        .with_shadow_map(shadow_map);
        renderer.draw_model(model, &shader);
    }
}

/// Exposure -> optional ACES -> gamma, averaged over SSAA samples.
pub fn resolve(framebuffer: &FrameBuffer, settings: &RenderConfig) -> RgbaImage {
    let (width, height) = (framebuffer.width, framebuffer.height);
    let mut pixels = vec![0u8; width * height * 4];
    if width > 0 {
        pixels
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let color = framebuffer.get_pixel(x, y).unwrap_or_else(Vector3::zeros);
                    let exposed = color * settings.exposure;
                    let mapped = if settings.use_aces {
                        aces_tone_mapping(exposed)
                    } else {
                        exposed
                    };
                    px.copy_from_slice(&to_rgba8(linear_to_srgb(mapped)));
                }
            });
    }
    RgbaImage::from_raw(width as u32, height as u32, pixels)
        .unwrap_or_else(|| RgbaImage::new(width as u32, height as u32))
}

#[cfg(test)]
mod tests {
    use super::light_space_matrix;
    use crate::io::config::{Config, RenderConfig};
    use crate::scene::stage::Stage;
    use nalgebra::Point3;

    #[test]
    fn origin_projects_inside_the_shadow_frustum() {
        let stage = Stage::new(&Config::default());
        let m = light_space_matrix(&stage, &RenderConfig::default()).expect("shadow light");
        let p = m.transform_point(&Point3::origin());
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4);
        assert!(p.z > -1.0 && p.z < 1.0);
    }

    #[test]
    fn no_shadow_light_means_no_matrix() {
        let mut config = Config::default();
        config.lights.iter_mut().for_each(|l| l.cast_shadow = false);
        let stage = Stage::new(&config);
        assert!(light_space_matrix(&stage, &config.render).is_none());
    }
}
