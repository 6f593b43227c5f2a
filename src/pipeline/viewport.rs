use crate::io::config::RenderConfig;
use crate::pipeline::passes::{render_main_pass, render_shadow_pass, resolve};
use crate::pipeline::renderer::Renderer;
use crate::pipeline::shaders::shadow::ShadowMap;
use crate::scene::stage::Stage;
use image::RgbaImage;
use log::{debug, info};
use nalgebra::Matrix4;
use std::time::Instant;

/// Resolution and feature level used for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality {
    pub render_scale: f32,
    pub samples: usize,
    pub shadows: bool,
}

impl Quality {
    /// Full profile, or the reduced one for content above the heavy threshold.
    pub fn for_triangles(settings: &RenderConfig, triangles: usize) -> Self {
        if triangles > settings.heavy_triangle_count {
            Self {
                render_scale: (settings.render_scale * 0.5).max(0.1),
                samples: 1,
                shadows: false,
            }
        } else {
            Self {
                render_scale: settings.render_scale.max(0.1),
                samples: settings.samples.max(1),
                shadows: settings.use_shadows,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FrameKey {
    view_projection: Matrix4<f32>,
    revision: u64,
    size: (usize, usize),
    quality: Quality,
}

/// Turns a [`Stage`] into images, re-rendering only when something changed.
pub struct Viewport {
    pub settings: RenderConfig,
    renderer: Renderer,
    shadow_renderer: Renderer,
    shadow_cache: Option<(u64, ShadowMap)>,
    last_key: Option<FrameKey>,
    image: RgbaImage,
    last_frame_ms: f32,
}

impl Viewport {
    pub fn new(settings: RenderConfig) -> Self {
        Self {
            settings,
            renderer: Renderer::new(1, 1, 1),
            shadow_renderer: Renderer::new(1, 1, 1),
            shadow_cache: None,
            last_key: None,
            image: RgbaImage::new(1, 1),
            last_frame_ms: 0.0,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn last_frame_ms(&self) -> f32 {
        self.last_frame_ms
    }

    pub fn quality(&self, stage: &Stage) -> Quality {
        Quality::for_triangles(&self.settings, stage.content_model().triangle_count())
    }

    /// Forces the next `render` call to draw.
    pub fn invalidate(&mut self) {
        self.last_key = None;
    }

    /// Renders `stage` for a panel of `panel` logical pixels.
    ///
    /// Returns the new image, or `None` when the previous frame is still valid.
    pub fn render(&mut self, stage: &mut Stage, panel: (f32, f32)) -> Option<&RgbaImage> {
        let quality = self.quality(stage);
        let width = ((panel.0 * quality.render_scale).round() as usize).max(1);
        let height = ((panel.1 * quality.render_scale).round() as usize).max(1);
        stage.camera.set_aspect(width as f32 / height as f32);

        let key = FrameKey {
            view_projection: stage.camera.view_projection(),
            revision: stage.revision(),
            size: (width, height),
            quality,
        };
        if self.last_key.as_ref() == Some(&key) {
            return None;
        }

        let started = Instant::now();
        self.draw(stage, width, height, quality);
        self.last_frame_ms = started.elapsed().as_secs_f32() * 1000.0;
        if self.last_key.as_ref().is_none_or(|k| k.quality != quality) {
            info!(
                "Viewer quality: {}x{} at scale {:.2}, {} sample(s), shadows {}",
                width, height, quality.render_scale, quality.samples, quality.shadows
            );
        }
        self.last_key = Some(key);
        Some(&self.image)
    }

    /// One frame at an exact pixel size, bypassing the change tracking.
    pub fn render_frame(&mut self, stage: &mut Stage, width: usize, height: usize) -> RgbaImage {
        let mut quality = self.quality(stage);
        quality.render_scale = 1.0;
        stage.camera.set_aspect(width.max(1) as f32 / height.max(1) as f32);
        self.draw(stage, width.max(1), height.max(1), quality);
        self.last_key = None;
        self.image.clone()
    }

    fn draw(&mut self, stage: &Stage, width: usize, height: usize, quality: Quality) {
        if quality.shadows {
            self.refresh_shadow_map(stage);
        }
        let shadow_map = if quality.shadows {
            self.shadow_cache.as_ref().map(|(_, map)| map)
        } else {
            None
        };

        self.renderer.resize(width, height, quality.samples);
        render_main_pass(stage, &mut self.renderer, shadow_map);
        self.image = resolve(&self.renderer.framebuffer, &self.settings);
    }

    /// Re-renders the shadow map only when the stage revision moved.
    fn refresh_shadow_map(&mut self, stage: &Stage) {
        let revision = stage.revision();
        let fresh = matches!(&self.shadow_cache, Some((rev, _)) if *rev == revision);
        if !fresh {
            self.shadow_cache = render_shadow_pass(stage, &self.settings, &mut self.shadow_renderer)
                .map(|map| (revision, map));
            debug!("Shadow map refreshed for revision {}", revision);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Quality, Viewport};
    use crate::io::config::{Config, RenderConfig};
    use crate::scene::stage::Stage;

    #[test]
    fn heavy_content_drops_to_the_reduced_profile() {
        let settings = RenderConfig::default();
        let light = Quality::for_triangles(&settings, 1_000);
        let heavy = Quality::for_triangles(&settings, 250_001);
        assert_eq!(light.samples, 2);
        assert!(light.shadows);
        assert_eq!(heavy.samples, 1);
        assert!(!heavy.shadows);
        assert_eq!(heavy.render_scale, light.render_scale * 0.5);
    }

    #[test]
    fn unchanged_stage_is_not_rendered_twice() {
        let config = Config::default();
        let mut stage = Stage::new(&config);
        let mut viewport = Viewport::new(config.render.clone());
        assert!(viewport.render(&mut stage, (48.0, 32.0)).is_some());
        assert!(viewport.render(&mut stage, (48.0, 32.0)).is_none());
        assert!(viewport.render(&mut stage, (64.0, 32.0)).is_some());
    }

    #[test]
    fn placeholder_frame_is_not_just_background() {
        let config = Config::default();
        let mut stage = Stage::new(&config);
        let mut viewport = Viewport::new(config.render.clone());
        let image = viewport.render_frame(&mut stage, 64, 48);
        assert_eq!(image.dimensions(), (64, 48));

        let corner = *image.get_pixel(0, 0);
        let center = *image.get_pixel(32, 24);
        assert_ne!(corner, center);
    }
}
