use crate::core::color::hex_to_linear;
use crate::io::config::Config;
use crate::scene::camera::Camera;
use crate::scene::light::{Light, POINT_ATTENUATION};
use crate::scene::material::Material;
use crate::scene::mesh::Mesh;
use crate::scene::model::{Model, ModelStats};
use crate::scene::normalize::{FitOptions, FitOutcome, normalize};
use crate::scene::orbit::OrbitControls;
use log::{info, warn};
use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Placeholder spin, 0.01 rad per frame at 60 Hz.
const PLACEHOLDER_SPIN_RATE: f32 = 0.6;
const PLACEHOLDER_COLOR: u32 = 0x667eea;

/// What the viewer currently shows.
#[derive(Debug, Clone)]
pub enum Content {
    /// Spinning cube shown until a model is presented.
    Placeholder(Model),
    Presented { model: Model, fit: FitOutcome },
}

/// The rendering surface: camera, lights, a ground plane and exactly one
/// content node.
///
/// `revision` increases whenever the content changes shape or pose, so
/// cached renders (the shadow map in particular) know when to refresh.
pub struct Stage {
    pub camera: Camera,
    pub controls: OrbitControls,
    pub lights: Vec<Light>,
    pub ambient: Vector3<f32>,
    pub background: Vector3<f32>,
    pub ground: Model,
    content: Content,
    revision: u64,
}

impl Stage {
    pub fn new(config: &Config) -> Self {
        let cam = &config.camera;
        let position = Point3::from(cam.position);
        let target = Point3::from(cam.target);
        let camera = Camera::new(position, target, cam.fov, 16.0 / 9.0, cam.near, cam.far);
        let mut controls = OrbitControls::new(config.controls, position, target);
        controls.auto_rotate = true;

        let lights = config
            .lights
            .iter()
            .filter_map(|l| {
                let position = Point3::from(l.position);
                let light = match l.r#type.as_str() {
                    "directional" => Light::Directional {
                        position,
                        color: Vector3::from(l.color),
                        intensity: l.intensity,
                        cast_shadow: l.cast_shadow,
                    },
                    "point" => Light::Point {
                        position,
                        color: Vector3::from(l.color),
                        intensity: l.intensity,
                        attenuation: POINT_ATTENUATION,
                    },
                    other => {
                        warn!("Unknown light type '{}', ignoring", other);
                        return None;
                    }
                };
                Some(light)
            })
            .collect();

        let render = &config.render;
        let ground = Model::new(
            "ground",
            vec![Mesh::create_plane(render.ground_size, 0.0, Some(0))],
            vec![Material::solid(render.ground_color, 0.0, 1.0)],
        );

        Self {
            camera,
            controls,
            lights,
            ambient: Vector3::new(1.0, 1.0, 1.0) * render.ambient_intensity,
            background: hex_to_linear(render.background),
            ground,
            content: Content::Placeholder(placeholder_cube()),
            revision: 0,
        }
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_model(&self) -> bool {
        matches!(self.content, Content::Presented { .. })
    }

    /// The model drawn as content, presented or placeholder.
    pub fn content_model(&self) -> &Model {
        match &self.content {
            Content::Placeholder(cube) => cube,
            Content::Presented { model, .. } => model,
        }
    }

    pub fn presented(&self) -> Option<(&Model, &FitOutcome)> {
        match &self.content {
            Content::Presented { model, fit } => Some((model, fit)),
            Content::Placeholder(_) => None,
        }
    }

    pub fn stats(&self) -> Option<ModelStats> {
        self.presented().map(|(model, _)| model.stats())
    }

    /// Normalizes `model` once and makes it the only content node.
    pub fn present(&mut self, mut model: Model, fit: &FitOptions) -> FitOutcome {
        let outcome = normalize(&mut model, fit);
        info!(
            "Presenting '{}' ({} meshes, {} triangles)",
            model.name,
            model.meshes.len(),
            model.triangle_count()
        );
        self.content = Content::Presented {
            model,
            fit: outcome,
        };
        self.controls.auto_rotate = false;
        self.revision += 1;
        outcome
    }

    /// Drops the presented model and brings the placeholder back.
    pub fn clear(&mut self) {
        if self.has_model() {
            info!("Clearing viewer");
        }
        self.content = Content::Placeholder(placeholder_cube());
        self.controls.auto_rotate = true;
        self.revision += 1;
    }

    /// Advances animation by `dt` seconds. Returns true if anything moved.
    pub fn tick(&mut self, dt: f32) -> bool {
        let mut changed = self.controls.update(dt, &mut self.camera);
        if let Content::Placeholder(cube) = &mut self.content {
            let spin = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), PLACEHOLDER_SPIN_RATE * dt);
            cube.root.rotation = spin * cube.root.rotation;
            self.revision += 1;
            changed = true;
        }
        changed
    }

    /// Ground first, then content.
    pub fn drawables(&self) -> [&Model; 2] {
        [&self.ground, self.content_model()]
    }
}

fn placeholder_cube() -> Model {
    let mut cube = Model::new(
        "placeholder",
        vec![Mesh::create_box(Point3::origin(), Vector3::new(2.0, 2.0, 2.0), Some(0))],
        vec![Material::solid(PLACEHOLDER_COLOR, 0.1, 0.5)],
    );
    cube.root.position = Vector3::new(0.0, 1.0, 0.0);
    cube
}
