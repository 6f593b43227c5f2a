use super::dialogs::DialogMethods;
use super::intake::IntakeMethods;
use super::memory::MemoryMonitor;
use super::sections::{HeroParticles, Section, SectionMethods};
use super::theme;
use crate::io::config::Config;
use crate::io::gltf_loader::GltfDecoder;
use crate::pipeline::viewport::Viewport;
use crate::scene::normalize::FitOptions;
use crate::scene::stage::Stage;
use crate::upload::session::ViewerSession;
use crate::upload::worker::LoadDispatcher;
use log::info;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// The showcase window: landing page sections around a live model viewer.
pub struct ShowcaseApp {
    pub config: Config,
    pub fit: FitOptions,

    // Viewer runtime
    pub stage: Stage,
    pub viewport: Viewport,
    pub viewer_texture: Option<egui::TextureHandle>,

    // Upload flow
    pub session: ViewerSession,
    pub dispatcher: LoadDispatcher<GltfDecoder>,
    pub files_hovering: bool,

    // Page state
    pub hero: HeroParticles,
    pub memory: MemoryMonitor,
    pub scroll_to: Option<Section>,
    pub status_message: String,
    /// Failures outside the upload flow (file dialog, snapshots).
    pub app_error: Option<String>,
    pub last_tick: Instant,
}

impl ShowcaseApp {
    pub fn new(config: Config, cc: &eframe::CreationContext<'_>) -> Self {
        theme::apply(&cc.egui_ctx);

        let repaint_ctx = cc.egui_ctx.clone();
        let dispatcher = LoadDispatcher::new(GltfDecoder::new(config.viewer.max_texture_size))
            .with_notify(move || repaint_ctx.request_repaint());

        Self {
            fit: config.viewer.fit(),
            stage: Stage::new(&config),
            viewport: Viewport::new(config.render.clone()),
            viewer_texture: None,

            session: ViewerSession::new(config.limits, config.viewer.on_decode_error),
            dispatcher,
            files_hovering: false,

            hero: HeroParticles::new(48, 0x5eed),
            memory: MemoryMonitor::default(),
            scroll_to: None,
            status_message: "Drop a .glb or .gltf file anywhere to begin".to_string(),
            app_error: None,
            last_tick: Instant::now(),
            config,
        }
    }

    /// Advances camera inertia, auto-rotate and the placeholder spin.
    fn tick(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).as_secs_f32().min(0.1);
        self.last_tick = now;

        self.stage.tick(dt);
        self.hero.step(dt);

        self.memory.refresh(now);
        // Placeholder spin, hero drift and camera inertia all need frames.
        ctx.request_repaint_after(Duration::from_millis(16));
    }
}

impl eframe::App for ShowcaseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump_load_events();
        self.collect_dropped_files(ctx);
        self.tick(ctx);

        self.ui_header(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme::PAGE_BG))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.vertical_centered(|ui| {
                            ui.set_max_width(theme::CONTENT_WIDTH);
                            self.ui_page(ctx, ui);
                        });
                    });
            });

        self.show_large_model_dialog(ctx);
        self.show_error_dialog(ctx);
    }
}

/// Opens the showcase window, optionally preloading `model` through the
/// regular upload path.
pub fn start_gui(config: Config, model: Option<PathBuf>) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("GLB Showcase")
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    info!("Starting showcase window");
    eframe::run_native(
        "GLB Showcase",
        options,
        Box::new(move |cc| {
            let mut app = ShowcaseApp::new(config, cc);
            if let Some(path) = model {
                app.submit_path(path);
            }
            Ok(Box::new(app))
        }),
    )
}
