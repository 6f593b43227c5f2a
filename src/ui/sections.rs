use super::app::ShowcaseApp;
use super::intake::IntakeMethods;
use super::theme;
use super::viewer::ViewerMethods;
use crate::upload::intake::format_file_size;
use crate::upload::session::Phase;
use chrono::Datelike;
use egui::{Align, Context, Rect, RichText, Sense, Ui, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scroll anchors reachable from the navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Experience,
    Upload,
    Showcase,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Home,
        Section::Experience,
        Section::Upload,
        Section::Showcase,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::Experience => "Experience",
            Section::Upload => "Upload",
            Section::Showcase => "Showcase",
        }
    }
}

const HOW_IT_WORKS: [(&str, &str, &str); 3] = [
    ("01", "📁", "Upload Your Model"),
    ("02", "⚙", "Automatic Processing"),
    ("03", "🎯", "Interactive Review"),
];

const HIGHLIGHTS: [&str; 3] = ["🚀 Instant Upload", "🎮 Interactive Controls", "💎 Premium Quality"];

const SOCIAL_LINKS: [(&str, &str); 4] = [
    ("GitHub", "https://github.com"),
    ("Twitter", "https://twitter.com"),
    ("LinkedIn", "https://www.linkedin.com"),
    ("Discord", "https://discord.com"),
];

const HERO_HEIGHT: f32 = 560.0;

#[derive(Debug, Clone, Copy)]
struct Particle {
    /// Position in the unit square.
    pos: Vec2,
    velocity: Vec2,
    radius: f32,
    /// 0 = blue, 1 = purple.
    hue: f32,
}

/// Drifting dots behind the hero headline.
pub struct HeroParticles {
    particles: Vec<Particle>,
}

impl HeroParticles {
    /// Same `seed`, same field.
    pub fn new(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let particles = (0..count)
            .map(|_| Particle {
                pos: Vec2::new(rng.random_range(0.0..1.0), rng.random_range(0.0..1.0)),
                velocity: Vec2::new(rng.random_range(-0.02..0.02), rng.random_range(-0.03..-0.005)),
                radius: rng.random_range(1.0..3.5),
                hue: rng.random_range(0.0..1.0),
            })
            .collect();
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Moves every particle and wraps it back into the unit square.
    pub fn step(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.pos += p.velocity * dt;
            p.pos.x = p.pos.x.rem_euclid(1.0);
            p.pos.y = p.pos.y.rem_euclid(1.0);
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.particles.iter().map(|p| p.pos)
    }

    pub fn paint(&self, painter: &egui::Painter, rect: Rect) {
        // Soft glows standing in for the blurred background blobs.
        for (anchor, radius, color) in [
            (Vec2::new(0.25, 0.3), 140.0, theme::ACCENT),
            (Vec2::new(0.75, 0.7), 190.0, theme::ACCENT_PURPLE),
            (Vec2::new(0.5, 0.5), 110.0, theme::ACCENT_CYAN),
        ] {
            let center = rect.min + anchor * rect.size();
            for ring in 0..6 {
                let r = radius * (1.0 - ring as f32 / 6.0);
                painter.circle_filled(center, r, color.gamma_multiply(0.03));
            }
        }

        for p in &self.particles {
            let center = rect.min + p.pos * rect.size();
            let color = theme::mix(theme::ACCENT, theme::ACCENT_PURPLE, p.hue).gamma_multiply(0.6);
            painter.circle_filled(center, p.radius, color);
        }
    }
}

/// Page chrome around the viewer.
pub trait SectionMethods {
    /// Brand and navigation bar.
    fn ui_header(&mut self, ctx: &Context);

    /// Every section, top to bottom.
    fn ui_page(&mut self, ctx: &Context, ui: &mut Ui);

    fn ui_hero(&mut self, ui: &mut Ui);

    fn ui_how_it_works(&mut self, ui: &mut Ui);

    /// Drop zone, file status and error banner.
    fn ui_upload(&mut self, ui: &mut Ui);

    fn ui_footer(&mut self, ui: &mut Ui);
}

impl ShowcaseApp {
    /// Runs `add` and scrolls to it if navigation asked for `section`.
    fn anchored(&mut self, ui: &mut Ui, section: Section, add: impl FnOnce(&mut Self, &mut Ui)) {
        let response = ui.scope(|ui| add(self, ui)).response;
        if self.scroll_to == Some(section) {
            response.scroll_to_me(Some(Align::TOP));
            self.scroll_to = None;
        }
    }
}

impl SectionMethods for ShowcaseApp {
    fn ui_header(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("header")
            .frame(
                egui::Frame::new()
                    .fill(theme::PAGE_BG)
                    .inner_margin(egui::Margin::symmetric(24, 12)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("◆").size(22.0).color(theme::ACCENT));
                    ui.label(RichText::new("3D Portfolio").size(20.0).strong());
                    ui.add_space(24.0);
                    for section in Section::ALL {
                        if ui
                            .add(egui::Button::new(RichText::new(section.label()).size(15.0)).frame(false))
                            .clicked()
                        {
                            self.scroll_to = Some(section);
                        }
                    }
                    ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                        ui.label(RichText::new(&self.status_message).color(theme::TEXT_MUTED));
                    });
                });
            });
    }

    fn ui_page(&mut self, ctx: &Context, ui: &mut Ui) {
        self.anchored(ui, Section::Home, |app, ui| app.ui_hero(ui));
        self.anchored(ui, Section::Experience, |app, ui| app.ui_how_it_works(ui));
        self.anchored(ui, Section::Upload, |app, ui| app.ui_upload(ui));
        self.anchored(ui, Section::Showcase, |app, ui| app.ui_viewer(ctx, ui));
        ui.add_space(48.0);
        self.ui_footer(ui);
    }

    fn ui_hero(&mut self, ui: &mut Ui) {
        let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), HERO_HEIGHT), Sense::hover());
        self.hero.paint(&ui.painter_at(rect), rect);

        ui.scope_builder(
            egui::UiBuilder::new()
                .max_rect(rect)
                .layout(egui::Layout::top_down(Align::Center)),
            |ui| {
                ui.add_space(90.0);
                theme::card()
                    .inner_margin(egui::Margin::symmetric(18, 8))
                    .corner_radius(egui::CornerRadius::same(20))
                    .show(ui, |ui| {
                        ui.label(RichText::new("★ Premium 3D Experience").color(theme::TEXT));
                    });
                ui.add_space(28.0);
                ui.label(RichText::new("Showcase Your").size(64.0).strong());
                ui.label(
                    RichText::new("3D Creations")
                        .size(64.0)
                        .strong()
                        .color(theme::ACCENT),
                );
                ui.add_space(20.0);
                ui.label(
                    RichText::new(
                        "Upload, visualize, and present your GLB/GLTF models in an interactive viewer.",
                    )
                    .size(20.0)
                    .color(theme::TEXT_MUTED),
                );
                ui.add_space(32.0);

                ui.horizontal(|ui| {
                    let width = 2.0 * 200.0 + ui.spacing().item_spacing.x;
                    ui.add_space(((ui.available_width() - width) * 0.5).max(0.0));
                    let upload = egui::Button::new(RichText::new("Upload Your Model").size(18.0))
                        .fill(theme::ACCENT)
                        .min_size(Vec2::new(200.0, 48.0));
                    if ui.add(upload).clicked() {
                        self.scroll_to = Some(Section::Upload);
                    }
                    let demo = egui::Button::new(RichText::new("View Showcase").size(18.0))
                        .min_size(Vec2::new(200.0, 48.0));
                    if ui.add(demo).clicked() {
                        self.scroll_to = Some(Section::Showcase);
                    }
                });

                ui.add_space(40.0);
                ui.horizontal(|ui| {
                    ui.add_space((ui.available_width() * 0.5 - 260.0).max(0.0));
                    for item in HIGHLIGHTS {
                        ui.label(RichText::new(item).size(16.0).color(theme::TEXT_MUTED));
                        ui.add_space(24.0);
                    }
                });
            },
        );
    }

    fn ui_how_it_works(&mut self, ui: &mut Ui) {
        theme::section_heading(
            ui,
            "How It Works",
            "Simple three-step process to get your 3D models ready for review",
        );

        let max_size = format_file_size(self.session.limits().max_bytes);
        let descriptions = [
            format!("Drag & drop your .glb or .gltf files straight into the window. Files up to {max_size} are supported."),
            "Models are centered, scaled to a consistent size and set down on the ground automatically.".to_string(),
            "Orbit, pan and zoom around the model, toggle auto-rotate and save snapshots.".to_string(),
        ];

        ui.columns(3, |columns| {
            for ((col, (step, icon, title)), description) in
                columns.iter_mut().zip(HOW_IT_WORKS).zip(&descriptions)
            {
                theme::card().show(col, |ui| {
                    ui.set_min_height(200.0);
                    ui.label(RichText::new(step).size(28.0).strong().color(theme::ACCENT));
                    ui.add_space(8.0);
                    ui.label(RichText::new(icon).size(32.0));
                    ui.add_space(8.0);
                    ui.label(RichText::new(title).size(20.0).strong());
                    ui.add_space(6.0);
                    ui.label(RichText::new(description).color(theme::TEXT_MUTED));
                });
            }
        });
    }

    fn ui_upload(&mut self, ui: &mut Ui) {
        theme::section_heading(
            ui,
            "Upload Your Creation",
            "Drag and drop your GLB or GLTF files to see them come to life",
        );

        let border = if self.files_hovering {
            theme::ACCENT
        } else {
            match self.session.phase() {
                Phase::Ready => theme::SUCCESS,
                Phase::Failed => theme::DANGER,
                _ => theme::CARD_BORDER,
            }
        };
        let fill = if self.files_hovering {
            theme::ACCENT.gamma_multiply(0.12)
        } else {
            theme::CARD_BG
        };

        theme::card_with_border(border).fill(fill).show(ui, |ui| {
            ui.set_min_height(260.0);
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.label(RichText::new("⬆").size(48.0).color(theme::ACCENT));
                ui.add_space(8.0);
                let headline = if self.files_hovering {
                    "Release to upload"
                } else {
                    "Drop your 3D model here"
                };
                ui.label(RichText::new(headline).size(24.0).strong());
                ui.label(
                    RichText::new(format!(
                        "Supports .glb and .gltf files up to {}",
                        format_file_size(self.session.limits().max_bytes)
                    ))
                    .color(theme::TEXT_MUTED),
                );
                ui.add_space(16.0);
                let browse = egui::Button::new(RichText::new("Browse Files").size(16.0))
                    .fill(theme::ACCENT)
                    .min_size(Vec2::new(160.0, 40.0));
                if ui.add_enabled(!self.session.is_loading(), browse).clicked() {
                    self.browse_for_model();
                }
            });
        });

        if let Some(file) = self.session.file().cloned() {
            ui.add_space(16.0);
            theme::card().show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new("📦").size(28.0));
                    ui.vertical(|ui| {
                        ui.label(RichText::new(&file.name).size(18.0).strong());
                        ui.label(RichText::new(&file.size).color(theme::TEXT_MUTED));
                    });
                    ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                        match self.session.phase() {
                            Phase::Loading { progress, .. } => {
                                ui.label(
                                    RichText::new(format!("{progress:.0}%"))
                                        .size(18.0)
                                        .color(theme::ACCENT),
                                );
                            }
                            Phase::AwaitingConfirmation { .. } => {
                                ui.label(RichText::new("Waiting for confirmation").color(theme::WARNING));
                            }
                            Phase::Ready => {
                                ui.label(RichText::new("✔ Loaded").color(theme::SUCCESS));
                            }
                            Phase::Idle | Phase::Failed => {}
                        }
                    });
                });
                if let Some(progress) = self.session.progress() {
                    ui.add_space(8.0);
                    ui.add(egui::ProgressBar::new(progress / 100.0).desired_height(6.0));
                }
            });
        }

        if let Some(error) = self.session.error().map(str::to_string) {
            ui.add_space(16.0);
            theme::card_with_border(theme::DANGER)
                .fill(theme::DANGER.gamma_multiply(0.1))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(error).color(theme::DANGER));
                        ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.session.dismiss_error();
                            }
                        });
                    });
                });
        }
    }

    fn ui_footer(&mut self, ui: &mut Ui) {
        ui.separator();
        ui.add_space(24.0);
        ui.columns(3, |columns| {
            columns[0].label(RichText::new("◆ 3D Portfolio").size(22.0).strong());
            columns[0].label(
                RichText::new(
                    "A showcase for 3D models with a real-time viewer and interactive review.",
                )
                .color(theme::TEXT_MUTED),
            );

            columns[1].label(RichText::new("Quick Links").size(16.0).strong());
            for section in Section::ALL {
                if columns[1]
                    .add(egui::Button::new(RichText::new(section.label()).color(theme::TEXT_MUTED)).frame(false))
                    .clicked()
                {
                    self.scroll_to = Some(section);
                }
            }

            columns[2].label(RichText::new("Connect").size(16.0).strong());
            columns[2].horizontal_wrapped(|ui| {
                for (name, url) in SOCIAL_LINKS {
                    ui.hyperlink_to(name, url);
                }
            });
        });

        ui.add_space(24.0);
        ui.separator();
        let year = chrono::Local::now().year();
        ui.label(
            RichText::new(format!("© {year} 3D Portfolio. All rights reserved."))
                .size(12.0)
                .color(theme::TEXT_MUTED),
        );
        ui.add_space(24.0);
    }
}
