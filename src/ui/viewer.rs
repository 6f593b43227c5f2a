use super::app::ShowcaseApp;
use super::intake::IntakeMethods;
use super::theme;
use crate::io::snapshot::{default_snapshot_name, save_image};
use egui::{Align2, Color32, FontId, PointerButton, Pos2, Rect, RichText, Sense, Stroke, Ui, Vec2};
use nalgebra::Vector2;
use native_dialog::FileDialogBuilder;
use std::f32::consts::TAU;

const VIEWER_HEIGHT: f32 = 560.0;

/// The interactive model viewer and its controls.
pub trait ViewerMethods {
    fn ui_viewer(&mut self, ctx: &egui::Context, ui: &mut Ui);

    /// Rasterized frame with orbit, pan and zoom input.
    fn ui_viewer_canvas(&mut self, ctx: &egui::Context, ui: &mut Ui);

    fn ui_viewer_controls(&mut self, ui: &mut Ui);

    fn ui_viewer_stats(&self, ui: &mut Ui);

    fn save_snapshot(&mut self);
}

impl ViewerMethods for ShowcaseApp {
    fn ui_viewer(&mut self, ctx: &egui::Context, ui: &mut Ui) {
        theme::section_heading(
            ui,
            "Interactive Showcase",
            "Orbit, pan and zoom around your model",
        );

        theme::card().inner_margin(egui::Margin::same(12)).show(ui, |ui| {
            ui.set_width(ui.available_width());
            self.ui_viewer_canvas(ctx, ui);
            ui.add_space(10.0);
            self.ui_viewer_controls(ui);
        });

        ui.add_space(8.0);
        ui.label(
            RichText::new("Left drag: rotate   Right drag: pan   Scroll: zoom   Double click: reset camera")
                .size(13.0)
                .color(theme::TEXT_MUTED),
        );
        ui.add_space(12.0);
        self.ui_viewer_stats(ui);
    }

    fn ui_viewer_canvas(&mut self, ctx: &egui::Context, ui: &mut Ui) {
        let size = Vec2::new(ui.available_width(), VIEWER_HEIGHT);
        let ppp = ctx.pixels_per_point();

        if let Some(image) = self.viewport.render(&mut self.stage, (size.x * ppp, size.y * ppp)) {
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [image.width() as usize, image.height() as usize],
                image.as_raw(),
            );
            match &mut self.viewer_texture {
                Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
                None => {
                    self.viewer_texture =
                        Some(ctx.load_texture("viewer", color_image, egui::TextureOptions::LINEAR));
                }
            }
        }

        let response = match self.viewer_texture.clone() {
            Some(texture) => ui.add(
                egui::Image::new(&texture)
                    .fit_to_exact_size(size)
                    .corner_radius(egui::CornerRadius::same(10))
                    .sense(Sense::click_and_drag()),
            ),
            None => ui.allocate_response(size, Sense::click_and_drag()),
        };
        let rect = response.rect;

        if response.dragged_by(PointerButton::Primary) {
            let d = response.drag_delta();
            self.stage.controls.rotate(Vector2::new(d.x, d.y), rect.height());
        }
        if response.dragged_by(PointerButton::Secondary) || response.dragged_by(PointerButton::Middle) {
            let d = response.drag_delta();
            self.stage
                .controls
                .pan(Vector2::new(d.x, d.y), rect.height(), &self.stage.camera);
        }
        if response.double_clicked() {
            self.stage.controls.reset();
        }
        if response.hovered() {
            let scroll = ctx.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.stage.controls.zoom(scroll);
                // Keep the page from scrolling while zooming.
                ctx.input_mut(|i| i.smooth_scroll_delta = Vec2::ZERO);
            }
        }

        let painter = ui.painter_at(rect);
        if let Some(progress) = self.session.progress() {
            paint_loading_overlay(&painter, rect, progress);
            let bar_rect = Rect::from_center_size(
                rect.center() + Vec2::new(0.0, 90.0),
                Vec2::new(rect.width().min(320.0), 8.0),
            );
            ui.put(bar_rect, egui::ProgressBar::new(progress / 100.0).desired_height(8.0));
        } else if !self.stage.has_model() {
            painter.text(
                rect.center_bottom() - Vec2::new(0.0, 24.0),
                Align2::CENTER_CENTER,
                "Upload a model to replace the placeholder",
                FontId::proportional(15.0),
                theme::TEXT_MUTED,
            );
        }
    }

    fn ui_viewer_controls(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            let can_reset = self.stage.has_model() || self.session.is_loading() || self.session.file().is_some();
            if ui
                .add_enabled(can_reset, egui::Button::new("⟲ Reset Viewer"))
                .on_hover_text("Remove the model and clear the upload")
                .clicked()
            {
                self.reset_viewer();
            }
            if ui.button("🎥 Reset Camera").clicked() {
                self.stage.controls.reset();
            }
            ui.checkbox(&mut self.stage.controls.auto_rotate, "Auto-rotate");
            if ui.button("📷 Snapshot").clicked() {
                self.save_snapshot();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some(file) = self.session.file() {
                    ui.label(RichText::new(format!("{} · {}", file.name, file.size)).color(theme::TEXT_MUTED));
                }
            });
        });
    }

    fn ui_viewer_stats(&self, ui: &mut Ui) {
        let quality = self.viewport.quality(&self.stage);
        theme::card().inner_margin(egui::Margin::same(16)).show(ui, |ui| {
            ui.set_width(ui.available_width());
            egui::Grid::new("viewer_stats")
                .num_columns(4)
                .spacing([32.0, 6.0])
                .show(ui, |ui| {
                    match self.stage.presented() {
                        Some((model, outcome)) => {
                            let stats = model.stats();
                            stat(ui, "Model", &model.name);
                            stat(ui, "Meshes", &stats.meshes.to_string());
                            ui.end_row();
                            stat(ui, "Triangles", &stats.triangles.to_string());
                            stat(ui, "Vertices", &stats.vertices.to_string());
                            ui.end_row();
                            stat(ui, "Materials", &format!("{} ({} textured)", stats.materials, stats.textures));
                            stat(ui, "Fit scale", &format!("{:.4}", outcome.scale()));
                            ui.end_row();
                        }
                        None => {
                            stat(ui, "Model", "placeholder");
                            ui.end_row();
                        }
                    }
                    stat(ui, "Frame", &format!("{:.1} ms", self.viewport.last_frame_ms()));
                    stat(
                        ui,
                        "Quality",
                        &format!(
                            "scale {:.2}, {}x AA, shadows {}",
                            quality.render_scale,
                            quality.samples,
                            if quality.shadows { "on" } else { "off" }
                        ),
                    );
                    ui.end_row();
                });
            ui.add_space(6.0);
            ui.label(RichText::new(self.memory.label()).size(12.0).color(theme::TEXT_MUTED));
        });
    }

    fn save_snapshot(&mut self) {
        let name = default_snapshot_name(self.stage.presented().map(|(m, _)| m.name.as_str()));
        let result = FileDialogBuilder::default()
            .set_title("Save snapshot")
            .set_filename(&name)
            .add_filter("PNG image", ["png"])
            .save_single_file()
            .show();

        match result {
            Ok(Some(mut path)) => {
                if path.extension().is_none() {
                    path.set_extension("png");
                }
                match save_image(self.viewport.image(), &path) {
                    Ok(saved) => self.status_message = format!("Snapshot saved: {}", saved.display()),
                    Err(e) => self.app_error = Some(e.to_string()),
                }
            }
            Ok(None) => {
                self.status_message = "Snapshot cancelled".to_string();
            }
            Err(e) => {
                self.app_error = Some(format!("File dialog error: {e}"));
            }
        }
    }
}

fn stat(ui: &mut Ui, label: &str, value: &str) {
    ui.label(RichText::new(label).color(theme::TEXT_MUTED));
    ui.label(RichText::new(value).strong());
}

/// Dims the frame and draws a progress ring with the percentage inside.
fn paint_loading_overlay(painter: &egui::Painter, rect: Rect, progress: f32) {
    painter.rect_filled(rect, 10.0, Color32::from_black_alpha(150));

    let center = rect.center();
    let radius = 40.0;
    painter.circle_stroke(center, radius, Stroke::new(6.0, theme::CARD_BORDER));
    let arc = ring_points(center, radius, progress / 100.0);
    if arc.len() > 1 {
        painter.add(egui::Shape::line(arc, Stroke::new(6.0, theme::ACCENT)));
    }

    painter.text(
        center,
        Align2::CENTER_CENTER,
        format!("{progress:.0}%"),
        FontId::proportional(20.0),
        theme::TEXT,
    );
    painter.text(
        center + Vec2::new(0.0, radius + 24.0),
        Align2::CENTER_CENTER,
        "Loading model...",
        FontId::proportional(16.0),
        theme::TEXT_MUTED,
    );
}

/// Points along a clockwise arc starting at twelve o'clock, `fraction` of a turn.
fn ring_points(center: Pos2, radius: f32, fraction: f32) -> Vec<Pos2> {
    let fraction = fraction.clamp(0.0, 1.0);
    let steps = (64.0 * fraction).ceil() as usize;
    (0..=steps)
        .map(|i| {
            let angle = TAU * fraction * i as f32 / steps.max(1) as f32 - TAU / 4.0;
            center + radius * Vec2::new(angle.cos(), angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::ring_points;
    use egui::Pos2;

    #[test]
    fn ring_starts_at_twelve_and_grows_with_progress() {
        let center = Pos2::new(100.0, 100.0);
        assert!(ring_points(center, 10.0, 0.0).len() <= 1);

        let half = ring_points(center, 10.0, 0.5);
        let first = half[0];
        assert!((first.x - 100.0).abs() < 1e-4 && (first.y - 90.0).abs() < 1e-4);
        let last = half[half.len() - 1];
        assert!((last.x - 100.0).abs() < 1e-3 && (last.y - 110.0).abs() < 1e-3);

        assert!(ring_points(center, 10.0, 1.0).len() > half.len());
    }
}
