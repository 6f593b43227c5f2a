use super::app::ShowcaseApp;
use super::intake::IntakeMethods;
use super::theme;
use crate::upload::intake::LARGE_MODEL_TIPS;
use crate::upload::session::Phase;
use egui::{Align2, RichText};

/// Modal windows layered over the page.
pub trait DialogMethods {
    /// Confirmation for files over the warning threshold.
    fn show_large_model_dialog(&mut self, ctx: &egui::Context);

    /// Upload failures and app errors, dismissed with OK.
    fn show_error_dialog(&mut self, ctx: &egui::Context);
}

impl DialogMethods for ShowcaseApp {
    fn show_large_model_dialog(&mut self, ctx: &egui::Context) {
        if !matches!(self.session.phase(), Phase::AwaitingConfirmation { .. }) {
            return;
        }
        let warning = self.session.warning().unwrap_or_default().to_string();

        let mut confirm = false;
        let mut cancel = false;
        egui::Window::new("⚠ Large Model Detected")
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .collapsible(false)
            .resizable(false)
            .default_width(460.0)
            .show(ctx, |ui| {
                ui.label(RichText::new(warning).color(theme::WARNING));
                ui.add_space(10.0);
                ui.label(RichText::new("Tips for large models:").strong());
                for tip in LARGE_MODEL_TIPS {
                    ui.label(format!("• {tip}"));
                }
                ui.add_space(14.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                    let load = egui::Button::new("Load Anyway").fill(theme::ACCENT);
                    if ui.add(load).clicked() {
                        confirm = true;
                    }
                });
            });

        if confirm {
            self.confirm_large_model();
        } else if cancel {
            self.cancel_large_model();
        }
    }

    fn show_error_dialog(&mut self, ctx: &egui::Context) {
        let message = match (self.session.error(), &self.app_error) {
            (Some(err), _) => err.to_string(),
            (None, Some(err)) => err.clone(),
            (None, None) => return,
        };

        let mut dismissed = false;
        egui::Window::new("Error")
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(RichText::new(message).color(theme::DANGER));
                ui.add_space(10.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            // Upload errors first; an app error behind it shows next frame.
            if self.session.error().is_some() {
                self.session.dismiss_error();
            } else {
                self.app_error = None;
            }
        }
    }
}
