use super::app::ShowcaseApp;
use crate::upload::intake::{FileCandidate, SUPPORTED_EXTENSIONS};
use crate::upload::session::{Applied, DecodeErrorPolicy, Submission};
use log::{info, warn};
use native_dialog::FileDialogBuilder;
use std::path::PathBuf;

/// Moves files from the OS into the session and decoded models onto the stage.
pub trait IntakeMethods {
    /// Tracks drag hover and picks up the first dropped file.
    fn collect_dropped_files(&mut self, ctx: &egui::Context);

    /// Native file picker limited to .glb and .gltf.
    fn browse_for_model(&mut self);

    fn submit_path(&mut self, path: PathBuf);

    /// Validates `candidate` and starts its load when accepted.
    fn submit_candidate(&mut self, candidate: FileCandidate);

    /// "Load Anyway" on the large-model dialog.
    fn confirm_large_model(&mut self);

    /// "Cancel" on the large-model dialog.
    fn cancel_large_model(&mut self);

    /// Applies worker events to the session and stage.
    fn pump_load_events(&mut self);

    /// Clears the viewer back to the placeholder.
    fn reset_viewer(&mut self);
}

impl IntakeMethods for ShowcaseApp {
    fn collect_dropped_files(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.clone(),
            )
        });
        self.files_hovering = hovering;

        if dropped.len() > 1 {
            warn!("{} files dropped, only the first is used", dropped.len());
        }
        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        if let Some(path) = file.path {
            self.submit_path(path);
        } else if let Some(bytes) = file.bytes {
            self.submit_candidate(FileCandidate::from_bytes(file.name, bytes));
        } else {
            warn!("Dropped file '{}' has neither a path nor contents", file.name);
        }
    }

    fn browse_for_model(&mut self) {
        let result = FileDialogBuilder::default()
            .set_title("Select a 3D model")
            .add_filter("GLB/GLTF models", SUPPORTED_EXTENSIONS)
            .open_single_file()
            .show();

        match result {
            Ok(Some(path)) => self.submit_path(path),
            Ok(None) => {
                self.status_message = "File selection cancelled".to_string();
            }
            Err(e) => {
                self.app_error = Some(format!("File dialog error: {e}"));
            }
        }
    }

    fn submit_path(&mut self, path: PathBuf) {
        match FileCandidate::from_path(&path) {
            Ok(candidate) => self.submit_candidate(candidate),
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                self.app_error = Some(format!("Cannot read {}: {e}", path.display()));
            }
        }
    }

    fn submit_candidate(&mut self, candidate: FileCandidate) {
        match self.session.submit(candidate) {
            Submission::Load(request) => {
                self.status_message = format!("Loading {}...", request.name);
                self.dispatcher.dispatch(request);
            }
            Submission::NeedsConfirmation => {
                self.dispatcher.cancel_in_flight();
                self.status_message = "Large model: waiting for confirmation".to_string();
            }
            Submission::Rejected(err) => {
                self.dispatcher.cancel_in_flight();
                self.status_message = err.to_string();
            }
        }
    }

    fn confirm_large_model(&mut self) {
        if let Some(request) = self.session.confirm() {
            self.status_message = format!("Loading {}...", request.name);
            self.dispatcher.dispatch(request);
        }
    }

    fn cancel_large_model(&mut self) {
        self.session.cancel_pending();
        self.status_message = "Large model load cancelled".to_string();
    }

    fn pump_load_events(&mut self) {
        for event in self.dispatcher.poll() {
            match self.session.apply(event) {
                Applied::Stale | Applied::Progress(_) => {}
                Applied::Present(model) => {
                    let name = model.name.clone();
                    let outcome = self.stage.present(model, &self.fit);
                    self.status_message = format!("Showing {name} (scale {:.3})", outcome.scale());
                }
                Applied::Failed { policy } => {
                    if policy == DecodeErrorPolicy::Clear {
                        self.stage.clear();
                    }
                    self.status_message = "Load failed".to_string();
                }
            }
        }
    }

    fn reset_viewer(&mut self) {
        info!("Viewer reset");
        self.dispatcher.cancel_in_flight();
        self.session.reset();
        self.stage.clear();
        self.status_message = "Viewer reset".to_string();
    }
}
