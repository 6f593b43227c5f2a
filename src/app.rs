//! Entry points behind the binary: the showcase window and the headless
//! single-frame renderer.

use crate::error::{AppError, LoadError};
use crate::io::config::Config;
use crate::io::gltf_loader::GltfDecoder;
use crate::io::snapshot::{default_snapshot_name, save_image};
use crate::pipeline::viewport::Viewport;
use crate::scene::stage::Stage;
use crate::ui::app::start_gui;
use crate::upload::intake::FileCandidate;
use crate::upload::session::{Applied, Submission, ViewerSession};
use crate::upload::worker::{LoadEvent, LoadEventKind, SceneDecoder};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

/// Opens the showcase window and blocks until it closes.
pub fn run_gui(config: Config, model: Option<PathBuf>) -> Result<(), AppError> {
    start_gui(config, model).map_err(|e| AppError::Gui(e.to_string()))
}

/// Renders one `width` x `height` frame of `model` (or the placeholder) and
/// writes it to `output`. Returns the written path.
///
/// The model goes through the same intake checks and session as a dropped
/// file. Files over the warning threshold load without asking.
pub fn run_headless(
    config: &Config,
    model: Option<&Path>,
    output: Option<PathBuf>,
    width: usize,
    height: usize,
) -> Result<PathBuf, AppError> {
    if width == 0 || height == 0 {
        return Err(AppError::Usage(format!(
            "output size must be positive, got {width}x{height}"
        )));
    }

    let mut stage = Stage::new(config);
    let mut viewport = Viewport::new(config.render.clone());
    let mut session = ViewerSession::new(config.limits, config.viewer.on_decode_error);

    let mut model_name = None;
    if let Some(path) = model {
        let candidate = FileCandidate::from_path(path).map_err(LoadError::Io)?;
        let request = match session.submit(candidate) {
            Submission::Load(request) => request,
            Submission::NeedsConfirmation => {
                if let Some(warning) = session.warning() {
                    warn!("{}", warning);
                }
                warn!("Headless mode loads large models without confirmation");
                session
                    .confirm()
                    .ok_or_else(|| AppError::Usage("large model confirmation failed".to_string()))?
            }
            Submission::Rejected(err) => return Err(err.into()),
        };

        let decoder = GltfDecoder::new(config.viewer.max_texture_size);
        let cancel = AtomicBool::new(false);
        let started = Instant::now();
        let mut last_quarter = -1;
        let mut on_progress = |p: f32| {
            let quarter = (p / 25.0).floor() as i32;
            if quarter > last_quarter {
                last_quarter = quarter;
                info!("Loading {}: {:.0}%", request.name, p);
            }
        };
        let decoded = decoder.decode(&request.source, &mut on_progress, &cancel)?;
        info!("Decoded in {:.2?}", started.elapsed());

        let event = LoadEvent {
            ticket: request.ticket,
            kind: LoadEventKind::Complete(decoded),
        };
        if let Applied::Present(decoded) = session.apply(event) {
            model_name = Some(decoded.name.clone());
            let outcome = stage.present(decoded, &config.viewer.fit());
            info!("Fit scale {:.4}", outcome.scale());
        }
    } else {
        info!("No model given, rendering the placeholder");
    }

    let output = output.unwrap_or_else(|| PathBuf::from(default_snapshot_name(model_name.as_deref())));
    let started = Instant::now();
    let image = viewport.render_frame(&mut stage, width, height);
    info!("Rendered {}x{} in {:.2?}", width, height, started.elapsed());
    save_image(&image, &output)
}
