use clap::Parser;
use glb_showcase::app::{run_gui, run_headless};
use glb_showcase::error::AppError;
use glb_showcase::io::cli::Cli;
use glb_showcase::io::config::Config;
use log::{error, info};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("eframe", log::LevelFilter::Warn)
        .filter_module("egui_glow", log::LevelFilter::Warn)
        .filter_module("egui_winit", log::LevelFilter::Warn)
        .filter_module("winit", log::LevelFilter::Warn)
        .filter_module("wgpu", log::LevelFilter::Warn)
        .filter_module("glutin", log::LevelFilter::Warn)
        .filter_module("sctk", log::LevelFilter::Warn)
        .format_timestamp(None)
        .format_level(true)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::load_or_default(cli.config.as_deref())?;

    if cli.headless {
        info!("Headless render {}x{}", cli.width, cli.height);
        let path = run_headless(&config, cli.model.as_deref(), cli.output, cli.width, cli.height)?;
        info!("Wrote {}", path.display());
        Ok(())
    } else {
        run_gui(config, cli.model)
    }
}
