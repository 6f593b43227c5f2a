use clap::Parser;
use std::path::PathBuf;

/// Command line for the showcase window and its headless renderer.
#[derive(Parser, Debug)]
#[command(name = "glb-showcase")]
#[command(about = "GLB/GLTF showcase with a software-rasterized viewer")]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Model to load at startup, through the regular upload checks
    #[arg(short, long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Render one frame to an image instead of opening the window
    #[arg(long)]
    pub headless: bool,

    /// Headless output path; defaults to a timestamped PNG
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = 1280)]
    pub width: usize,

    #[arg(long, default_value_t = 720)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn parses_headless_invocation() {
        let cli = Cli::try_parse_from([
            "glb-showcase",
            "--headless",
            "-m",
            "duck.glb",
            "-o",
            "out.png",
            "--width",
            "640",
        ])
        .unwrap();
        assert!(cli.headless);
        assert_eq!(cli.model.unwrap().to_str(), Some("duck.glb"));
        assert_eq!(cli.output.unwrap().to_str(), Some("out.png"));
        assert_eq!((cli.width, cli.height), (640, 720));
        assert!(cli.config.is_none());
    }

    #[test]
    fn window_mode_is_the_default() {
        let cli = Cli::try_parse_from(["glb-showcase"]).unwrap();
        assert!(!cli.headless);
        assert!(cli.model.is_none());
    }
}
