//! Error types shared across the showcase.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or parse the TOML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A file was refused before any decoding started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("Invalid file format. Please upload .glb or .gltf files only.")]
    UnsupportedExtension { name: String },

    #[error("File is too large ({size}). The maximum supported size is {limit}.")]
    TooLarge { size: String, limit: String },
}

/// Decoding a model failed after the load was dispatched.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("glTF error: {0}")]
    Parse(#[from] gltf::Error),

    #[error("load was superseded by a newer file")]
    Cancelled,

    #[error("the asset contains no drawable triangles")]
    Empty,

    #[error("invalid glTF: {0}")]
    Invalid(String),
}

/// Top-level failures surfaced by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to write image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("GUI error: {0}")]
    Gui(String),

    #[error("{0}")]
    Usage(String),
}
