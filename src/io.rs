pub mod cli;
pub mod config;
pub mod gltf_loader;
pub mod snapshot;
