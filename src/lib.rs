//! GLB/GLTF showcase: a landing page with a drag-and-drop model viewer.
//!
//! The viewer renders on the CPU with a small rasterizer (`core` + `pipeline`),
//! decodes assets with the `gltf` crate (`io`), and guards the upload flow with
//! an explicit state machine (`upload`). The `ui` module wires all of it into
//! an eframe window.

pub mod app;
pub mod core;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod scene;
pub mod ui;
pub mod upload;
