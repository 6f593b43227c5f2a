pub mod app;
pub mod dialogs;
pub mod intake;
pub mod memory;
pub mod sections;
pub mod theme;
pub mod viewer;
