//! The upload flow: validating dropped files, tracking the viewer's load state,
//! and running decodes off the UI thread.

pub mod intake;
pub mod session;
pub mod worker;
