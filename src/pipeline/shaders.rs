pub mod shadow;
pub mod standard;
