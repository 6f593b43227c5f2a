pub mod bounds;
pub mod transform;
