pub mod camera;
pub mod light;
pub mod material;
pub mod mesh;
pub mod model;
pub mod normalize;
pub mod orbit;
pub mod stage;
pub mod texture;
