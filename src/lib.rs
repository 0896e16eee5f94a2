pub mod drawable;
pub mod formats;
pub mod instance;
pub mod math;
pub mod model;
#[cfg(feature = "opengl")]
pub mod opengl;
pub mod params;
pub mod physics;
pub mod render;
pub mod texture;
