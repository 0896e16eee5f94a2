mod json;
pub mod moc;
pub mod model3;
pub mod physics3;

pub use json::JsonError;
