pub mod annotator;
pub mod confidence;
pub mod overlay;
pub mod response;
pub mod transform;
pub mod types;
