pub mod bounding_box;
pub mod constants;
pub mod emotion;
pub mod frame;
pub mod model_resolver;
