pub mod capture;
pub mod detection;
pub mod media;
pub mod pipeline;
pub mod shared;
