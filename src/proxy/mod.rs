pub mod stats;
pub mod transform;
pub mod upstream;
