pub mod fit;
pub mod geometry;
