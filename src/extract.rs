pub mod average;
pub mod idle;
pub mod median_cut;
pub mod pipeline;
