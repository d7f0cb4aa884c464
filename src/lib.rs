pub mod analysis;
pub mod config;
pub mod duck;
pub mod load;
pub mod normalize;
pub mod process;
pub mod sink;
