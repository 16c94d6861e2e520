pub mod handler;
pub mod normalize;
