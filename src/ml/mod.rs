pub mod detector;
pub mod engine;
pub mod window;
