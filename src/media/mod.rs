pub mod decoder;
pub mod probe;
pub mod writer;
