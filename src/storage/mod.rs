pub mod clips;
pub mod temp;
