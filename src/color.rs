pub mod mix;
pub mod sample;
