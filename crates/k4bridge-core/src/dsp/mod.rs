pub mod level;
pub mod resample;
pub mod sample;
