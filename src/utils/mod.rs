pub mod fs;
pub mod persistence;
