pub mod config;
pub mod data_core;
pub mod performance;
pub mod table;
pub mod view_index;
