pub mod config;
pub mod data;
pub mod format;
pub mod query;
pub mod relations;
pub mod state;
