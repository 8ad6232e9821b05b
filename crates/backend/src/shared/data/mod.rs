pub mod db;
pub mod populate_loader;
pub mod repository;
