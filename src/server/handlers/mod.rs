pub mod config;
pub mod health;
pub mod knowledge;
pub mod models;
pub mod posts;
pub mod records;
