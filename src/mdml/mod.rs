pub mod cli;
pub mod config;
pub mod error;
pub mod flows;
pub mod kafka;
pub mod schema;
