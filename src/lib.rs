pub mod browse;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod scanner;
pub mod session;
pub mod table;
