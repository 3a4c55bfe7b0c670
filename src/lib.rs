pub mod candidate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod optimizer;
pub mod output;
pub mod server;
