pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod metadata;
pub mod nutrition;
pub mod storage;
pub mod types;
