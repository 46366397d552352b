pub mod auth;
pub mod builder;
pub mod cli;
pub mod config;
pub mod constants;
pub mod image;
pub mod manifest;
pub mod market;
pub mod notify;
pub mod registry;
pub mod release;
pub mod worker;

pub use anyhow::Result;
