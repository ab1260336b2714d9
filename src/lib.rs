#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod hackernews;
pub mod launcher;
pub mod markdown;
pub mod query;
pub mod ui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::{run, run_print};
