//! Post-processing of fusor particle snapshots: load, enrich, filter,
//! summarise and plot.

pub mod analysis;
pub mod app;
pub mod batch;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod render;
pub mod report;
pub mod session;
pub mod state;
pub mod ui;

pub use error::{Error, Result};
