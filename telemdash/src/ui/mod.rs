//! UI module root: exposes drawing functions for individual panels.

pub mod command;
pub mod events;
pub mod header;
pub mod summary;
pub mod telemetry;
pub mod trends;
pub mod util;
