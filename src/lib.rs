//! Filter-aggregate pipeline behind the streaming and campaign dashboard.
//!
//! The `data` module is UI-free and can be driven directly; `state` and `ui`
//! wire it to an egui front end.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
