//! Presentation: the dashboard view model and its terminal rendering.
pub mod data;
pub mod render;

pub use data::Dashboard;
