//! Terminal rendering.
//!
//! Every view reads only [`App::view`](crate::app::App) and the trend data
//! derived from it; nothing here talks to a data source directly.

pub mod common;
pub mod congestion;
pub mod signal;
pub mod theme;
pub mod trends;

pub use theme::Theme;
