//! Terminal User Interface for `feedmerge watch`.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `render` - Item list and source filter bar
//! - `status` - Status bar widget

mod input;
mod loop_runner;
mod render;
mod status;

pub use loop_runner::{run, Action};
pub use render::source_color;
