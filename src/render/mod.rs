//! Rendering of assembled pages through the render-phase state machine.

pub mod renderer;

pub use renderer::{RenderStats, render_element, render_page};
