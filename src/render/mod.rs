//! Render Module
//!
//! Windowed rendering of large lists with fixed item heights.

mod headless;
mod renderer;
mod surface;
mod viewport;


pub use headless::{HeadlessSurface, ResizeBus};
pub use renderer::{Phase, RenderFn, ViewportRenderer};
pub use surface::{ListenerId, RenderSurface, ResizeNotifier};
pub use viewport::{
    compute_range, ViewportConfig, ViewportState, VisibleRange, DEFAULT_BUFFER,
    DEFAULT_ITEM_HEIGHT,
};
