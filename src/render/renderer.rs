//! Viewport Renderer
//!
//! Renders only the slice of a list that intersects the viewport, plus a
//! buffer on each side, while the spacer keeps the full scroll geometry.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::RenderError;
use crate::render::viewport::validate_item_height;
use crate::render::{
    compute_range, ListenerId, RenderSurface, ResizeNotifier, ViewportConfig, ViewportState,
    VisibleRange,
};

/// Turns one item at an absolute index into a surface node.
pub type RenderFn<T, N> = Box<dyn Fn(&T, usize) -> N + Send + Sync>;

/// Lifecycle of a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Constructed, no data yet
    Uninitialized,
    Ready,
    /// Listeners released; events are ignored
    Destroyed,
}

// == Viewport Renderer ==
pub struct ViewportRenderer<T, S: RenderSurface> {
    surface: S,
    resize: Arc<dyn ResizeNotifier>,
    render_item: RenderFn<T, S::Node>,
    items: Vec<T>,
    config: ViewportConfig,
    container_height: f64,
    /// Scroll offset the current window was rendered for
    rendered_at: f64,
    range: Option<VisibleRange>,
    phase: Phase,
    scroll_listener: Option<ListenerId>,
    resize_listener: Option<ListenerId>,
    window_renders: u64,
}

impl<T, S: RenderSurface> std::fmt::Debug for ViewportRenderer<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportRenderer")
            .field("len", &self.items.len())
            .field("config", &self.config)
            .field("range", &self.range)
            .field("phase", &self.phase)
            .finish()
    }
}

impl<T, S: RenderSurface> ViewportRenderer<T, S> {
    // == Constructor ==
    /// Binds a renderer to `surface` and registers its scroll and resize
    /// listeners.
    ///
    /// Fails immediately if the surface is not attached or the geometry is
    /// unusable; a renderer that constructs successfully can always draw.
    pub fn new<F>(
        mut surface: S,
        resize: Arc<dyn ResizeNotifier>,
        config: ViewportConfig,
        render_item: F,
    ) -> Result<Self, RenderError>
    where
        F: Fn(&T, usize) -> S::Node + Send + Sync + 'static,
    {
        if !surface.is_attached() {
            return Err(RenderError::SurfaceNotFound(
                "scroll container is not attached".to_string(),
            ));
        }
        config.validate()?;

        let container_height = surface.viewport_height();
        let scroll_listener = surface.add_scroll_listener();
        let resize_listener = resize.subscribe();

        Ok(Self {
            surface,
            resize,
            render_item: Box::new(render_item),
            items: Vec::new(),
            config,
            container_height,
            rendered_at: 0.0,
            range: None,
            phase: Phase::Uninitialized,
            scroll_listener: Some(scroll_listener),
            resize_listener: Some(resize_listener),
            window_renders: 0,
        })
    }

    // == Data ==
    /// Replaces the whole list and re-renders the window.
    pub fn set_data(&mut self, items: Vec<T>) {
        if self.phase == Phase::Destroyed {
            return;
        }
        self.items = items;
        self.phase = Phase::Ready;
        self.sync_content_height();
        self.render_window();
    }

    /// Merges `patch` into the item at `index`.
    ///
    /// Only that one node is re-rendered, and only when it is currently on
    /// screen. Returns whether it was.
    pub fn update_item<P>(&mut self, index: usize, patch: P) -> Result<bool, RenderError>
    where
        P: FnOnce(&mut T),
    {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(RenderError::IndexOutOfRange { index, len })?;
        patch(item);

        let visible = self.phase == Phase::Ready && self.range.is_some_and(|r| r.contains(index));
        if visible {
            let node = (self.render_item)(&self.items[index], index);
            self.surface.replace_node(index, node);
            trace!(index, "re-rendered single item");
        }
        Ok(visible)
    }

    /// Inserts `item` before `index` (or at the end when `index == len`).
    pub fn insert_item(&mut self, index: usize, item: T) -> Result<(), RenderError> {
        let len = self.items.len();
        if index > len {
            return Err(RenderError::IndexOutOfRange { index, len });
        }
        self.items.insert(index, item);
        self.after_structural_change();
        Ok(())
    }

    /// Removes and returns the item at `index`.
    pub fn remove_item(&mut self, index: usize) -> Result<T, RenderError> {
        let len = self.items.len();
        if index >= len {
            return Err(RenderError::IndexOutOfRange { index, len });
        }
        let removed = self.items.remove(index);
        self.after_structural_change();
        Ok(removed)
    }

    // == Geometry ==
    /// Changes the fixed item height, rescaling the scroll range.
    pub fn set_item_height(&mut self, item_height: f64) -> Result<(), RenderError> {
        validate_item_height(item_height)?;
        self.config.item_height = item_height;
        if self.phase != Phase::Destroyed {
            self.sync_content_height();
            self.render_window();
        }
        Ok(())
    }

    /// Scrolls so that `index` is at the top of the viewport.
    ///
    /// Only moves the scroll position; the window is recomputed by the
    /// scroll handler when the surface reports the scroll.
    pub fn scroll_to_index(&mut self, index: usize) {
        if self.items.is_empty() || self.phase == Phase::Destroyed {
            return;
        }
        let index = index.min(self.items.len() - 1);
        self.surface
            .set_scroll_top(index as f64 * self.config.item_height);
    }

    // == Events ==
    /// Scroll handler. Re-renders only once the scroll moved by more than
    /// half an item since the last render.
    pub fn on_scroll(&mut self) {
        if self.phase != Phase::Ready {
            return;
        }
        let delta = (self.surface.scroll_top() - self.rendered_at).abs();
        if delta > self.config.item_height / 2.0 {
            self.render_window();
        } else {
            trace!(delta, "scroll below re-render threshold");
        }
    }

    /// Resize handler. Picks up the new container height without moving
    /// the scroll position.
    pub fn on_resize(&mut self) {
        if self.phase == Phase::Destroyed {
            return;
        }
        self.container_height = self.surface.viewport_height();
        if self.phase == Phase::Ready {
            self.render_window();
        }
    }

    // == Teardown ==
    /// Unregisters the scroll and resize listeners and unmounts every node.
    /// Calling it again does nothing.
    pub fn destroy(&mut self) {
        if let Some(id) = self.scroll_listener.take() {
            self.surface.remove_scroll_listener(id);
        }
        if let Some(id) = self.resize_listener.take() {
            self.resize.unsubscribe(id);
        }
        if self.phase != Phase::Destroyed {
            self.surface.replace_window(Vec::new());
            self.range = None;
            self.phase = Phase::Destroyed;
            debug!("viewport renderer destroyed");
        }
    }

    // == Accessors ==
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn visible_range(&self) -> Option<VisibleRange> {
        self.range
    }

    /// Items in the rendered window with their absolute indices.
    pub fn visible_items(&self) -> Vec<(usize, &T)> {
        match self.range {
            Some(range) => range.indices().map(|i| (i, &self.items[i])).collect(),
            None => Vec::new(),
        }
    }

    pub fn total_height(&self) -> f64 {
        self.items.len() as f64 * self.config.item_height
    }

    pub fn config(&self) -> ViewportConfig {
        self.config
    }

    /// Number of full window renders so far.
    pub fn window_renders(&self) -> u64 {
        self.window_renders
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the surface, for delivering user input to it.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn state(&self) -> ViewportState {
        ViewportState {
            scroll_top: self.surface.scroll_top(),
            container_height: self.container_height,
            item_height: self.config.item_height,
            buffer: self.config.buffer,
            total_height: self.total_height(),
            window_offset: self.window_offset(),
            range: self.range,
        }
    }

    // == Internals ==
    fn window_offset(&self) -> f64 {
        self.range
            .map_or(0.0, |r| r.start as f64 * self.config.item_height)
    }

    fn sync_content_height(&mut self) {
        let total = self.total_height();
        self.surface.set_content_height(total);
    }

    fn after_structural_change(&mut self) {
        if self.phase == Phase::Uninitialized {
            self.phase = Phase::Ready;
        }
        if self.phase == Phase::Ready {
            self.sync_content_height();
            self.render_window();
        }
    }

    /// Discards the mounted nodes and renders `[start, end]` afresh.
    fn render_window(&mut self) {
        let scroll_top = self.surface.scroll_top();
        self.range = compute_range(
            scroll_top,
            self.container_height,
            self.config.item_height,
            self.items.len(),
            self.config.buffer,
        );

        let nodes = match self.range {
            Some(range) => range
                .indices()
                .map(|i| (i, (self.render_item)(&self.items[i], i)))
                .collect(),
            None => Vec::new(),
        };

        self.surface.replace_window(nodes);
        self.surface.set_window_offset(self.window_offset());
        self.rendered_at = scroll_top;
        self.window_renders += 1;
        debug!(range = ?self.range, scroll_top, "rendered viewport window");
    }
}

impl<T, S: RenderSurface> Drop for ViewportRenderer<T, S> {
    fn drop(&mut self) {
        self.destroy();
    }
}
