//! In-process surface with no display attached.
//!
//! Keeps the same geometry a browser scroll container would (spacer height,
//! clamped scroll offset, mounted nodes) so the renderer can run inside the
//! server and under test.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::render::{ListenerId, RenderSurface, ResizeNotifier};

// == Headless Surface ==
#[derive(Debug)]
pub struct HeadlessSurface<N> {
    attached: bool,
    scroll_top: f64,
    viewport_height: f64,
    content_height: f64,
    window_offset: f64,
    nodes: BTreeMap<usize, N>,
    mounts: u64,
    listeners: HashSet<ListenerId>,
    next_listener: u64,
}

impl<N> HeadlessSurface<N> {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            attached: true,
            scroll_top: 0.0,
            viewport_height: viewport_height.max(0.0),
            content_height: 0.0,
            window_offset: 0.0,
            nodes: BTreeMap::new(),
            mounts: 0,
            listeners: HashSet::new(),
            next_listener: 1,
        }
    }

    /// A surface whose container is missing.
    pub fn detached() -> Self {
        Self {
            attached: false,
            ..Self::new(0.0)
        }
    }

    /// Simulates the user scrolling. Returns the clamped offset.
    pub fn scroll_to(&mut self, top: f64) -> f64 {
        self.set_scroll_top(top);
        self.scroll_top
    }

    /// Simulates the container changing size.
    pub fn resize_viewport(&mut self, height: f64) {
        self.viewport_height = height.max(0.0);
        self.clamp_scroll();
    }

    pub fn nodes(&self) -> &BTreeMap<usize, N> {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&N> {
        self.nodes.get(&index)
    }

    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    pub fn window_offset(&self) -> f64 {
        self.window_offset
    }

    /// Total nodes mounted over the surface's lifetime.
    pub fn mounts(&self) -> u64 {
        self.mounts
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn max_scroll(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    fn clamp_scroll(&mut self) {
        self.scroll_top = self.scroll_top.clamp(0.0, self.max_scroll());
    }
}

impl<N> RenderSurface for HeadlessSurface<N> {
    type Node = N;

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: f64) {
        self.scroll_top = if top.is_finite() { top } else { 0.0 };
        self.clamp_scroll();
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn set_content_height(&mut self, height: f64) {
        self.content_height = height.max(0.0);
        self.clamp_scroll();
    }

    fn set_window_offset(&mut self, offset: f64) {
        self.window_offset = offset;
    }

    fn replace_window(&mut self, nodes: Vec<(usize, N)>) {
        self.mounts += nodes.len() as u64;
        self.nodes = nodes.into_iter().collect();
    }

    fn replace_node(&mut self, index: usize, node: N) {
        self.mounts += 1;
        self.nodes.insert(index, node);
    }

    fn add_scroll_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id);
        id
    }

    fn remove_scroll_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }
}

// == Resize Bus ==
/// Registry of process-wide resize listeners.
///
/// It only records who is subscribed so leaks show up in
/// `listener_count`. Resize events themselves reach a renderer when its
/// host calls `ViewportRenderer::on_resize`.
#[derive(Debug, Default)]
pub struct ResizeBus {
    listeners: Mutex<HashSet<ListenerId>>,
    next: AtomicU64,
}

impl ResizeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl ResizeNotifier for ResizeBus {
    fn subscribe(&self) -> ListenerId {
        let id = ListenerId(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id);
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id);
    }
}
