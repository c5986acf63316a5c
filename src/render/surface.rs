//! Collaborators the renderer draws into and listens to.

use serde::Serialize;

/// Handle returned when registering a listener, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ListenerId(pub u64);

// == Render Surface ==
/// A scrollable container holding a spacer sized to the whole list and a
/// positioned block with the rendered items.
pub trait RenderSurface {
    /// What one rendered item becomes on this surface.
    type Node;

    /// Whether the container exists and can be drawn into.
    fn is_attached(&self) -> bool;

    fn scroll_top(&self) -> f64;

    /// Moves the scroll position. The surface may clamp it and is expected
    /// to deliver a scroll event afterwards.
    fn set_scroll_top(&mut self, top: f64);

    /// Visible height of the container.
    fn viewport_height(&self) -> f64;

    /// Sizes the spacer so the native scroll range matches the list.
    fn set_content_height(&mut self, height: f64);

    /// Positions the rendered block with a single offset.
    fn set_window_offset(&mut self, offset: f64);

    /// Unmounts every rendered item and mounts `nodes` in their place.
    fn replace_window(&mut self, nodes: Vec<(usize, Self::Node)>);

    /// Re-renders the single mounted item for `index`.
    fn replace_node(&mut self, index: usize, node: Self::Node);

    fn add_scroll_listener(&mut self) -> ListenerId;

    fn remove_scroll_listener(&mut self, id: ListenerId);
}

// == Resize Notifier ==
/// Process-wide resize subscriptions. Subscribing marks interest;
/// delivery is the host's job and ends in `ViewportRenderer::on_resize`.
pub trait ResizeNotifier: Send + Sync + std::fmt::Debug {
    fn subscribe(&self) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId);
}
