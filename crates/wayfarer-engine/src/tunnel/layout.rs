use std::collections::HashMap;

use crate::coords::Rect;

/// Opaque id of a layout element a viewport or overlay follows.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// Source of anchor geometry, in logical pixels relative to the window.
pub trait LayoutProvider {
    /// `None` when the anchor is detached.
    fn bounding_rect(&self, anchor: AnchorId) -> Option<Rect>;

    fn is_visible(&self, anchor: AnchorId) -> bool {
        let _ = anchor;
        true
    }
}

/// Fixed table of anchor rects. Used by the studio's static layout and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticLayout {
    rects: HashMap<AnchorId, Rect>,
    hidden: Vec<AnchorId>,
}

impl StaticLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, anchor: AnchorId, rect: Rect) {
        self.rects.insert(anchor, rect);
    }

    pub fn remove(&mut self, anchor: AnchorId) {
        self.rects.remove(&anchor);
    }

    pub fn set_hidden(&mut self, anchor: AnchorId, hidden: bool) {
        self.hidden.retain(|a| *a != anchor);
        if hidden {
            self.hidden.push(anchor);
        }
    }
}

impl LayoutProvider for StaticLayout {
    fn bounding_rect(&self, anchor: AnchorId) -> Option<Rect> {
        self.rects.get(&anchor).copied()
    }

    fn is_visible(&self, anchor: AnchorId) -> bool {
        !self.hidden.contains(&anchor)
    }
}
