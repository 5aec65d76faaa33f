//! Viewport registry and tunnel.
//!
//! Two relays share one sink: 3D content (`Renderable`, drawn into the shared
//! canvas) and DOM overlays (`Overlay`, placed over it). Producers register
//! in any order and are visited in registration order once per frame.
//!
//! Anchor rects are refreshed:
//! - on scroll/window resize, through one shared debounced listener
//! - on an element's own size change, for that element only

mod layout;
mod relay;
mod renderable;

use std::time::{Duration, Instant};

use anyhow::Context;

use crate::coords::{Rect, Vec2};
use crate::device::GpuService;
use crate::time::Debouncer;

pub use layout::{AnchorId, LayoutProvider, StaticLayout};
pub use relay::Relay;
pub use renderable::{Overlay, Renderable};

/// Opaque registration handle for a 3D viewport.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ViewportHandle(u64);

/// Opaque registration handle for an overlay.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct OverlayHandle(u64);

/// Where an anchor currently sits on the canvas.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Placement {
    /// Logical pixels, relative to the canvas origin.
    pub rect: Rect,
    pub visible: bool,
}

impl Placement {
    fn measure(layout: &dyn LayoutProvider, anchor: AnchorId, origin: Vec2) -> Self {
        match layout.bounding_rect(anchor) {
            Some(rect) => Self {
                rect: rect.relative_to(origin),
                visible: layout.is_visible(anchor),
            },
            None => Self::default(),
        }
    }

    /// Whether the sink should draw this entry at all.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.visible && self.rect.is_finite() && !self.rect.is_empty()
    }
}

pub(crate) struct ViewportEntry {
    anchor: AnchorId,
    pub(crate) placement: Placement,
    pub(crate) renderable: Box<dyn Renderable>,
}

struct OverlayEntry {
    anchor: AnchorId,
    placement: Placement,
    overlay: Box<dyn Overlay>,
}

/// Multi-producer, single-consumer registry of viewports and overlays.
pub struct Tunnel {
    content: Relay<ViewportEntry>,
    overlays: Relay<OverlayEntry>,
    next_id: u64,
    canvas_origin: Vec2,
    listener: Debouncer,
    resized: Vec<ViewportHandle>,
    stale: bool,
}

impl Tunnel {
    pub fn new(layout_debounce: Duration) -> Self {
        Self {
            content: Relay::new(),
            overlays: Relay::new(),
            next_id: 1,
            canvas_origin: Vec2::zero(),
            listener: Debouncer::new(layout_debounce),
            resized: Vec::new(),
            stale: false,
        }
    }

    /// The canvas' fixed position in layout coordinates.
    pub fn set_canvas_origin(&mut self, origin: Vec2) {
        self.canvas_origin = origin;
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Registers `renderable` to follow `anchor`. The anchor is measured
    /// immediately. Fails only if the renderable cannot allocate its resources.
    pub fn register(
        &mut self,
        gpu: &mut dyn GpuService,
        anchor: AnchorId,
        mut renderable: Box<dyn Renderable>,
        layout: &dyn LayoutProvider,
    ) -> anyhow::Result<ViewportHandle> {
        renderable
            .attach(gpu)
            .with_context(|| format!("failed to attach viewport for anchor {}", anchor.0))?;

        let id = self.next_id();
        let placement = Placement::measure(layout, anchor, self.canvas_origin);
        self.content.insert(
            id,
            ViewportEntry {
                anchor,
                placement,
                renderable,
            },
        );
        log::debug!("viewport {id} registered at {:?}", placement.rect);
        Ok(ViewportHandle(id))
    }

    /// Removes a viewport and releases its resources. Unknown or already
    /// removed handles return `false`.
    pub fn unregister(&mut self, gpu: &mut dyn GpuService, handle: ViewportHandle) -> bool {
        let Some(mut entry) = self.content.remove(handle.0) else {
            return false;
        };
        entry.renderable.release(gpu);
        self.resized.retain(|h| *h != handle);
        log::debug!("viewport {} unregistered", handle.0);
        true
    }

    pub fn register_overlay(
        &mut self,
        anchor: AnchorId,
        overlay: Box<dyn Overlay>,
        layout: &dyn LayoutProvider,
    ) -> OverlayHandle {
        let id = self.next_id();
        let placement = Placement::measure(layout, anchor, self.canvas_origin);
        self.overlays.insert(
            id,
            OverlayEntry {
                anchor,
                placement,
                overlay,
            },
        );
        OverlayHandle(id)
    }

    pub fn unregister_overlay(&mut self, handle: OverlayHandle) -> bool {
        match self.overlays.remove(handle.0) {
            Some(mut entry) => {
                entry.overlay.hide();
                true
            }
            None => false,
        }
    }

    /// Shared listener input: the page scrolled.
    pub fn notify_scroll(&mut self, now: Instant) {
        self.listener.poke(now);
    }

    /// Shared listener input: the window resized.
    pub fn notify_resize(&mut self, now: Instant) {
        self.listener.poke(now);
    }

    /// Per-element observer input: only `handle` is re-measured on the next refresh.
    pub fn notify_element_resized(&mut self, handle: ViewportHandle) {
        if self.content.contains(handle.0) && !self.resized.contains(&handle) {
            self.resized.push(handle);
        }
    }

    /// Re-measures what the listeners asked for. Returns `true` when any
    /// placement changed.
    pub fn refresh(&mut self, layout: &dyn LayoutProvider, now: Instant) -> bool {
        if self.listener.fire(now) || std::mem::take(&mut self.stale) {
            self.resized.clear();
            return self.refresh_all(layout);
        }

        let mut changed = false;
        let origin = self.canvas_origin;
        for handle in std::mem::take(&mut self.resized) {
            if let Some(entry) = self.content.get_mut(handle.0) {
                let placement = Placement::measure(layout, entry.anchor, origin);
                changed |= placement != entry.placement;
                entry.placement = placement;
            }
        }
        changed
    }

    /// Forces a full re-measure on the next refresh, skipping the debounce.
    pub fn invalidate_layout(&mut self) {
        self.stale = true;
    }

    /// Re-measures every anchor.
    pub fn refresh_all(&mut self, layout: &dyn LayoutProvider) -> bool {
        let origin = self.canvas_origin;
        let mut changed = false;
        for (_, entry) in self.content.iter_mut() {
            let placement = Placement::measure(layout, entry.anchor, origin);
            changed |= placement != entry.placement;
            entry.placement = placement;
        }
        for (_, entry) in self.overlays.iter_mut() {
            let placement = Placement::measure(layout, entry.anchor, origin);
            changed |= placement != entry.placement;
            entry.placement = placement;
        }
        changed
    }

    /// Whether a listener refresh is waiting for its quiet period.
    pub fn is_refresh_pending(&self) -> bool {
        self.stale || self.listener.is_pending() || !self.resized.is_empty()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn overlay_len(&self) -> usize {
        self.overlays.len()
    }

    pub fn contains(&self, handle: ViewportHandle) -> bool {
        self.content.contains(handle.0)
    }

    pub fn placement(&self, handle: ViewportHandle) -> Option<Placement> {
        self.content.get(handle.0).map(|e| e.placement)
    }

    /// Registered viewports in draw order.
    pub fn handles(&self) -> Vec<ViewportHandle> {
        self.content.keys().into_iter().map(ViewportHandle).collect()
    }

    /// Viewports the sink will draw this frame, in order.
    pub fn render_set(&self) -> Vec<ViewportHandle> {
        self.content
            .iter()
            .filter(|(_, e)| e.placement.is_drawable())
            .map(|(id, _)| ViewportHandle(id))
            .collect()
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = (ViewportHandle, &mut ViewportEntry)> {
        self.content.iter_mut().map(|(id, e)| (ViewportHandle(id), e))
    }

    /// Hands every overlay its current placement, in registration order.
    pub fn place_overlays(&mut self) {
        for (_, entry) in self.overlays.iter_mut() {
            if entry.placement.is_drawable() {
                entry.overlay.place(entry.placement.rect);
            } else {
                entry.overlay.hide();
            }
        }
    }

    /// Releases every viewport and drops every overlay.
    pub fn clear(&mut self, gpu: &mut dyn GpuService) {
        for (_, mut entry) in self.content.drain() {
            entry.renderable.release(gpu);
        }
        for (_, mut entry) in self.overlays.drain() {
            entry.overlay.hide();
        }
        self.resized.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::coords::Extent;
    use crate::device::SoftService;
    use crate::host::{FrameInfo, ViewportPainter};

    struct Probe {
        released: Rc<RefCell<u32>>,
    }

    impl Renderable for Probe {
        fn draw(&mut self, _: &mut ViewportPainter, _: &FrameInfo) -> anyhow::Result<()> {
            Ok(())
        }

        fn release(&mut self, _: &mut dyn GpuService) {
            *self.released.borrow_mut() += 1;
        }
    }

    struct Failing;

    impl Renderable for Failing {
        fn attach(&mut self, _: &mut dyn GpuService) -> anyhow::Result<()> {
            anyhow::bail!("no memory")
        }

        fn draw(&mut self, _: &mut ViewportPainter, _: &FrameInfo) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Label {
        placed: Rc<RefCell<Vec<Rect>>>,
    }

    impl Overlay for Label {
        fn place(&mut self, rect: Rect) {
            self.placed.borrow_mut().push(rect);
        }
    }

    fn layout() -> StaticLayout {
        let mut layout = StaticLayout::new();
        layout.set(AnchorId(1), Rect::new(0.0, 0.0, 10.0, 10.0));
        layout.set(AnchorId(2), Rect::new(20.0, 0.0, 10.0, 10.0));
        layout.set(AnchorId(3), Rect::new(40.0, 0.0, 0.0, 10.0));
        layout
    }

    fn probe(released: &Rc<RefCell<u32>>) -> Box<dyn Renderable> {
        Box::new(Probe {
            released: released.clone(),
        })
    }

    #[test]
    fn unregister_releases_exactly_once() {
        let mut gpu = SoftService::new(Extent::new(4, 4));
        let mut tunnel = Tunnel::new(Duration::from_millis(100));
        let released = Rc::new(RefCell::new(0));
        let layout = layout();

        let a = tunnel.register(&mut gpu, AnchorId(1), probe(&released), &layout).unwrap();
        let b = tunnel.register(&mut gpu, AnchorId(2), probe(&released), &layout).unwrap();
        assert_eq!(tunnel.len(), 2);

        assert!(tunnel.unregister(&mut gpu, a));
        assert!(!tunnel.unregister(&mut gpu, a));
        assert_eq!(*released.borrow(), 1);
        assert_eq!(tunnel.handles(), vec![b]);
    }

    #[test]
    fn failed_attach_registers_nothing() {
        let mut gpu = SoftService::new(Extent::new(4, 4));
        let mut tunnel = Tunnel::new(Duration::from_millis(100));
        let err = tunnel.register(&mut gpu, AnchorId(1), Box::new(Failing), &layout());
        assert!(err.is_err());
        assert!(tunnel.is_empty());
    }

    #[test]
    fn zero_area_anchor_is_skipped_not_dropped() {
        let mut gpu = SoftService::new(Extent::new(4, 4));
        let mut tunnel = Tunnel::new(Duration::from_millis(100));
        let released = Rc::new(RefCell::new(0));
        let layout = layout();

        let a = tunnel.register(&mut gpu, AnchorId(1), probe(&released), &layout).unwrap();
        let flat = tunnel.register(&mut gpu, AnchorId(3), probe(&released), &layout).unwrap();
        let detached = tunnel.register(&mut gpu, AnchorId(9), probe(&released), &layout).unwrap();

        assert_eq!(tunnel.len(), 3);
        assert_eq!(tunnel.render_set(), vec![a]);
        assert!(tunnel.contains(flat));
        assert!(!tunnel.placement(detached).unwrap().visible);
    }

    #[test]
    fn scroll_storm_refreshes_once_after_quiet_period() {
        let mut gpu = SoftService::new(Extent::new(4, 4));
        let mut tunnel = Tunnel::new(Duration::from_millis(100));
        let released = Rc::new(RefCell::new(0));
        let mut layout = layout();
        let a = tunnel.register(&mut gpu, AnchorId(1), probe(&released), &layout).unwrap();

        layout.set(AnchorId(1), Rect::new(0.0, 50.0, 10.0, 10.0));
        let t0 = Instant::now();
        for i in 0..10 {
            let now = t0 + Duration::from_millis(i * 16);
            tunnel.notify_scroll(now);
            assert!(!tunnel.refresh(&layout, now));
        }
        assert_eq!(tunnel.placement(a).unwrap().rect.origin.y, 0.0);

        assert!(tunnel.refresh(&layout, t0 + Duration::from_millis(144 + 100)));
        assert_eq!(tunnel.placement(a).unwrap().rect.origin.y, 50.0);
        assert!(!tunnel.is_refresh_pending());
    }

    #[test]
    fn element_observer_refreshes_only_that_viewport() {
        let mut gpu = SoftService::new(Extent::new(4, 4));
        let mut tunnel = Tunnel::new(Duration::from_millis(100));
        let released = Rc::new(RefCell::new(0));
        let mut layout = layout();
        let a = tunnel.register(&mut gpu, AnchorId(1), probe(&released), &layout).unwrap();
        let b = tunnel.register(&mut gpu, AnchorId(2), probe(&released), &layout).unwrap();

        layout.set(AnchorId(1), Rect::new(0.0, 0.0, 30.0, 30.0));
        layout.set(AnchorId(2), Rect::new(0.0, 0.0, 30.0, 30.0));
        tunnel.notify_element_resized(b);

        assert!(tunnel.refresh(&layout, Instant::now()));
        assert_eq!(tunnel.placement(a).unwrap().rect.size.x, 10.0);
        assert_eq!(tunnel.placement(b).unwrap().rect.size.x, 30.0);
    }

    #[test]
    fn overlays_are_placed_relative_to_canvas_origin() {
        let mut tunnel = Tunnel::new(Duration::from_millis(100));
        tunnel.set_canvas_origin(Vec2::new(5.0, 0.0));
        let label = Label::default();
        let placed = label.placed.clone();

        let h = tunnel.register_overlay(AnchorId(2), Box::new(label), &layout());
        tunnel.place_overlays();
        assert_eq!(placed.borrow().as_slice(), &[Rect::new(15.0, 0.0, 10.0, 10.0)]);

        assert!(tunnel.unregister_overlay(h));
        assert_eq!(tunnel.overlay_len(), 0);
    }
}
