#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use wayfarer_engine::config::{EngineConfig, FieldSource};
use wayfarer_engine::coords::{Extent, Rect};
use wayfarer_engine::device::{GpuService, SoftService, TargetDesc, TargetId};
use wayfarer_engine::host::{CanvasHost, FrameInfo, ViewportPainter};
use wayfarer_engine::paint::Color;
use wayfarer_engine::tunnel::{AnchorId, Renderable, StaticLayout};

pub const CANVAS: Extent = Extent::new(64, 48);

/// A host clock with synthetic instants.
pub struct Clock {
    pub start: Instant,
    pub now: Instant,
}

impl Clock {
    pub fn new() -> Self {
        let start = Instant::now();
        Self { start, now: start }
    }

    pub fn advance_ms(&mut self, ms: u64) -> Instant {
        self.now += Duration::from_millis(ms);
        self.now
    }
}

/// A still background and no simulations: frames are exactly reproducible and
/// nothing re-requests a render on its own.
pub fn still_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.field = FieldSource::None;
    config.background.animate = false;
    config
}

pub fn soft_host(config: EngineConfig, clock: &Clock) -> CanvasHost<SoftService> {
    CanvasHost::starting_at(SoftService::new(CANVAS), config, 1.0, clock.start).unwrap()
}

pub fn layout_with(rects: &[(u64, Rect)]) -> StaticLayout {
    let mut layout = StaticLayout::new();
    for (id, rect) in rects {
        layout.set(AnchorId(*id), *rect);
    }
    layout
}

/// Fills its viewport with a flat color.
pub struct FlatCard {
    pub color: Color,
}

impl Renderable for FlatCard {
    fn draw(&mut self, painter: &mut ViewportPainter, _frame: &FrameInfo) -> anyhow::Result<()> {
        painter.fill(self.color);
        Ok(())
    }
}

/// Owns one private target for its lifetime and counts draws.
pub struct TargetCard {
    pub target: Option<TargetId>,
    pub draws: Rc<Cell<u32>>,
    pub released: Rc<Cell<bool>>,
}

impl TargetCard {
    pub fn new() -> (Self, Rc<Cell<u32>>, Rc<Cell<bool>>) {
        let draws = Rc::new(Cell::new(0));
        let released = Rc::new(Cell::new(false));
        let card = Self {
            target: None,
            draws: draws.clone(),
            released: released.clone(),
        };
        (card, draws, released)
    }
}

impl Renderable for TargetCard {
    fn attach(&mut self, gpu: &mut dyn GpuService) -> anyhow::Result<()> {
        self.target = Some(gpu.create_target(TargetDesc::new("card", Extent::new(4, 4)))?);
        Ok(())
    }

    fn draw(&mut self, painter: &mut ViewportPainter, _frame: &FrameInfo) -> anyhow::Result<()> {
        self.draws.set(self.draws.get() + 1);
        painter.fill(Color::rgb(0.0, 0.0, 1.0));
        Ok(())
    }

    fn release(&mut self, gpu: &mut dyn GpuService) {
        if let Some(t) = self.target.take() {
            gpu.release_target(t);
        }
        self.released.set(true);
    }
}
