use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use winit::event::{MouseScrollDelta, WindowEvent};

use wayfarer_engine::config::{EngineConfig, FieldSource, FrameLoop};
use wayfarer_engine::coords::{Rect, Vec2};
use wayfarer_engine::core::{App, AppControl, WindowHost};
use wayfarer_engine::device::GpuService;
use wayfarer_engine::host::{FrameInfo, ViewportPainter};
use wayfarer_engine::input::Key;
use wayfarer_engine::logging::{LoggingConfig, init_logging};
use wayfarer_engine::paint::Color;
use wayfarer_engine::tunnel::{AnchorId, LayoutProvider, Overlay, Renderable, StaticLayout};
use wayfarer_engine::window::{Runtime, RuntimeConfig};

/// Logical pixels per wheel line.
const SCROLL_LINE: f32 = 40.0;
const CARD_WIDTH: f32 = 260.0;
const CARD_HEIGHT: f32 = 180.0;
const GUTTER: f32 = 32.0;

#[derive(Debug, Parser)]
#[command(name = "wayfarer-studio", about = "Destination cards over a shared animated canvas")]
struct Cli {
    /// Engine config (JSON). Omitted keys take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the config's distortion field.
    #[arg(long, value_enum)]
    field: Option<FieldArg>,

    /// Renders continuously instead of on demand.
    #[arg(long)]
    always: bool,

    /// env_logger filter, e.g. "wayfarer_engine=debug".
    #[arg(long)]
    log: Option<String>,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum FieldArg {
    None,
    Flowmap,
    Fluid,
    Both,
}

impl From<FieldArg> for FieldSource {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::None => FieldSource::None,
            FieldArg::Flowmap => FieldSource::Flowmap,
            FieldArg::Fluid => FieldSource::Fluid,
            FieldArg::Both => FieldSource::Both,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let mut engine = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(field) = cli.field {
        engine.field = field.into();
    }
    if cli.always {
        engine.scheduler.frameloop = FrameLoop::Always;
    }

    let config = RuntimeConfig {
        title: "Wayfarer Studio".to_string(),
        engine,
        ..RuntimeConfig::default()
    };

    Runtime::run(config, Studio::new(DESTINATIONS))
}

struct Destination {
    name: &'static str,
    color: &'static str,
}

const DESTINATIONS: &[Destination] = &[
    Destination { name: "Lofoten", color: "#2b6f8f" },
    Destination { name: "Atacama", color: "#c8643b" },
    Destination { name: "Kyoto", color: "#a3344f" },
    Destination { name: "Patagonia", color: "#3f7a52" },
    Destination { name: "Marrakesh", color: "#d09a3a" },
    Destination { name: "Reykjavik", color: "#5a5f9e" },
];

/// A destination card: a tinted panel warped by the distortion field with a
/// solid title strip.
struct DestinationCard {
    color: Color,
    strip: Color,
}

impl Renderable for DestinationCard {
    fn draw(&mut self, painter: &mut ViewportPainter, _frame: &FrameInfo) -> Result<()> {
        let size = painter.rect().size;
        painter.fill_distorted(self.color, 0.35);
        painter.set_depth(0.4);
        painter.fill_rect(
            Rect::new(0.0, size.y - 36.0, size.x, 36.0),
            self.strip,
        );
        Ok(())
    }
}

/// Stand-in for a text label positioned over a card.
struct CardLabel {
    name: &'static str,
    last: Option<Rect>,
}

impl Overlay for CardLabel {
    fn place(&mut self, rect: Rect) {
        if self.last != Some(rect) {
            log::debug!("label {} at {:?}", self.name, rect);
            self.last = Some(rect);
        }
    }

    fn hide(&mut self) {
        if self.last.take().is_some() {
            log::debug!("label {} hidden", self.name);
        }
    }
}

struct Studio {
    destinations: &'static [Destination],
    layout: StaticLayout,
    window_width: f32,
    scroll: f32,
}

impl Studio {
    fn new(destinations: &'static [Destination]) -> Self {
        Self {
            destinations,
            layout: StaticLayout::new(),
            window_width: 1280.0,
            scroll: 0.0,
        }
    }

    /// Flows the cards left to right, wrapping at the window width.
    fn relayout(&mut self) {
        let columns = ((self.window_width - GUTTER) / (CARD_WIDTH + GUTTER)).floor().max(1.0) as usize;
        for (i, _) in self.destinations.iter().enumerate() {
            let col = (i % columns) as f32;
            let row = (i / columns) as f32;
            let origin = Vec2::new(
                GUTTER + col * (CARD_WIDTH + GUTTER),
                GUTTER + row * (CARD_HEIGHT + GUTTER) - self.scroll,
            );
            self.layout.set(
                AnchorId(i as u64),
                Rect::from_origin_size(origin, Vec2::new(CARD_WIDTH, CARD_HEIGHT)),
            );
        }
    }
}

impl App for Studio {
    fn mount(&mut self, host: &mut WindowHost<'_>) -> Result<()> {
        let canvas = host.gpu().canvas_extent();
        self.window_width = canvas.width as f32 / host.scale_factor();
        self.relayout();

        for (i, dest) in self.destinations.iter().enumerate() {
            let anchor = AnchorId(i as u64);
            let color = Color::from_hex(dest.color)
                .with_context(|| format!("bad color for {}", dest.name))?;
            let card = DestinationCard {
                color,
                strip: Color::from_straight(0.05, 0.05, 0.08, 0.85),
            };
            host.register_viewport(anchor, Box::new(card), &self.layout)?;
            host.register_overlay(
                anchor,
                Box::new(CardLabel {
                    name: dest.name,
                    last: None,
                }),
                &self.layout,
            );
        }

        log::info!("studio mounted {} destination cards", self.destinations.len());
        Ok(())
    }

    fn layout(&self) -> &dyn LayoutProvider {
        &self.layout
    }

    fn on_window_event(&mut self, host: &mut WindowHost<'_>, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::Resized(size) => {
                self.window_width = size.width as f32 / host.scale_factor();
                self.relayout();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y * SCROLL_LINE,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / host.scale_factor(),
                };
                self.scroll = (self.scroll - dy).max(0.0);
                self.relayout();
                host.notify_scroll(Instant::now());
            }
            _ => {}
        }
        AppControl::Continue
    }

    fn on_key(&mut self, host: &mut WindowHost<'_>, key: Key) -> AppControl {
        match key {
            Key::Escape => AppControl::Exit,
            Key::R => {
                log::info!("resetting simulations");
                host.reset_simulations();
                AppControl::Continue
            }
            Key::Space => {
                let next = match host.scheduler().frameloop() {
                    FrameLoop::Always => FrameLoop::Demand,
                    _ => FrameLoop::Always,
                };
                log::info!("frameloop -> {next:?}");
                host.set_frameloop(next);
                AppControl::Continue
            }
            Key::Other => AppControl::Continue,
        }
    }
}
