use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::EngineConfig;
use crate::coords::Extent;
use crate::core::{App, AppControl};
use crate::device::{GpuInit, WgpuService};
use crate::host::{CanvasHost, TickOutcome};
use crate::input::InputEvent;
use crate::input::platform::translate_window_event;

/// How long the loop sleeps while only debounced work is pending.
const DEBOUNCE_POLL: Duration = Duration::from_millis(16);

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub gpu: GpuInit,
    pub engine: EngineConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "wayfarer".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            gpu: GpuInit::default(),
            engine: EngineConfig::default(),
        }
    }
}

/// Entry point for the runtime.
///
/// The loop sleeps until something happens. A redraw is requested only when
/// the host's scheduler has pending work, so an idle canvas costs nothing.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(config: RuntimeConfig, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    host: CanvasHost<WgpuService<'this>>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    app: A,
    entry: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, app: A) -> Self {
        Self {
            config,
            app,
            entry: None,
            failure: None,
            exit_requested: false,
        }
    }

    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.config.gpu.clone();
        let engine = self.config.engine.clone();

        WindowEntryTryBuilder {
            window,
            host_builder: |w| {
                let gpu = pollster::block_on(WgpuService::new(w, gpu_init))
                    .context("GPU initialization failed for window")?;
                CanvasHost::new(gpu, engine, w.scale_factor() as f32)
            },
        }
        .try_build()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn handle_control(&mut self, event_loop: &ActiveEventLoop, control: AppControl) {
        if control == AppControl::Exit {
            self.exit_requested = true;
            event_loop.exit();
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        let mut entry = match self.create_entry(event_loop) {
            Ok(entry) => entry,
            Err(err) => return self.fail(event_loop, err),
        };

        let app = &mut self.app;
        if let Err(err) = entry.with_host_mut(|host| app.mount(host)) {
            return self.fail(event_loop, err.context("app failed to mount"));
        }

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.entry.as_mut() else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        let now = Instant::now();
        let layout = self.app.layout();
        let (render_due, waiting) = entry.with_host_mut(|host| {
            let due = host.poll(now, layout);
            (due, host.needs_tick())
        });

        if render_due {
            entry.with_window(|w| w.request_redraw());
        }

        if waiting && !render_due {
            event_loop.set_control_flow(ControlFlow::WaitUntil(now + DEBOUNCE_POLL));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let (app, entry) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        let now = Instant::now();
        let mut control = AppControl::Continue;

        entry.with_mut(|fields| {
            let host = fields.host;
            let window = fields.window;

            if let Some(input) = translate_window_event(window, &event) {
                host.handle_input(&input, now);
                if let InputEvent::KeyPressed(key) = input {
                    control = app.on_key(host, key);
                }
            }

            match &event {
                WindowEvent::Resized(size) => {
                    host.resize(
                        Extent::new(size.width, size.height),
                        window.scale_factor() as f32,
                        now,
                    );
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    let size = window.inner_size();
                    host.resize(Extent::new(size.width, size.height), *scale_factor as f32, now);
                }
                WindowEvent::RedrawRequested => {
                    let mut outcome = host.tick(now, app.layout());
                    if outcome == TickOutcome::ContextLost {
                        outcome = match host.remount(now) {
                            Ok(()) => TickOutcome::Skipped,
                            Err(err) => {
                                log::error!("remount failed: {err:#}");
                                TickOutcome::ContextLost
                            }
                        };
                    }
                    if outcome == TickOutcome::Rendered {
                        window.pre_present_notify();
                    }
                    if control == AppControl::Continue {
                        control = app.on_frame(host, outcome);
                    }
                }
                _ => {}
            }

            if control == AppControl::Continue {
                control = app.on_window_event(host, &event);
            }
        });

        if matches!(event, WindowEvent::CloseRequested) {
            control = AppControl::Exit;
        }

        if control == AppControl::Exit {
            // Drop the host (and its surface) before the window goes away.
            self.entry = None;
        }
        self.handle_control(event_loop, control);
    }
}
