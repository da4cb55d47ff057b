use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use overdrive::framebuffer::Framebuffer;
use overdrive::hud::HudReadout;
use overdrive::input::KeyboardState;
use overdrive::renderer::{self, FrameStats};
use overdrive::scaler::{Upscaler, internal_size};
use overdrive::{FrameScheduler, Intents, ManualClock, SimConfig, Simulation, SystemClock};

const TITLE_REFRESH: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(author, version, about = "Pseudo-3D endless road driving", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, default_value = "./overdrive.toml")]
    config: PathBuf,

    /// Track seed (overrides config)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run this many frames offscreen with the throttle held, then exit
    #[arg(long)]
    headless: Option<u64>,
}

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    sim: Simulation,
    scheduler: FrameScheduler<SystemClock>,
    keyboard: KeyboardState,

    // Internal low-res framebuffer, stretched to the window
    fb: Framebuffer,
    upscaler: Upscaler,
    internal_height: usize,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,
    last_title: Instant,
}

impl App {
    fn new(sim: Simulation) -> Self {
        let internal_height = sim.config().render.internal_height;
        let max_dt = sim.config().max_frame_dt;
        let vp = sim.viewport();
        Self {
            window: None,
            surface: None,
            fb: Framebuffer::new(vp.width as usize, vp.height as usize),
            sim,
            scheduler: FrameScheduler::new(SystemClock::default(), max_dt),
            keyboard: KeyboardState::default(),
            upscaler: Upscaler::default(),
            internal_height,
            frame_counter: 0,
            last_fps_print: Instant::now(),
            last_title: Instant::now(),
        }
    }

    fn create_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title("overdrive")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = Rc::new(event_loop.create_window(attributes).context("create window")?);

        let context = softbuffer::Context::new(window.clone())
            .map_err(|e| anyhow::anyhow!("softbuffer context: {e}"))?;
        let surface = softbuffer::Surface::new(&context, window.clone())
            .map_err(|e| anyhow::anyhow!("softbuffer surface: {e}"))?;

        let size = window.inner_size();
        self.queue_viewport(size.width as usize, size.height as usize);

        window.request_redraw();
        self.surface = Some(surface);
        self.window = Some(window);
        Ok(())
    }

    fn queue_viewport(&mut self, dst_w: usize, dst_h: usize) {
        let (w, h) = internal_size(dst_w, dst_h, self.internal_height);
        self.sim.queue_resize(w, h);
    }

    fn redraw(&mut self, id: WindowId) -> Result<()> {
        let intents = self.keyboard.sample();
        self.scheduler.tick(&mut self.sim, intents);

        let (window, surface) = match (&self.window, &mut self.surface) {
            (Some(w), Some(s)) if w.id() == id => (w, s),
            _ => return Ok(()),
        };

        let size = window.inner_size();
        let (Some(dw), Some(dh)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            return Ok(()); // minimized
        };
        surface
            .resize(dw, dh)
            .map_err(|e| anyhow::anyhow!("resize surface: {e}"))?;

        let vp = self.sim.viewport();
        self.fb.resize(vp.width as usize, vp.height as usize);
        renderer::render(&mut self.fb, &self.sim);

        let src = self.fb.dimensions();
        let dst = (dw.get() as usize, dh.get() as usize);
        if !self.upscaler.matches(src, dst) {
            self.upscaler = Upscaler::new(src.0, src.1, dst.0, dst.1);
        }

        let mut buf = surface
            .buffer_mut()
            .map_err(|e| anyhow::anyhow!("buffer_mut: {e}"))?;
        self.upscaler.blit(self.fb.pixels(), &mut buf);
        buf.present().map_err(|e| anyhow::anyhow!("present: {e}"))?;

        let now = Instant::now();
        if now.duration_since(self.last_title) >= TITLE_REFRESH {
            let hud = HudReadout::from_state(self.sim.vehicle());
            window.set_title(&format!("overdrive | {hud}"));
            self.last_title = now;
        }

        self.frame_counter += 1;
        let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
        if elapsed >= 1.0 {
            info!("FPS: {:.1}", self.frame_counter as f32 / elapsed);
            self.frame_counter = 0;
            self.last_fps_print = now;
        }

        window.request_redraw();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_surface(event_loop) {
            error!("{e:#}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested; stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => self.keyboard.handle_key(code, state, repeat),

            WindowEvent::Focused(false) => self.keyboard.release_all(),

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw(id) {
                    warn!("frame skipped: {e:#}");
                }
            }

            WindowEvent::Resized(new_size) => {
                self.queue_viewport(new_size.width as usize, new_size.height as usize);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Drive the simulation offscreen at a fixed 60 Hz with the throttle held.
fn run_headless(mut sim: Simulation, frames: u64) -> FrameStats {
    let clock = ManualClock::default();
    let mut scheduler = FrameScheduler::new(clock.clone(), sim.config().max_frame_dt);
    let vp = sim.viewport();
    let mut fb = Framebuffer::new(vp.width as usize, vp.height as usize);
    let throttle = Intents {
        accelerate: true,
        ..Intents::default()
    };

    let started = Instant::now();
    let mut stats = FrameStats::default();
    for _ in 0..frames {
        clock.advance(Duration::from_micros(16_667));
        scheduler.tick(&mut sim, throttle);
        stats = renderer::render(&mut fb, &sim);
    }

    let wall = started.elapsed().as_secs_f32();
    info!(
        frames = scheduler.frames(),
        wall_secs = wall,
        visible = stats.visible_segments,
        sprites = stats.sprites_drawn,
        "headless run finished: {}",
        HudReadout::from_state(sim.vehicle())
    );
    stats
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut config = SimConfig::load_or_default(&args.config);
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let (w, h) = internal_size(1280, 720, config.render.internal_height);
    let sim = Simulation::new(config, w, h).context("failed to build simulation")?;

    if let Some(frames) = args.headless {
        run_headless(sim, frames);
        return Ok(());
    }

    let event_loop = EventLoop::new().context("create event loop")?;
    // Poll keeps frames coming even without input events
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(sim);
    event_loop.run_app(&mut app).context("event loop")?;
    Ok(())
}
