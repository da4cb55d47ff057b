use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::backdrop::Backdrop;
use crate::camera::Camera;
use crate::config::{ConfigError, SimConfig};
use crate::projection::{Projector, Viewport};
use crate::scenery;
use crate::track::{RoadGenerator, Track, TrackError};
use crate::vehicle::{Intents, VehicleState};

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Track(#[from] TrackError),
}

/// Everything one run owns: the generated world, the vehicle and the
/// viewport-derived projection constants.
pub struct Simulation {
    config: SimConfig,
    track: Track,
    backdrop: Backdrop,
    vehicle: VehicleState,
    projector: Projector,
    pending_resize: Option<(usize, usize)>,
}

impl Simulation {
    /// Generate the world up front; a `Simulation` never exists without a track.
    pub fn new(config: SimConfig, width: usize, height: usize) -> Result<Self, SimError> {
        config.validate()?;

        let mut rng = Pcg32::seed_from_u64(config.seed);
        let mut track = RoadGenerator::new(&config.track).build(&mut rng)?;
        scenery::scatter(&mut track, config.track.clear_segments, &mut rng);
        let backdrop = Backdrop::generate(&mut rng);

        tracing::info!(
            seed = config.seed,
            segments = track.segment_count(),
            length = track.length(),
            "track generated"
        );

        let projector = Self::build_projector(&config, width, height);
        Ok(Self {
            config,
            track,
            backdrop,
            vehicle: VehicleState::default(),
            projector,
            pending_resize: None,
        })
    }

    fn build_projector(config: &SimConfig, width: usize, height: usize) -> Projector {
        Projector::new(
            config.camera.field_of_view,
            config.track.road_width,
            Viewport::new(width as f32, height as f32, config.render.horizon),
        )
    }

    /// Resizes land between frames, at the start of the next `update`.
    pub fn queue_resize(&mut self, width: usize, height: usize) {
        self.pending_resize = Some((width, height));
    }

    fn apply_pending_resize(&mut self) {
        if let Some((width, height)) = self.pending_resize.take() {
            self.projector = Self::build_projector(&self.config, width, height);
            tracing::info!(width, height, "viewport resized");
        }
    }

    /// Advance one frame.
    pub fn update(&mut self, dt: f32, intents: Intents) {
        self.apply_pending_resize();
        self.vehicle = self
            .vehicle
            .step(&self.track, &self.config.vehicle, dt, intents);
    }

    pub fn camera(&self) -> Camera {
        Camera::follow(
            &self.vehicle,
            &self.track,
            &self.config.camera,
            self.config.track.road_width,
        )
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn track(&self) -> &Track {
        &self.track
    }

    #[inline]
    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    #[inline]
    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn set_vehicle(&mut self, vehicle: VehicleState) {
        self.vehicle = vehicle;
    }

    #[inline]
    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.projector.viewport
    }
}

/// Source of monotonic time for the frame scheduler.
pub trait Clock {
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock. Clones share the same time, so a test can keep a handle
/// while the scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Turns clock readings into bounded frame steps.
pub struct FrameScheduler<C: Clock> {
    clock: C,
    last: Option<Duration>,
    max_dt: f32,
    frames: u64,
}

impl<C: Clock> FrameScheduler<C> {
    pub fn new(clock: C, max_dt: f32) -> Self {
        Self {
            clock,
            last: None,
            max_dt,
            frames: 0,
        }
    }

    /// Seconds since the previous call, capped at `max_dt`. The first call
    /// returns zero.
    pub fn next_dt(&mut self) -> f32 {
        let now = self.clock.now();
        let dt = match self.last {
            Some(last) => now.saturating_sub(last).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        dt.min(self.max_dt)
    }

    /// Run one update pass and return the dt that was applied.
    pub fn tick(&mut self, sim: &mut Simulation, intents: Intents) -> f32 {
        let dt = self.next_dt();
        sim.update(dt, intents);
        self.frames += 1;
        dt
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
