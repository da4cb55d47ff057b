use crate::config::VehicleConfig;
use crate::track::Track;

/// Driver intents sampled for one frame. `toggle_cruise` is an edge, the rest
/// are held states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intents {
    pub accelerate: bool,
    pub brake: bool,
    pub steer_left: bool,
    pub steer_right: bool,
    pub toggle_cruise: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DriveMode {
    #[default]
    Manual,
    Cruise,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleState {
    /// Depth along the track, in `[0, track length)`.
    pub position: f32,
    pub speed: f32,
    pub target_speed: f32,
    /// Lateral offset in road half-widths.
    pub lateral_offset: f32,
    /// Cosmetic roll, radians.
    pub body_lean: f32,
    pub mode: DriveMode,
    /// Total distance driven. Never wraps.
    pub distance_travelled: f32,
}

impl VehicleState {
    #[inline]
    pub fn cruise_engaged(&self) -> bool {
        self.mode == DriveMode::Cruise
    }

    /// Advance the vehicle by `dt` seconds. `dt` is taken as given; the frame
    /// scheduler is responsible for bounding it.
    pub fn step(&self, track: &Track, cfg: &VehicleConfig, dt: f32, intents: Intents) -> Self {
        let mut next = *self;

        if intents.toggle_cruise {
            next.toggle_cruise();
        }

        next.update_target_speed(cfg, dt, intents);
        next.steer(cfg, dt, intents);

        let accel = (next.target_speed - next.speed).clamp(-cfg.brake * dt, cfg.acceleration * dt);
        next.speed = (next.speed + accel).clamp(0.0, cfg.max_speed);

        let travelled = next.speed * dt;
        next.position = track.wrap(next.position + travelled);
        next.distance_travelled += travelled;

        // road curvature pushes the car toward the outside of the bend
        let curve = track.segment_at(next.position).curve;
        next.lateral_offset -= curve * next.speed * dt * cfg.curve_drift;
        next.lateral_offset = next.lateral_offset.clamp(-cfg.lane_limit, cfg.lane_limit);

        next
    }

    fn toggle_cruise(&mut self) {
        self.mode = match self.mode {
            DriveMode::Manual => DriveMode::Cruise,
            DriveMode::Cruise => {
                self.target_speed = self.speed;
                DriveMode::Manual
            }
        };
        tracing::debug!(mode = ?self.mode, speed = self.speed, "cruise toggled");
    }

    fn update_target_speed(&mut self, cfg: &VehicleConfig, dt: f32, intents: Intents) {
        let cruising = self.cruise_engaged();
        if cruising {
            self.target_speed = cfg.cruise_speed;
        }
        if intents.accelerate {
            self.target_speed = (self.target_speed + cfg.acceleration * dt).clamp(0.0, cfg.max_speed);
        }
        if intents.brake {
            self.target_speed = (self.target_speed - cfg.brake * dt).clamp(0.0, cfg.max_speed);
        }
        if !intents.accelerate && !intents.brake && !cruising {
            let decay = cfg.friction * dt;
            self.target_speed = if self.target_speed > decay {
                self.target_speed - decay
            } else {
                0.0
            };
        }
    }

    fn steer(&mut self, cfg: &VehicleConfig, dt: f32, intents: Intents) {
        let authority = 0.5 + self.speed / cfg.max_speed;
        let lean_limit = cfg.lean_limit;

        if intents.steer_left {
            self.lateral_offset -= cfg.steer_speed * dt * authority;
            self.body_lean = (self.body_lean - cfg.lean_speed * dt).clamp(-lean_limit, lean_limit);
        } else if intents.steer_right {
            self.lateral_offset += cfg.steer_speed * dt * authority;
            self.body_lean = (self.body_lean + cfg.lean_speed * dt).clamp(-lean_limit, lean_limit);
        } else {
            self.lateral_offset *= (1.0 - cfg.steer_return * dt).max(0.0);
            self.body_lean *= (1.0 - cfg.lean_return * dt).max(0.0);
        }
        self.lateral_offset = self.lateral_offset.clamp(-cfg.lane_limit, cfg.lane_limit);
    }
}
