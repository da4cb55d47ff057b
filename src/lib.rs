//! Pseudo-3D endless road: procedural track generation, a chase camera with
//! pinhole projection, and a software rasterizer that paints the road back to
//! front into a packed-pixel framebuffer.

pub mod backdrop;
pub mod camera;
pub mod config;
pub mod framebuffer;
pub mod hud;
pub mod input;
pub mod projection;
pub mod renderer;
pub mod scaler;
pub mod scenery;
pub mod sim;
pub mod track;
pub mod vehicle;

pub use config::SimConfig;
pub use sim::{Clock, FrameScheduler, ManualClock, Simulation, SystemClock};
pub use vehicle::{DriveMode, Intents, VehicleState};
