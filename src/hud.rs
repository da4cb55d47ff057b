use std::fmt;

use crate::vehicle::VehicleState;

pub const CRUISE_ON: &str = "开启";
pub const CRUISE_OFF: &str = "关闭";

/// Text shown to the driver, derived from vehicle state only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudReadout {
    pub distance: String,
    pub speed: String,
    pub cruise: &'static str,
}

pub fn format_distance(meters: f32) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round() as i64)
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// Speed in km/h from m/s.
pub fn format_speed(meters_per_second: f32) -> String {
    format!("{} km/h", (meters_per_second * 3.6).round() as i64)
}

impl HudReadout {
    pub fn from_state(state: &VehicleState) -> Self {
        Self {
            distance: format_distance(state.distance_travelled),
            speed: format_speed(state.speed),
            cruise: if state.cruise_engaged() {
                CRUISE_ON
            } else {
                CRUISE_OFF
            },
        }
    }
}

impl fmt::Display for HudReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | 巡航 {}", self.distance, self.speed, self.cruise)
    }
}
