use crate::config::CameraConfig;
use crate::projection::Point3;
use crate::track::Track;
use crate::vehicle::VehicleState;

/// Chase camera. It always looks down +z; bends are expressed by the
/// projector's lateral accumulation, so there is no yaw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pos: Point3, // world position; z already wrapped into track range
}

impl Camera {
    pub fn new(pos: Point3) -> Self {
        Self { pos }
    }

    pub fn follow(vehicle: &VehicleState, track: &Track, cfg: &CameraConfig, road_width: f32) -> Self {
        let look_back = track.segment_length() * cfg.distance;
        Self {
            pos: Point3 {
                x: vehicle.lateral_offset * road_width,
                y: track.height_at(vehicle.position) + cfg.height,
                z: track.wrap(vehicle.position - look_back),
            },
        }
    }

    #[inline]
    pub fn world_to_camera(&self, p: Point3) -> Point3 {
        Point3 {
            x: p.x - self.pos.x,
            y: p.y - self.pos.y,
            z: p.z - self.pos.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackConfig;
    use crate::track::RoadGenerator;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn track() -> Track {
        RoadGenerator::new(&TrackConfig::default())
            .build(&mut Pcg32::seed_from_u64(21))
            .unwrap()
    }

    #[test]
    fn sits_behind_and_above_the_car() {
        let track = track();
        let cfg = CameraConfig::default();
        let vehicle = VehicleState {
            position: 1000.0,
            lateral_offset: 0.5,
            ..Default::default()
        };
        let camera = Camera::follow(&vehicle, &track, &cfg, 36.0);
        assert!((camera.pos.z - (1000.0 - 80.0 * 1.6)).abs() < 1e-3);
        assert_eq!(camera.pos.x, 18.0);
        assert!((camera.pos.y - (track.height_at(1000.0) + cfg.height)).abs() < 1e-3);
    }

    #[test]
    fn look_back_wraps_at_lap_start() {
        let track = track();
        let vehicle = VehicleState::default();
        let camera = Camera::follow(&vehicle, &track, &CameraConfig::default(), 36.0);
        assert!((camera.pos.z - (track.length() - 128.0)).abs() < 1e-2);
    }
}
