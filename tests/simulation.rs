use std::time::Duration;

use proptest::prelude::*;

use overdrive::config::{SimConfig, VehicleConfig};
use overdrive::framebuffer::Framebuffer;
use overdrive::hud::HudReadout;
use overdrive::renderer;
use overdrive::{DriveMode, FrameScheduler, Intents, ManualClock, Simulation, VehicleState};

fn config(seed: u64) -> SimConfig {
    let mut config = SimConfig::default();
    config.seed = seed;
    config.track.total_segments = 400;
    config
}

fn throttle() -> Intents {
    Intents {
        accelerate: true,
        ..Intents::default()
    }
}

#[test]
fn holding_throttle_reaches_top_speed_after_3_1_seconds() {
    let mut sim = Simulation::new(config(1), 640, 480).unwrap();
    let max_speed = sim.config().vehicle.max_speed;

    for _ in 0..31 {
        sim.update(0.1, throttle());
    }
    assert_eq!(sim.vehicle().speed, max_speed);

    for _ in 0..20 {
        sim.update(0.1, throttle());
        assert_eq!(sim.vehicle().speed, max_speed);
    }
}

#[test]
fn one_step_short_of_3_1_seconds_is_still_below_top_speed() {
    let mut sim = Simulation::new(config(1), 640, 480).unwrap();
    for _ in 0..30 {
        sim.update(0.1, throttle());
    }
    assert!(sim.vehicle().speed < sim.config().vehicle.max_speed);
}

#[test]
fn same_seed_builds_the_same_world() {
    let a = Simulation::new(config(77), 640, 480).unwrap();
    let b = Simulation::new(config(77), 640, 480).unwrap();
    assert_eq!(a.track().segments(), b.track().segments());
    assert_eq!(a.backdrop(), b.backdrop());

    let c = Simulation::new(config(78), 640, 480).unwrap();
    assert_ne!(a.track().segments(), c.track().segments());
}

#[test]
fn track_is_continuous_and_closed() {
    let sim = Simulation::new(config(5), 640, 480).unwrap();
    let track = sim.track();
    assert_eq!(
        track.length(),
        track.segment_count() as f32 * track.segment_length()
    );
    for pair in track.segments().windows(2) {
        assert_eq!(pair[0].world.end_z, pair[1].world.start_z);
        assert_eq!(pair[0].world.end_y, pair[1].world.start_y);
    }
}

#[test]
fn several_laps_keep_position_in_range() {
    let mut sim = Simulation::new(config(6), 640, 480).unwrap();
    let length = sim.track().length();
    let mut laps_seen = 0;
    let mut last = 0.0;
    for _ in 0..20_000 {
        sim.update(0.05, throttle());
        let position = sim.vehicle().position;
        assert!((0.0..length).contains(&position));
        if position < last {
            laps_seen += 1;
        }
        last = position;
    }
    assert!(laps_seen >= 1);
    assert!(sim.vehicle().distance_travelled > length);
}

#[test]
fn cruise_round_trip_through_the_scheduler() {
    let clock = ManualClock::default();
    let mut sim = Simulation::new(config(8), 640, 480).unwrap();
    let mut scheduler = FrameScheduler::new(clock.clone(), 0.05);
    let toggle = Intents {
        toggle_cruise: true,
        ..Intents::default()
    };

    scheduler.tick(&mut sim, toggle);
    assert_eq!(sim.vehicle().mode, DriveMode::Cruise);
    for _ in 0..600 {
        clock.advance(Duration::from_millis(16));
        scheduler.tick(&mut sim, Intents::default());
    }
    let cruise = sim.config().vehicle.cruise_speed;
    assert!((sim.vehicle().speed - cruise).abs() < 1e-3);
    assert_eq!(HudReadout::from_state(sim.vehicle()).cruise, overdrive::hud::CRUISE_ON);

    clock.advance(Duration::from_millis(16));
    scheduler.tick(&mut sim, toggle);
    assert_eq!(sim.vehicle().mode, DriveMode::Manual);
    assert!((sim.vehicle().target_speed - sim.vehicle().speed).abs() < 1.0);
}

#[test]
fn a_long_stall_advances_at_most_one_capped_step() {
    let clock = ManualClock::default();
    let mut sim = Simulation::new(config(9), 640, 480).unwrap();
    sim.set_vehicle(VehicleState {
        position: 1000.0,
        speed: 60.0,
        target_speed: 60.0,
        ..VehicleState::default()
    });
    let mut scheduler = FrameScheduler::new(clock.clone(), 0.05);
    scheduler.tick(&mut sim, throttle());

    clock.advance(Duration::from_secs(30));
    let dt = scheduler.tick(&mut sim, throttle());
    assert_eq!(dt, 0.05);
    assert!(sim.vehicle().position - 1000.0 < 62.0 * 0.05 + 1e-3);
}

#[test]
fn every_frame_of_a_drive_renders_the_car() {
    let mut sim = Simulation::new(config(10), 320, 240).unwrap();
    let mut fb = Framebuffer::new(320, 240);
    let steer = Intents {
        accelerate: true,
        steer_left: true,
        ..Intents::default()
    };
    for frame in 0..300 {
        sim.update(1.0 / 30.0, if frame % 60 < 30 { throttle() } else { steer });
        let stats = renderer::render(&mut fb, &sim);
        assert!(stats.visible_segments > 0, "frame {frame}");
        assert!(stats.vehicle_drawn, "frame {frame}");
    }
}

fn intents_strategy() -> impl Strategy<Value = Intents> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), prop::bool::weighted(0.05)).prop_map(
        |(accelerate, brake, steer_left, steer_right, toggle_cruise)| Intents {
            accelerate,
            brake,
            steer_left,
            steer_right,
            toggle_cruise,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn bounded_quantities_stay_bounded(
        inputs in prop::collection::vec((intents_strategy(), 0.0f32..0.05), 1..400)
    ) {
        let mut sim = Simulation::new(config(12), 320, 240).unwrap();
        let VehicleConfig { max_speed, lane_limit, lean_limit, .. } = sim.config().vehicle.clone();
        let length = sim.track().length();

        for (intents, dt) in inputs {
            let before = *sim.vehicle();
            sim.update(dt, intents);
            let v = sim.vehicle();
            prop_assert!(v.speed >= 0.0 && v.speed <= max_speed);
            prop_assert!(v.lateral_offset.abs() <= lane_limit);
            prop_assert!(v.body_lean.abs() <= lean_limit);
            prop_assert!(v.position >= 0.0 && v.position < length);
            prop_assert!(v.distance_travelled >= before.distance_travelled);
            if intents.toggle_cruise && before.mode == DriveMode::Cruise {
                prop_assert_eq!(v.mode, DriveMode::Manual);
            }
        }
    }
}
