use rand::Rng;
use thiserror::Error;

use crate::config::TrackConfig;
use crate::scenery::Sprite;

/// Elevation bound applied to every segment boundary.
pub const ELEVATION_LIMIT: f32 = 520.0;

const OPENING_STRAIGHT: usize = 20;

#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("a track needs at least one segment")]
    Empty,
    #[error("segment length must be positive, got {0}")]
    SegmentLength(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWorld {
    pub start_y: f32,
    pub end_y: f32,
    pub start_z: f32,
    pub end_z: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub curve: f32,
    pub world: SegmentWorld,
    pub sprites: Vec<Sprite>,
}

/// A closed loop of road segments. Depth is always taken modulo `length()`.
#[derive(Debug, Clone)]
pub struct Track {
    segments: Vec<Segment>,
    segment_length: f32,
}

impl Track {
    /// Wrap an existing segment list. Fails on an empty list so that segment
    /// arithmetic modulo the segment count is valid on every `Track`.
    pub fn from_segments(segments: Vec<Segment>, segment_length: f32) -> Result<Self, TrackError> {
        if !(segment_length > 0.0) {
            return Err(TrackError::SegmentLength(segment_length));
        }
        if segments.is_empty() {
            return Err(TrackError::Empty);
        }
        Ok(Self {
            segments,
            segment_length,
        })
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn segment_length(&self) -> f32 {
        self.segment_length
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.segments.len() as f32 * self.segment_length
    }

    /// Map any depth into `[0, length)`.
    pub fn wrap(&self, z: f32) -> f32 {
        let length = self.length();
        let wrapped = z.rem_euclid(length);
        // rem_euclid may round up to `length` for tiny negative inputs
        if wrapped >= length { 0.0 } else { wrapped }
    }

    #[inline]
    pub fn segment_index_at(&self, z: f32) -> usize {
        (self.wrap(z) / self.segment_length) as usize % self.segments.len()
    }

    #[inline]
    pub fn segment_at(&self, z: f32) -> &Segment {
        &self.segments[self.segment_index_at(z)]
    }

    #[inline]
    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index % self.segments.len()]
    }

    /// Road elevation at depth `z`, interpolated linearly inside the segment.
    pub fn height_at(&self, z: f32) -> f32 {
        let z = self.wrap(z);
        let segment = self.segment_at(z);
        let percent = (z % self.segment_length) / self.segment_length;
        segment.world.start_y + (segment.world.end_y - segment.world.start_y) * percent
    }
}

#[inline]
pub fn ease_in(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t * t
}

#[inline]
pub fn ease_out(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * (1.0 - (1.0 - t) * (1.0 - t))
}

#[inline]
pub fn ease_in_out(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * (1.0 - (std::f32::consts::PI * t).cos()) / 2.0
}

/// Builds the road as a sequence of straights, curves and hills.
pub struct RoadGenerator {
    segment_length: f32,
    target_segments: usize,
    segments: Vec<Segment>,
    last_y: f32,
}

impl RoadGenerator {
    pub fn new(config: &TrackConfig) -> Self {
        Self {
            segment_length: config.segment_length,
            target_segments: config.total_segments,
            segments: Vec::with_capacity(config.total_segments + 128),
            last_y: 0.0,
        }
    }

    /// Generate a full track. Scenery is left empty.
    pub fn build<R: Rng + ?Sized>(mut self, rng: &mut R) -> Result<Track, TrackError> {
        if self.target_segments == 0 {
            return Err(TrackError::Empty);
        }

        self.add_straight(OPENING_STRAIGHT);
        while self.segments.len() < self.target_segments {
            let pick: f32 = rng.random();
            let length = 40 + (rng.random::<f32>() * 40.0) as usize;
            if pick < 0.25 {
                let elevation = rng.random::<f32>() * 260.0 - 130.0;
                self.add_road(length, 0.0, elevation);
            } else if pick < 0.58 {
                let curve = (rng.random::<f32>() * 2.0 - 1.0) * 0.0013;
                let elevation = rng.random::<f32>() * 220.0 - 110.0;
                self.add_road(length, curve, elevation);
            } else {
                let curve = (rng.random::<f32>() * 2.0 - 1.0) * 0.0016;
                self.add_road(length, curve, 0.0);
            }
            let connector = 8 + (rng.random::<f32>() * 8.0) as usize;
            self.add_straight(connector);
        }

        tracing::debug!(
            segments = self.segments.len(),
            "road generated"
        );
        Track::from_segments(self.segments, self.segment_length)
    }

    fn add_segment(&mut self, curve: f32, next_y: f32) {
        let end_y = next_y.clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        let index = self.segments.len();
        let start_z = index as f32 * self.segment_length;
        self.segments.push(Segment {
            index,
            curve,
            world: SegmentWorld {
                start_y: self.last_y,
                end_y,
                start_z,
                end_z: start_z + self.segment_length,
            },
            sprites: Vec::new(),
        });
        self.last_y = end_y;
    }

    fn add_straight(&mut self, length: usize) {
        for _ in 0..length {
            self.add_segment(0.0, self.last_y);
        }
    }

    /// Append a run of `total` segments: curvature eases in over the first
    /// quarter, holds for half and eases out over the rest, while elevation
    /// follows one cosine ease across the whole run.
    pub fn add_road(&mut self, total: usize, curve: f32, elevation: f32) {
        let enter = total / 4;
        let hold = total / 2;
        let leave = total - enter - hold;
        let start_y = self.last_y;
        let end_y = start_y + elevation;
        let run_y = |step: usize| {
            let percent = (step as f32 / total.max(1) as f32).clamp(0.0, 1.0);
            ease_in_out(start_y, end_y, percent)
        };

        let mut step = 0;
        for i in 0..enter {
            let value = ease_in(0.0, curve, (i + 1) as f32 / enter.max(1) as f32);
            step += 1;
            self.add_segment(value, run_y(step));
        }
        for _ in 0..hold {
            step += 1;
            self.add_segment(curve, run_y(step));
        }
        for i in 0..leave {
            let value = ease_out(curve, 0.0, (i + 1) as f32 / leave.max(1) as f32);
            step += 1;
            self.add_segment(value, run_y(step));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn config() -> TrackConfig {
        TrackConfig::default()
    }

    fn build(seed: u64) -> Track {
        let mut rng = Pcg32::seed_from_u64(seed);
        RoadGenerator::new(&config()).build(&mut rng).unwrap()
    }

    #[test]
    fn adjacent_segments_are_continuous() {
        let track = build(3);
        for pair in track.segments().windows(2) {
            assert_eq!(pair[0].world.end_z, pair[1].world.start_z);
            assert_eq!(pair[0].world.end_y, pair[1].world.start_y);
        }
    }

    #[test]
    fn indices_are_contiguous_from_zero() {
        let track = build(11);
        assert!(track.segment_count() >= config().total_segments);
        for (i, segment) in track.segments().iter().enumerate() {
            assert_eq!(segment.index, i);
        }
        assert_eq!(
            track.length(),
            track.segment_count() as f32 * track.segment_length()
        );
    }

    #[test]
    fn elevation_stays_within_limit() {
        for seed in 0..8 {
            let track = build(seed);
            assert!(track.segments().iter().all(|s| {
                s.world.end_y.abs() <= ELEVATION_LIMIT && s.world.start_y.abs() <= ELEVATION_LIMIT
            }));
        }
    }

    #[test]
    fn opening_run_is_flat_and_straight() {
        let track = build(5);
        for segment in &track.segments()[..OPENING_STRAIGHT] {
            assert_eq!(segment.curve, 0.0);
            assert_eq!(segment.world.end_y, 0.0);
        }
    }

    #[test]
    fn same_seed_gives_identical_road() {
        let a = build(42);
        let b = build(42);
        assert_eq!(a.segments(), b.segments());

        let c = build(43);
        assert_ne!(a.segments(), c.segments());
    }

    #[test]
    fn enter_phase_follows_quadratic_ease() {
        let mut generator = RoadGenerator::new(&config());
        let target = 0.0012;
        generator.add_road(40, target, 0.0);

        // enter = 10, hold = 20, leave = 10
        let n = 10;
        for k in 1..=n {
            let expected = target * (k as f32 / n as f32).powi(2);
            let got = generator.segments[k - 1].curve;
            assert!((got - expected).abs() < 1e-9, "k={k}: {got} vs {expected}");
        }
        assert!(generator.segments[n..n + 20].iter().all(|s| s.curve == target));
        // leave mirrors the ease and lands on zero
        assert!(generator.segments[39].curve.abs() < 1e-9);
        assert!(generator.segments[30].curve > generator.segments[31].curve);
    }

    #[test]
    fn elevation_eases_across_the_whole_run() {
        let mut generator = RoadGenerator::new(&config());
        generator.add_road(40, 0.001, 100.0);

        let ys: Vec<f32> = generator.segments.iter().map(|s| s.world.end_y).collect();
        assert!((ys[19] - 50.0).abs() < 1e-3);
        assert!((ys[39] - 100.0).abs() < 1e-3);
        assert!(ys.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn elevation_is_clamped_per_point() {
        let mut generator = RoadGenerator::new(&config());
        generator.add_road(40, 0.0, 400.0);
        generator.add_road(40, 0.0, 400.0);
        let last = generator.segments.last().unwrap();
        assert_eq!(last.world.end_y, ELEVATION_LIMIT);
    }

    #[test]
    fn empty_track_is_rejected() {
        let mut rng = Pcg32::seed_from_u64(1);
        let config = TrackConfig {
            total_segments: 0,
            ..TrackConfig::default()
        };
        assert_eq!(
            RoadGenerator::new(&config).build(&mut rng).unwrap_err(),
            TrackError::Empty
        );
        assert_eq!(
            Track::from_segments(Vec::new(), 80.0).unwrap_err(),
            TrackError::Empty
        );
    }

    #[test]
    fn queries_wrap_around_the_loop() {
        let track = build(9);
        let length = track.length();
        assert_eq!(track.segment_index_at(length + 1.0), 0);
        assert_eq!(track.segment_index_at(-1.0), track.segment_count() - 1);
        assert!((track.height_at(length + 40.0) - track.height_at(40.0)).abs() < 1e-3);
        let w = track.wrap(-1e-7);
        assert!((0.0..length).contains(&w));
    }
}
