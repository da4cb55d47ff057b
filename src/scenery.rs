use rand::Rng;

use crate::track::Track;

const RIGHT_SIDE_CHANCE: f32 = 0.18;
const LEFT_SIDE_CHANCE: f32 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Pine,
    Rock,
    Bush,
    Tree,
}

impl SpriteKind {
    /// Fixed (size, aspect) for each kind, and the lateral offset range it is
    /// scattered over as (min, spread).
    const fn shape(self) -> (f32, f32, f32, f32) {
        match self {
            SpriteKind::Pine => (0.75, 1.8, 1.6, 1.6),
            SpriteKind::Rock => (0.55, 0.7, 1.4, 1.4),
            SpriteKind::Bush => (0.6, 0.6, 1.3, 1.5),
            SpriteKind::Tree => (0.68, 1.5, 1.5, 1.4),
        }
    }

    fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let pick: f32 = rng.random();
        if pick > 0.75 {
            SpriteKind::Pine
        } else if pick > 0.5 {
            SpriteKind::Rock
        } else if pick > 0.25 {
            SpriteKind::Bush
        } else {
            SpriteKind::Tree
        }
    }
}

/// A roadside object. `offset` is in road half-widths; negative is left of center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub offset: f32,
    pub size: f32,
    pub aspect: f32,
}

impl Sprite {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let kind = SpriteKind::pick(rng);
        let (size, aspect, offset_min, offset_spread) = kind.shape();
        Self {
            kind,
            offset: offset_min + rng.random::<f32>() * offset_spread,
            size,
            aspect,
        }
    }

    pub fn mirrored(self) -> Self {
        Self {
            offset: -self.offset,
            ..self
        }
    }
}

/// Scatter scenery over every segment past the first `clear_segments`.
pub fn scatter<R: Rng + ?Sized>(track: &mut Track, clear_segments: usize, rng: &mut R) {
    let segments = track.segments_mut();
    for segment in segments.iter_mut() {
        segment.sprites.clear();
    }

    let mut placed = 0usize;
    for segment in segments.iter_mut().skip(clear_segments) {
        if rng.random::<f32>() < RIGHT_SIDE_CHANCE {
            segment.sprites.push(Sprite::random(rng));
            placed += 1;
        }
        if rng.random::<f32>() < LEFT_SIDE_CHANCE {
            segment.sprites.push(Sprite::random(rng).mirrored());
            placed += 1;
        }
    }
    tracing::debug!(placed, "scenery scattered");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackConfig;
    use crate::track::RoadGenerator;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn scattered(seed: u64) -> Track {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut track = RoadGenerator::new(&TrackConfig::default())
            .build(&mut rng)
            .unwrap();
        scatter(&mut track, 12, &mut rng);
        track
    }

    #[test]
    fn spawn_area_stays_clear() {
        let track = scattered(1);
        assert!(track.segments()[..12].iter().all(|s| s.sprites.is_empty()));
        assert!(track.segments()[12..].iter().any(|s| !s.sprites.is_empty()));
    }

    #[test]
    fn sprites_sit_beside_the_road() {
        let track = scattered(2);
        for sprite in track.segments().iter().flat_map(|s| &s.sprites) {
            let (size, aspect, min, spread) = sprite.kind.shape();
            assert_eq!(sprite.size, size);
            assert_eq!(sprite.aspect, aspect);
            let offset = sprite.offset.abs();
            assert!(offset >= min && offset <= min + spread);
        }
    }

    #[test]
    fn both_sides_are_populated_with_right_more_common() {
        let track = scattered(3);
        let sprites: Vec<_> = track.segments().iter().flat_map(|s| &s.sprites).collect();
        let right = sprites.iter().filter(|s| s.offset > 0.0).count();
        let left = sprites.iter().filter(|s| s.offset < 0.0).count();
        assert!(left > 0);
        assert!(right > left);
    }

    #[test]
    fn every_kind_appears() {
        let track = scattered(4);
        let kinds: std::collections::HashSet<_> = track
            .segments()
            .iter()
            .flat_map(|s| s.sprites.iter().map(|sp| sp.kind))
            .collect();
        assert_eq!(kinds.len(), 4);
    }

    #[test]
    fn mirrored_only_flips_offset() {
        let sprite = Sprite {
            kind: SpriteKind::Rock,
            offset: 1.7,
            size: 0.55,
            aspect: 0.7,
        };
        let m = sprite.mirrored();
        assert_eq!(m.offset, -1.7);
        assert_eq!(m.kind, sprite.kind);
    }
}
