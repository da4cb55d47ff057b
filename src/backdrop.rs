use rand::Rng;

use crate::framebuffer::Rgba;

const LAYER_COLORS: [Rgba; 3] = [
    Rgba::new(116, 182, 255, 115),
    Rgba::new(94, 164, 238, 115),
    Rgba::new(74, 142, 216, 102),
];

/// A band of hills scrolled at a fraction of the camera's travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundLayer {
    pub amplitude: f32,
    pub frequency: f32,
    pub parallax: f32,
    /// Baseline as a fraction of screen height.
    pub base_factor: f32,
    pub seed: f32,
    pub color: Rgba,
}

impl BackgroundLayer {
    /// Ridge height above the baseline at horizontal world coordinate `wx`.
    pub fn ridge(&self, wx: f32) -> f32 {
        (wx * self.frequency + self.seed).sin() * self.amplitude
            + (wx * self.frequency * 0.6 + self.seed * 0.6).cos() * (self.amplitude * 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cloud {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub layers: Vec<BackgroundLayer>,
    pub clouds: Vec<Cloud>,
}

impl Backdrop {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let layers = LAYER_COLORS
            .iter()
            .enumerate()
            .map(|(idx, &color)| {
                let i = idx as f32;
                BackgroundLayer {
                    amplitude: 180.0 + i * 90.0,
                    frequency: 0.0008 + i * 0.00035,
                    parallax: 0.18 + i * 0.14,
                    base_factor: 0.55 + i * 0.08,
                    seed: rng.random::<f32>() * 1000.0,
                    color,
                }
            })
            .collect();

        let clouds = (0..8)
            .map(|_| Cloud {
                x: rng.random::<f32>() * 2000.0,
                y: rng.random::<f32>() * 140.0 + 40.0,
                scale: 0.7 + rng.random::<f32>() * 0.8,
            })
            .collect();

        Self { layers, clouds }
    }
}
