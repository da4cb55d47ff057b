use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// `0xRRGGBB` literal, fully opaque.
    pub const fn hex(v: u32) -> Self {
        Self::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // BGRA8 in little-endian memory, alpha at 0
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
}

#[inline]
fn blend(dst: u32, src: Rgba) -> u32 {
    if src.a == 255 {
        return pack_rgb(src.r, src.g, src.b);
    }
    let a = src.a as u32;
    let inv = 255 - a;
    let ch = |d: u32, s: u8| (s as u32 * a + d * inv + 127) / 255;
    let r = ch((dst >> 16) & 0xFF, src.r);
    let g = ch((dst >> 8) & 0xFF, src.g);
    let b = ch(dst & 0xFF, src.b);
    (r << 16) | (g << 8) | b
}

/// First and one-past-last pixel whose center lies in `[lo, hi)`, clamped to `[0, limit)`.
#[inline]
fn pixel_span(lo: f32, hi: f32, limit: usize) -> (usize, usize) {
    let start = (lo - 0.5).ceil().max(0.0);
    let end = (hi - 0.5).ceil().min(limit as f32);
    if !(start < end) {
        return (0, 0);
    }
    (start as usize, end as usize)
}

/// Primitive fill operations the renderer paints with. Coordinates are pixels,
/// y grows downward.
pub trait Painter {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba);
    fn fill_polygon(&mut self, points: &[[f32; 2]], color: Rgba);
    fn fill_ellipse(&mut self, center: [f32; 2], radii: [f32; 2], rotation: f32, color: Rgba);
    /// Fill the whole surface with a top-to-bottom gradient. Stop offsets are
    /// fractions of the height in ascending order.
    fn fill_vertical_gradient(&mut self, stops: &[(f32, Rgba)]);
}

/// Software raster target, one packed `0RGB` word per pixel.
pub struct Framebuffer {
    pixels: Vec<u32>,
    width: usize,
    height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height],
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixels = vec![0; width * height];
        }
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(pack_rgb(color.r, color.g, color.b));
    }

    #[inline]
    fn blend_span(&mut self, y: usize, x0: usize, x1: usize, color: Rgba) {
        let row = y * self.width;
        for px in &mut self.pixels[row + x0..row + x1] {
            *px = blend(*px, color);
        }
    }
}

impl Painter for Framebuffer {
    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        let (x0, x1) = pixel_span(x, x + w, self.width);
        let (y0, y1) = pixel_span(y, y + h, self.height);
        if x0 == x1 || y0 == y1 {
            return;
        }
        let width = self.width;
        self.pixels[y0 * width..y1 * width]
            .par_chunks_mut(width)
            .for_each(|row| {
                for px in &mut row[x0..x1] {
                    *px = blend(*px, color);
                }
            });
    }

    fn fill_polygon(&mut self, points: &[[f32; 2]], color: Rgba) {
        if points.len() < 3 || points.iter().any(|p| !p[0].is_finite() || !p[1].is_finite()) {
            return;
        }
        let (min_y, max_y) = points
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| (lo.min(p[1]), hi.max(p[1])));
        let (y0, y1) = pixel_span(min_y, max_y, self.height);

        let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
        for yi in y0..y1 {
            let yc = yi as f32 + 0.5;
            crossings.clear();
            for (i, a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                let (top, bottom) = if a[1] <= b[1] { (*a, b) } else { (b, *a) };
                // half-open so shared vertices are counted once
                if yc >= top[1] && yc < bottom[1] {
                    let t = (yc - top[1]) / (bottom[1] - top[1]);
                    crossings.push(top[0] + t * (bottom[0] - top[0]));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                let (x0, x1) = pixel_span(pair[0], pair[1], self.width);
                if x0 < x1 {
                    self.blend_span(yi, x0, x1, color);
                }
            }
        }
    }

    fn fill_ellipse(&mut self, center: [f32; 2], radii: [f32; 2], rotation: f32, color: Rgba) {
        let [rx, ry] = radii;
        if !(rx > 0.0 && ry > 0.0) || !center[0].is_finite() || !center[1].is_finite() {
            return;
        }
        let reach = rx.max(ry);
        let (x0, x1) = pixel_span(center[0] - reach, center[0] + reach, self.width);
        let (y0, y1) = pixel_span(center[1] - reach, center[1] + reach, self.height);
        let (s, c) = rotation.sin_cos();
        let (inv_rx2, inv_ry2) = (1.0 / (rx * rx), 1.0 / (ry * ry));

        for yi in y0..y1 {
            let dy = yi as f32 + 0.5 - center[1];
            let row = yi * self.width;
            for xi in x0..x1 {
                let dx = xi as f32 + 0.5 - center[0];
                // rotate into the ellipse's own frame
                let u = dx * c + dy * s;
                let v = -dx * s + dy * c;
                if u * u * inv_rx2 + v * v * inv_ry2 <= 1.0 {
                    let px = &mut self.pixels[row + xi];
                    *px = blend(*px, color);
                }
            }
        }
    }

    fn fill_vertical_gradient(&mut self, stops: &[(f32, Rgba)]) {
        let (Some(first), Some(last)) = (stops.first().copied(), stops.last().copied()) else {
            return;
        };
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return;
        }
        self.pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let t = (y as f32 + 0.5) / height as f32;
                let color = if t <= first.0 {
                    first.1
                } else if t >= last.0 {
                    last.1
                } else {
                    stops
                        .windows(2)
                        .find(|w| t >= w[0].0 && t <= w[1].0)
                        .map(|w| {
                            let span = (w[1].0 - w[0].0).max(f32::EPSILON);
                            w[0].1.lerp(w[1].1, (t - w[0].0) / span)
                        })
                        .unwrap_or(last.1)
                };
                let packed = pack_rgb(color.r, color.g, color.b);
                row.fill(packed);
            });
    }
}
