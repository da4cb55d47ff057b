use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Size of the internal framebuffer for a window of `dst_w x dst_h`: fixed
/// height, width following the window aspect, rounded up to even.
pub fn internal_size(dst_w: usize, dst_h: usize, target_h: usize) -> (usize, usize) {
    let aspect = if dst_h > 0 {
        dst_w as f32 / dst_h as f32
    } else {
        1.0
    };
    let mut w = ((target_h as f32 * aspect).round() as usize).max(160);
    if w % 2 != 0 {
        w += 1;
    }
    (w, target_h)
}

/// One source tap pair per destination column or row, with an 8.8 fixed-point weight.
#[derive(Debug, Clone, Default)]
struct Taps {
    near: Vec<usize>,
    far: Vec<usize>,
    weight: Vec<u32>,
}

impl Taps {
    fn build(dst: usize, src: usize) -> Self {
        let step = src as f32 / dst.max(1) as f32;
        let last = src.saturating_sub(1);
        let mut taps = Taps {
            near: Vec::with_capacity(dst),
            far: Vec::with_capacity(dst),
            weight: Vec::with_capacity(dst),
        };
        for i in 0..dst {
            let f = i as f32 * step;
            let near = (f.floor() as usize).min(last);
            taps.near.push(near);
            taps.far.push((near + 1).min(last));
            taps.weight.push(((f - near as f32).clamp(0.0, 1.0) * 256.0).round() as u32);
        }
        taps
    }
}

/// Bilinear stretch of the internal framebuffer onto the window surface.
#[derive(Debug, Clone, Default)]
pub struct Upscaler {
    src: (usize, usize),
    dst: (usize, usize),
    cols: Taps,
    rows: Taps,
}

impl Upscaler {
    pub fn new(src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Self {
        Self {
            src: (src_w, src_h),
            dst: (dst_w, dst_h),
            cols: Taps::build(dst_w, src_w),
            rows: Taps::build(dst_h, src_h),
        }
    }

    #[inline]
    pub fn matches(&self, src: (usize, usize), dst: (usize, usize)) -> bool {
        self.src == src && self.dst == dst
    }

    /// Rows are processed in parallel.
    pub fn blit(&self, src: &[u32], dst: &mut [u32]) {
        let (sw, _) = self.src;
        let (dw, dh) = self.dst;
        if dw == 0 || sw == 0 {
            return;
        }
        dst[..dw * dh]
            .par_chunks_mut(dw)
            .enumerate()
            .for_each(|(y, out)| {
                let top = &src[self.rows.near[y] * sw..][..sw];
                let bottom = &src[self.rows.far[y] * sw..][..sw];
                let wy = self.rows.weight[y];
                for (x, px) in out.iter_mut().enumerate() {
                    let (x0, x1, wx) = (self.cols.near[x], self.cols.far[x], self.cols.weight[x]);
                    let upper = mix(top[x0], top[x1], wx);
                    let lower = mix(bottom[x0], bottom[x1], wx);
                    *px = mix(upper, lower, wy);
                }
            });
    }
}

#[inline]
fn mix(a: u32, b: u32, w256: u32) -> u32 {
    let inv = 256 - w256;
    // red and blue share one multiply, green gets its own
    let rb = (((a & 0x00FF_00FF) * inv + (b & 0x00FF_00FF) * w256) >> 8) & 0x00FF_00FF;
    let g = (((a & 0x0000_FF00) * inv + (b & 0x0000_FF00) * w256) >> 8) & 0x0000_FF00;
    rb | g
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_width_follows_aspect() {
        assert_eq!(internal_size(1600, 900, 480), (854, 480));
        assert_eq!(internal_size(100, 1000, 480), (160, 480));
        assert_eq!(internal_size(0, 0, 480), (480, 480));
    }

    #[test]
    fn identity_blit_copies_pixels() {
        let src: Vec<u32> = (0..12).map(|i| i * 0x010101).collect();
        let scaler = Upscaler::new(4, 3, 4, 3);
        let mut dst = vec![0; 12];
        scaler.blit(&src, &mut dst);
        assert_eq!(dst, src);
    }

    #[test]
    fn doubling_interpolates_between_neighbours() {
        let src = vec![0x000000, 0x00FE00];
        let scaler = Upscaler::new(2, 1, 4, 1);
        let mut dst = vec![0; 4];
        scaler.blit(&src, &mut dst);
        assert_eq!(dst[0], 0x000000);
        assert_eq!(dst[1], 0x007F00);
        assert_eq!(dst[2], 0x00FE00);
        assert_eq!(dst[3], 0x00FE00);
    }
}
