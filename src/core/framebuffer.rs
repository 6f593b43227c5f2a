use nalgebra::Vector3;
use rayon::prelude::*;

/// Rows of the supersampled buffer handed to one rasterizer worker.
pub const BAND_ROWS: usize = 16;

/// Linear color + depth storage, optionally supersampled.
///
/// The buffer is `samples` times larger than the output on each axis.
/// Rendering splits it into disjoint horizontal bands, so every worker owns
/// its pixels outright and no locking is needed.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub samples: usize,
    pub buffer_width: usize,
    pub buffer_height: usize,
    color: Vec<Vector3<f32>>,
    depth: Vec<f32>,
}

/// A mutable horizontal slice of the buffer, `rows` rows starting at `y0`.
pub struct Band<'a> {
    pub y0: usize,
    pub rows: usize,
    pub width: usize,
    pub color: &'a mut [Vector3<f32>],
    pub depth: &'a mut [f32],
}

impl Band<'_> {
    /// Writes `color` if `depth` is closer than what the pixel holds.
    #[inline]
    pub fn test_and_set(&mut self, x: usize, y: usize, depth: f32, color: Vector3<f32>) -> bool {
        let idx = (y - self.y0) * self.width + x;
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.color[idx] = color;
            true
        } else {
            false
        }
    }

    /// Depth-only variant used by the shadow pass.
    #[inline]
    pub fn test_and_set_depth(&mut self, x: usize, y: usize, depth: f32) -> bool {
        let idx = (y - self.y0) * self.width + x;
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            true
        } else {
            false
        }
    }
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, samples: usize) -> Self {
        let samples = samples.max(1);
        let buffer_width = width * samples;
        let buffer_height = height * samples;
        let size = buffer_width * buffer_height;
        Self {
            width,
            height,
            samples,
            buffer_width,
            buffer_height,
            color: vec![Vector3::zeros(); size],
            depth: vec![f32::INFINITY; size],
        }
    }

    /// Reallocates only when the output size or sample count changed.
    pub fn resize(&mut self, width: usize, height: usize, samples: usize) {
        if self.width != width || self.height != height || self.samples != samples.max(1) {
            *self = Self::new(width, height, samples);
        }
    }

    pub fn clear(&mut self, color: Vector3<f32>) {
        self.color.par_iter_mut().for_each(|c| *c = color);
        self.depth.par_iter_mut().for_each(|d| *d = f32::INFINITY);
    }

    /// Disjoint bands covering the whole buffer, for parallel rasterization.
    pub fn bands_mut(&mut self) -> impl IndexedParallelIterator<Item = Band<'_>> {
        let width = self.buffer_width;
        let height = self.buffer_height;
        let chunk = (BAND_ROWS * width).max(1);
        self.color
            .par_chunks_mut(chunk)
            .zip(self.depth.par_chunks_mut(chunk))
            .enumerate()
            .map(move |(i, (color, depth))| {
                let y0 = i * BAND_ROWS;
                Band {
                    y0,
                    rows: BAND_ROWS.min(height - y0),
                    width,
                    color,
                    depth,
                }
            })
    }

    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    /// Output pixel (x, y), averaged over its sample block.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        if self.samples == 1 {
            return Some(self.color[y * self.buffer_width + x]);
        }

        let start_x = x * self.samples;
        let start_y = y * self.samples;
        let mut sum = Vector3::zeros();
        for dy in 0..self.samples {
            let row = (start_y + dy) * self.buffer_width;
            for dx in 0..self.samples {
                sum += self.color[row + start_x + dx];
            }
        }
        Some(sum / (self.samples * self.samples) as f32)
    }
}
