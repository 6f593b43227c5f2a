use crate::core::framebuffer::{Band, FrameBuffer};
use crate::core::geometry::Vertex;
use crate::core::math::transform::clip_to_screen;
use crate::core::pipeline::{Interpolatable, Shader};
use crate::scene::material::Material;
use nalgebra::{Point2, Vector4};
use rayon::prelude::*;

#[derive(PartialEq, Copy, Clone, Debug)]
pub enum CullMode {
    Back,
    Front,
    None,
}

/// A triangle after clipping, perspective division and viewport mapping.
#[derive(Clone, Copy, Debug)]
pub struct ScreenTriangle<V> {
    points: [Point2<f32>; 3],
    /// Window depth in [0, 1]; affine in screen space.
    depth: [f32; 3],
    inv_w: [f32; 3],
    varyings: [V; 3],
    min_y: usize,
    max_y: usize,
}

/// Turns triangles into fragments.
///
/// Drawing is split in two stages: `setup` runs the vertex stage, clips
/// against the view frustum and culls, then `draw` scans the surviving
/// triangles band by band in parallel.
pub struct Rasterizer {
    pub cull_mode: CullMode,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

type ClipVertex<V> = (Vector4<f32>, V);

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            cull_mode: CullMode::Back,
        }
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
    }

    /// Vertex stage + primitive assembly for one triangle.
    ///
    /// Clipping can split the input into a fan, so zero or more triangles
    /// are appended to `out`.
    pub fn setup<S: Shader>(
        &self,
        shader: &S,
        vertices: [&Vertex; 3],
        target: (usize, usize),
        out: &mut Vec<ScreenTriangle<S::Varying>>,
    ) {
        if target.0 == 0 || target.1 == 0 {
            return;
        }
        let mut poly: Vec<ClipVertex<S::Varying>> = Vec::with_capacity(12);
        let mut scratch: Vec<ClipVertex<S::Varying>> = Vec::with_capacity(12);
        for v in vertices {
            poly.push(shader.vertex(v));
        }

        // Trivial accept skips the clipper for the common case.
        let inside = |p: &Vector4<f32>| {
            p.w > 0.0 && p.x.abs() <= p.w && p.y.abs() <= p.w && p.z.abs() <= p.w
        };
        if !poly.iter().all(|(p, _)| inside(p)) {
            // (axis, sign): keep sign * p[axis] <= p.w
            const PLANES: [(usize, f32); 6] = [
                (2, -1.0),
                (2, 1.0),
                (0, 1.0),
                (0, -1.0),
                (1, 1.0),
                (1, -1.0),
            ];
            for &(axis, sign) in &PLANES {
                clip_against_plane(&poly, &mut scratch, axis, sign);
                std::mem::swap(&mut poly, &mut scratch);
                if poly.len() < 3 {
                    return;
                }
            }
        }

        let (width, height) = (target.0 as f32, target.1 as f32);
        let v0 = poly[0];
        for i in 1..poly.len() - 1 {
            if let Some(tri) = self.project(&[v0, poly[i], poly[i + 1]], width, height) {
                out.push(tri);
            }
        }
    }

    fn project<V: Interpolatable>(
        &self,
        corners: &[ClipVertex<V>; 3],
        width: f32,
        height: f32,
    ) -> Option<ScreenTriangle<V>> {
        let mut points = [Point2::origin(); 3];
        let mut depth = [0.0; 3];
        let mut inv_w = [0.0; 3];
        for (i, (clip, _)) in corners.iter().enumerate() {
            if clip.w.abs() < 1e-7 {
                return None;
            }
            points[i] = clip_to_screen(clip, width, height);
            inv_w[i] = 1.0 / clip.w;
            depth[i] = clip.z * inv_w[i] * 0.5 + 0.5;
        }

        // Front faces are counter-clockwise in NDC, which is negative area once Y points down.
        let area = signed_area(&points[0], &points[1], &points[2]);
        if area.abs() < 1e-9 || !area.is_finite() {
            return None;
        }
        match self.cull_mode {
            CullMode::Back if area > 0.0 => return None,
            CullMode::Front if area < 0.0 => return None,
            _ => {}
        }

        let min_y = points.iter().map(|p| p.y).fold(f32::MAX, f32::min);
        let max_y = points.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        if max_y < 0.0 || min_y >= height {
            return None;
        }

        Some(ScreenTriangle {
            points,
            depth,
            inv_w,
            varyings: [corners[0].1, corners[1].1, corners[2].1],
            min_y: min_y.max(0.0).floor() as usize,
            max_y: (max_y.ceil() as usize).min(height as usize - 1),
        })
    }

    /// Shades every covered sample of `triangles` into `framebuffer`.
    pub fn draw<S: Shader>(
        &self,
        framebuffer: &mut FrameBuffer,
        shader: &S,
        triangles: &[ScreenTriangle<S::Varying>],
        material: Option<&Material>,
    ) {
        if triangles.is_empty() {
            return;
        }
        framebuffer.bands_mut().for_each(|mut band| {
            for tri in triangles {
                scan_triangle(&mut band, tri, |band, x, y, depth, bary| {
                    // Skip the shader for occluded samples.
                    let idx = (y - band.y0) * band.width + x;
                    if depth >= band.depth[idx] {
                        return;
                    }
                    let varying = tri.varyings[0] * bary[0]
                        + tri.varyings[1] * bary[1]
                        + tri.varyings[2] * bary[2];
                    let color = shader.fragment(varying, material);
                    band.test_and_set(x, y, depth, color);
                });
            }
        });
    }

    /// Depth-only variant of `draw`; no fragment shading.
    pub fn draw_depth<V: Interpolatable>(
        &self,
        framebuffer: &mut FrameBuffer,
        triangles: &[ScreenTriangle<V>],
    ) {
        if triangles.is_empty() {
            return;
        }
        framebuffer.bands_mut().for_each(|mut band| {
            for tri in triangles {
                scan_triangle(&mut band, tri, |band, x, y, depth, _| {
                    band.test_and_set_depth(x, y, depth);
                });
            }
        });
    }
}

#[inline]
fn signed_area(a: &Point2<f32>, b: &Point2<f32>, c: &Point2<f32>) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Visits every sample center of `band` covered by `tri`, passing window
/// depth and perspective-correct barycentric weights.
fn scan_triangle<V, F>(band: &mut Band<'_>, tri: &ScreenTriangle<V>, mut visit: F)
where
    F: FnMut(&mut Band<'_>, usize, usize, f32, [f32; 3]),
{
    let band_end = band.y0 + band.rows;
    if tri.max_y < band.y0 || tri.min_y >= band_end {
        return;
    }
    let y_start = tri.min_y.max(band.y0);
    let y_end = (tri.max_y + 1).min(band_end);

    let [p0, p1, p2] = tri.points;
    let min_x = p0.x.min(p1.x).min(p2.x).max(0.0).floor() as usize;
    let max_x = (p0.x.max(p1.x).max(p2.x).ceil().max(0.0) as usize).min(band.width.saturating_sub(1));
    if min_x > max_x {
        return;
    }

    let inv_area = 1.0 / signed_area(&p0, &p1, &p2);
    for y in y_start..y_end {
        let py = y as f32 + 0.5;
        for x in min_x..=max_x {
            let p = Point2::new(x as f32 + 0.5, py);
            let b0 = signed_area(&p1, &p2, &p) * inv_area;
            let b1 = signed_area(&p2, &p0, &p) * inv_area;
            let b2 = 1.0 - b0 - b1;
            if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                continue;
            }

            let depth = b0 * tri.depth[0] + b1 * tri.depth[1] + b2 * tri.depth[2];
            let w0 = b0 * tri.inv_w[0];
            let w1 = b1 * tri.inv_w[1];
            let w2 = b2 * tri.inv_w[2];
            let sum = w0 + w1 + w2;
            if sum <= 0.0 {
                continue;
            }
            visit(band, x, y, depth, [w0 / sum, w1 / sum, w2 / sum]);
        }
    }
}

/// Sutherland-Hodgman against one frustum plane in homogeneous clip space.
fn clip_against_plane<V: Interpolatable>(
    input: &[ClipVertex<V>],
    output: &mut Vec<ClipVertex<V>>,
    axis: usize,
    sign: f32,
) {
    output.clear();
    let Some(&last) = input.last() else {
        return;
    };

    // Signed distance, positive inside.
    let dist = |p: &Vector4<f32>| p.w - sign * p[axis];
    let mut prev = last;
    let mut prev_d = dist(&prev.0);
    for &curr in input {
        let curr_d = dist(&curr.0);
        if (prev_d >= 0.0) != (curr_d >= 0.0) {
            let t = prev_d / (prev_d - curr_d);
            output.push((
                prev.0 + (curr.0 - prev.0) * t,
                prev.1 * (1.0 - t) + curr.1 * t,
            ));
        }
        if curr_d >= 0.0 {
            output.push(curr);
        }
        prev = curr;
        prev_d = curr_d;
    }
}
