use nalgebra::{Matrix4, Point3, Vector3};

/// Axis-aligned bounding box.
///
/// An empty box has `min = +MAX` and `max = -MAX` so that the first
/// `expand` call snaps both corners to the point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Point3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    /// Box centered at `center` with the given full extents.
    pub fn from_center_size(center: Point3<f32>, size: Vector3<f32>) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.expand(p);
        }
        bounds
    }

    /// True until at least one point has been added.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// False when any corner is NaN or infinite (malformed geometry).
    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
    }

    /// Grows the box to contain `p`. A NaN coordinate poisons the box so
    /// `is_finite` reports it instead of silently skipping the point.
    pub fn expand(&mut self, p: &Point3<f32>) {
        self.min = Point3::from(self.min.coords.zip_map(&p.coords, nan_min));
        self.max = Point3::from(self.max.coords.zip_map(&p.coords, nan_max));
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            Point3::from(self.min.coords.zip_map(&other.min.coords, nan_min)),
            Point3::from(self.max.coords.zip_map(&other.max.coords, nan_max)),
        )
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Longest edge of the box.
    pub fn max_extent(&self) -> f32 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }

    /// Bounds of this box after an affine transform (all eight corners).
    pub fn transformed(&self, m: &Matrix4<f32>) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let mut out = Aabb::empty();
        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.expand(&m.transform_point(&corner));
        }
        out
    }
}

fn nan_min(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() { f32::NAN } else { a.min(b) }
}

fn nan_max(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() { f32::NAN } else { a.max(b) }
}
