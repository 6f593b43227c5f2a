//! Fit-to-view: center a freshly loaded model, scale it to a viewing size and
//! rest it on the ground plane.
//!
//! Call [`normalize`] exactly once per load. Running it again on an already
//! fitted model re-centers and re-scales relative to the adjusted extent.

use crate::scene::model::Model;
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Longest-axis size after scaling.
    pub target_size: f32,
    /// Upper bound on the multiplicative scale, so tiny models are not blown up.
    pub scale_ceiling: f32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            target_size: 5.0,
            scale_ceiling: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No vertices under the root.
    Empty,
    /// NaN or infinite coordinates somewhere in the geometry.
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    Fitted {
        original_center: Point3<f32>,
        original_size: Vector3<f32>,
        scale: f32,
        ground_lift: f32,
    },
    Skipped(SkipReason),
}

impl FitOutcome {
    /// Scale factor that was applied, 1.0 when skipped.
    pub fn scale(&self) -> f32 {
        match self {
            FitOutcome::Fitted { scale, .. } => *scale,
            FitOutcome::Skipped(_) => 1.0,
        }
    }
}

/// Scale factor for a box whose longest edge is `max_dim`.
///
/// Zero or negative extents keep scale 1.
pub fn fit_scale(max_dim: f32, fit: &FitOptions) -> f32 {
    if max_dim > 0.0 {
        let s = (fit.target_size / max_dim).min(fit.scale_ceiling);
        if s.is_finite() && s > 0.0 { s } else { 1.0 }
    } else {
        1.0
    }
}

/// Adjusts `model.root` in place so the model's world bounds are centered on
/// the vertical axis, scaled to `fit.target_size` (capped by
/// `fit.scale_ceiling`) and resting on y = 0.
pub fn normalize(model: &mut Model, fit: &FitOptions) -> FitOutcome {
    let bounds = model.world_bounds();
    if bounds.is_empty() {
        warn!("Model '{}' has no geometry, skipping fit", model.name);
        return FitOutcome::Skipped(SkipReason::Empty);
    }
    if !bounds.is_finite() {
        warn!(
            "Model '{}' has non-finite bounds {:?}..{:?}, skipping fit",
            model.name, bounds.min, bounds.max
        );
        return FitOutcome::Skipped(SkipReason::NonFinite);
    }

    let center = bounds.center();
    let size = bounds.size();
    let scale = fit_scale(bounds.max_extent(), fit);

    // p' = s * (p - c), folded into the root transform.
    let root = &mut model.root;
    root.position = (root.position - center.coords) * scale;
    root.scale *= scale;

    let fitted = model.world_bounds();
    let ground_lift = if fitted.min.y < 0.0 { -fitted.min.y } else { 0.0 };
    model.root.position.y += ground_lift;

    info!(
        "Fitted '{}': size {:.3}x{:.3}x{:.3} -> scale {:.4}, lifted {:.3}",
        model.name, size.x, size.y, size.z, scale, ground_lift
    );
    FitOutcome::Fitted {
        original_center: center,
        original_size: size,
        scale,
        ground_lift,
    }
}

#[cfg(test)]
mod tests {
    use super::{FitOptions, FitOutcome, SkipReason, fit_scale, normalize};
    use crate::core::geometry::Vertex;
    use crate::scene::mesh::Mesh;
    use crate::scene::model::Model;
    use nalgebra::{Point3, Vector2, Vector3};

    const EPS: f32 = 1e-4;

    fn box_model(center: Point3<f32>, size: Vector3<f32>) -> Model {
        Model::new("box", vec![Mesh::create_box(center, size, None)], Vec::new())
    }

    fn point_model(p: Point3<f32>) -> Model {
        let v = Vertex::new(p, Vector3::y(), Vector2::zeros());
        Model::new("point", vec![Mesh::new(vec![v], Vec::new(), None)], Vec::new())
    }

    #[test]
    fn off_center_box_lands_on_the_ground_at_the_origin() {
        let mut model = box_model(Point3::new(5.0, 5.0, 5.0), Vector3::new(2.0, 4.0, 1.0));
        let outcome = normalize(&mut model, &FitOptions::default());

        assert!((outcome.scale() - 1.25).abs() < EPS);
        let b = model.world_bounds();
        let c = b.center();
        assert!(c.x.abs() < EPS && c.z.abs() < EPS);
        assert!(b.min.y.abs() < EPS);
        assert!(c.y >= b.size().y * 0.5 - EPS);
        assert!((b.max_extent() - 5.0).abs() < EPS);
    }

    #[test]
    fn tiny_model_is_capped_by_the_ceiling() {
        let mut model = box_model(Point3::origin(), Vector3::new(0.1, 0.1, 0.1));
        let outcome = normalize(&mut model, &FitOptions::default());
        assert_eq!(outcome.scale(), 3.0);
        assert!((model.world_bounds().max_extent() - 0.3).abs() < EPS);
    }

    #[test]
    fn large_model_shrinks_to_target() {
        let mut model = box_model(Point3::new(0.0, -40.0, 0.0), Vector3::new(100.0, 20.0, 50.0));
        normalize(&mut model, &FitOptions::default());
        let b = model.world_bounds();
        assert!((b.max_extent() - 5.0).abs() < EPS);
        assert!(b.min.y.abs() < EPS);
    }

    #[test]
    fn single_point_keeps_unit_scale() {
        let mut model = point_model(Point3::new(3.0, 3.0, 3.0));
        let outcome = normalize(&mut model, &FitOptions::default());
        match outcome {
            FitOutcome::Fitted {
                scale, ground_lift, ..
            } => {
                assert_eq!(scale, 1.0);
                assert_eq!(ground_lift, 0.0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(model.world_bounds().min, Point3::origin());
    }

    #[test]
    fn empty_model_is_left_alone() {
        let mut model = Model::default();
        let before = model.root;
        assert_eq!(
            normalize(&mut model, &FitOptions::default()),
            FitOutcome::Skipped(SkipReason::Empty)
        );
        assert_eq!(model.root, before);
    }

    #[test]
    fn nan_geometry_is_left_alone() {
        let mut model = point_model(Point3::new(f32::NAN, 0.0, 0.0));
        model.meshes[0].vertices.push(Vertex::new(
            Point3::new(1.0, 1.0, 1.0),
            Vector3::y(),
            Vector2::zeros(),
        ));
        let before = model.root;
        let outcome = normalize(&mut model, &FitOptions::default());
        assert_eq!(outcome, FitOutcome::Skipped(SkipReason::NonFinite));
        assert_eq!(model.root, before);
    }

    #[test]
    fn zero_extent_never_divides() {
        assert_eq!(fit_scale(0.0, &FitOptions::default()), 1.0);
        assert_eq!(fit_scale(-1.0, &FitOptions::default()), 1.0);
    }
}
