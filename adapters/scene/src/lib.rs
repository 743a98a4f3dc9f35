#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Static collider scene that can be probed by the environment sampler.
//!
//! The scene is a list of axis-aligned boxes, each tagged with the collision
//! categories it belongs to. Rays are intersected with every box whose
//! categories match the probe's filter and the nearest impact wins.

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use walkgrid_core::CollisionFilter;
use walkgrid_system_sampling::{Environment, ProbeError, ProbeHit, Ray};

/// Direction components smaller than this are treated as parallel to a slab.
const PARALLEL_EPSILON: f32 = 1e-8;

/// Errors raised while assembling a scene.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum SceneError {
    /// A collider corner is not a finite position.
    #[error("collider {index} has a non-finite corner")]
    NonFinite {
        /// Position of the collider in the scene list.
        index: usize,
    },
    /// A collider's minimum corner exceeds its maximum corner.
    #[error("collider {index} has min {min} above max {max}")]
    Inverted {
        /// Position of the collider in the scene list.
        index: usize,
        /// Declared minimum corner.
        min: Vec3,
        /// Declared maximum corner.
        max: Vec3,
    },
}

/// Axis-aligned box belonging to a set of collision categories.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Collider {
    /// Minimum corner of the box.
    pub min: Vec3,
    /// Maximum corner of the box.
    pub max: Vec3,
    /// Categories the box belongs to.
    pub layers: CollisionFilter,
}

impl Collider {
    /// Creates a box spanning the two corners.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3, layers: CollisionFilter) -> Self {
        Self { min, max, layers }
    }

    /// Distance along `ray` to the first point inside the box, if within `max_distance`.
    ///
    /// Uses the slab method. A ray starting inside the box hits at distance zero.
    #[must_use]
    pub fn intersect(&self, ray: &Ray, max_distance: f32) -> Option<f32> {
        let origin = ray.origin().to_array();
        let direction = ray.direction().to_array();
        let min = self.min.to_array();
        let max = self.max.to_array();

        let mut t_min = 0.0_f32;
        let mut t_max = max_distance;
        for axis in 0..3 {
            if direction[axis].abs() < PARALLEL_EPSILON {
                if origin[axis] < min[axis] || origin[axis] > max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction[axis];
            let t1 = (min[axis] - origin[axis]) * inv;
            let t2 = (max[axis] - origin[axis]) * inv;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }

    fn validate(&self, index: usize) -> Result<(), SceneError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(SceneError::NonFinite { index });
        }
        if self.min.cmpgt(self.max).any() {
            return Err(SceneError::Inverted {
                index,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Immutable set of colliders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticScene {
    colliders: Vec<Collider>,
}

impl StaticScene {
    /// Validates and wraps the provided colliders.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] naming the first collider with a non-finite or
    /// inverted extent.
    pub fn new(colliders: Vec<Collider>) -> Result<Self, SceneError> {
        for (index, collider) in colliders.iter().enumerate() {
            collider.validate(index)?;
        }
        debug!(colliders = colliders.len(), "static scene assembled");
        Ok(Self { colliders })
    }

    /// Colliders in declaration order.
    #[must_use]
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }
}

impl Environment for StaticScene {
    fn cast_ray(
        &self,
        ray: &Ray,
        max_distance: f32,
        filter: CollisionFilter,
    ) -> Result<Option<ProbeHit>, ProbeError> {
        if !ray.origin().is_finite() {
            return Err(ProbeError::new("ray origin is not finite"));
        }
        if ray.direction() == Vec3::ZERO {
            return Err(ProbeError::new("ray has no direction"));
        }

        let nearest = self
            .colliders
            .iter()
            .filter(|collider| collider.layers.intersects(filter))
            .filter_map(|collider| {
                collider
                    .intersect(ray, max_distance)
                    .map(|distance| (distance, collider.layers))
            })
            .min_by(|left, right| left.0.total_cmp(&right.0));

        Ok(nearest.map(|(distance, layers)| ProbeHit {
            point: ray.point_at(distance),
            distance,
            layers,
        }))
    }
}
