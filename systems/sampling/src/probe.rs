//! Probe contracts between the sampler and the environment it inspects.

use glam::Vec3;
use thiserror::Error;
use walkgrid_core::CollisionFilter;

/// Half-line used to probe the environment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// Creates a ray, normalising the direction.
    ///
    /// A zero direction is kept as-is; environments report no hit for it.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Downward probe starting at `origin`.
    #[must_use]
    pub fn downward(origin: Vec3) -> Self {
        Self::new(origin, Vec3::NEG_Y)
    }

    /// Starting point of the ray.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Unit direction of travel.
    #[must_use]
    pub const fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Point reached after travelling `distance` world units.
    #[must_use]
    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Surface struck by a probe.
///
/// The absence of a hit is expressed as `None` by [`Environment::cast_ray`],
/// so a hit located exactly at the world origin is an ordinary hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    /// World position of the impact.
    pub point: Vec3,
    /// Distance travelled along the ray before the impact.
    pub distance: f32,
    /// Collision categories of the surface that was struck.
    pub layers: CollisionFilter,
}

/// Failure to evaluate a single probe.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("probe could not be evaluated: {reason}")]
pub struct ProbeError {
    reason: String,
}

impl ProbeError {
    /// Creates a probe error carrying a human readable reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Human readable reason of the failure.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// World that can be probed with rays.
///
/// Implementations are queried concurrently from the sampler's worker
/// threads and must therefore be shareable between threads.
pub trait Environment: Sync {
    /// Casts `ray` up to `max_distance`, reporting the nearest surface whose
    /// categories intersect `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the probe cannot be evaluated.
    fn cast_ray(
        &self,
        ray: &Ray,
        max_distance: f32,
        filter: CollisionFilter,
    ) -> Result<Option<ProbeHit>, ProbeError>;
}

impl<F> Environment for F
where
    F: Fn(&Ray, f32, CollisionFilter) -> Result<Option<ProbeHit>, ProbeError> + Sync,
{
    fn cast_ray(
        &self,
        ray: &Ray,
        max_distance: f32,
        filter: CollisionFilter,
    ) -> Result<Option<ProbeHit>, ProbeError> {
        self(ray, max_distance, filter)
    }
}
