#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Environment sampling system that classifies cell walkability.
//!
//! Every cell is probed with a short downward ray from above its center. The
//! cells are enumerated in row-major order and split into fixed-size batches.
//! Batches run concurrently on the rayon pool and so do the probes inside each
//! batch, one task per cell. Results are only
//! aggregated once every batch has finished, and always in enumeration order,
//! so the produced [`Survey`] is independent of thread scheduling.

mod probe;
mod schedule;

use glam::Vec3;
use rayon::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use walkgrid_core::{CancelToken, CellCoord, CellSample, CollisionFilter, GridError, GridLayout, Survey};

pub use probe::{Environment, ProbeError, ProbeHit, Ray};
pub use schedule::RefreshSchedule;

/// Number of cells probed by a single batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// The four independently configured classification categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeFilters {
    /// Surfaces agents may stand on.
    pub walkable: CollisionFilter,
    /// Walkable surfaces where nothing may be spawned.
    pub spawn_blocked: CollisionFilter,
    /// Walkable surfaces where enemies may be spawned.
    pub enemy_spawnable: CollisionFilter,
    /// Colliders marking the playable boundary; cells above them are never walkable.
    pub grid_edge: CollisionFilter,
}

impl ProbeFilters {
    /// Union of every category, used as the probe's query filter.
    #[must_use]
    pub const fn all(&self) -> CollisionFilter {
        self.walkable
            .union(self.spawn_blocked)
            .union(self.enemy_spawnable)
            .union(self.grid_edge)
    }

    /// Categories that count as a standable surface.
    #[must_use]
    pub const fn surface(&self) -> CollisionFilter {
        self.walkable
            .union(self.spawn_blocked)
            .union(self.enemy_spawnable)
    }

    /// Derives a cell sample from the outcome of its probe.
    #[must_use]
    pub fn classify(&self, hit: Option<&ProbeHit>) -> CellSample {
        let Some(hit) = hit else {
            return CellSample::default();
        };

        let layers = hit.layers;
        CellSample {
            walkable: layers.intersects(self.surface()) && !layers.intersects(self.grid_edge),
            spawn_blocked: layers.intersects(self.spawn_blocked),
            enemy_spawnable: layers.intersects(self.enemy_spawnable),
            probe_failed: false,
        }
    }
}

/// Tunable parameters of the sampler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerConfig {
    /// Classification categories tested by every probe.
    pub filters: ProbeFilters,
    /// Number of cells probed per batch.
    pub batch_size: usize,
    /// Height above the cell center at which probes start.
    pub probe_height: f32,
    /// Maximum distance a probe travels downwards.
    pub probe_length: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            filters: ProbeFilters::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            probe_height: 1.0,
            probe_length: 10.0,
        }
    }
}

/// Refresh-level failures of the sampler.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SamplingError {
    /// A batch size of zero cannot partition the lattice.
    #[error("sampling batch size must be at least one cell")]
    InvalidBatchSize,
    /// The probe length must be a finite positive distance.
    #[error("probe length {0} must be finite and positive")]
    InvalidProbeLength(f32),
    /// The refresh was abandoned before every batch completed.
    #[error("sampling refresh was cancelled")]
    Cancelled,
    /// The aggregated samples did not match the lattice.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Pure system that probes the environment and produces surveys.
#[derive(Clone, Debug)]
pub struct EnvironmentSampler {
    config: SamplerConfig,
}

impl EnvironmentSampler {
    /// Creates a sampler after validating its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::InvalidBatchSize`] for a zero batch size and
    /// [`SamplingError::InvalidProbeLength`] for a non-positive probe length.
    pub fn new(config: SamplerConfig) -> Result<Self, SamplingError> {
        if config.batch_size == 0 {
            return Err(SamplingError::InvalidBatchSize);
        }
        if !config.probe_length.is_finite() || config.probe_length <= 0.0 {
            return Err(SamplingError::InvalidProbeLength(config.probe_length));
        }
        Ok(Self { config })
    }

    /// Configuration the sampler was created with.
    #[must_use]
    pub const fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Number of batches a refresh of `layout` is split into.
    #[must_use]
    pub fn batch_count(&self, layout: &GridLayout) -> usize {
        layout.cell_count().div_ceil(self.config.batch_size)
    }

    /// Probes every cell of the lattice and returns the resulting survey.
    ///
    /// # Errors
    ///
    /// Only fails when the aggregated samples cannot form a survey, which
    /// indicates a broken layout.
    pub fn refresh<E>(&self, layout: &GridLayout, environment: &E) -> Result<Survey, SamplingError>
    where
        E: Environment + ?Sized,
    {
        self.refresh_cancellable(layout, environment, &CancelToken::new())
    }

    /// Probes every cell of the lattice unless `cancel` is triggered first.
    ///
    /// Batches observe the token before every probe. Once cancelled, running
    /// batches drop their partial samples, pending batches never start and no
    /// survey is produced.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::Cancelled`] when the token was triggered
    /// before every batch completed.
    pub fn refresh_cancellable<E>(
        &self,
        layout: &GridLayout,
        environment: &E,
        cancel: &CancelToken,
    ) -> Result<Survey, SamplingError>
    where
        E: Environment + ?Sized,
    {
        let cell_count = layout.cell_count();
        let batch_size = self.config.batch_size;
        let batch_count = self.batch_count(layout);

        let batches: Vec<Option<Vec<CellSample>>> = (0..batch_count)
            .into_par_iter()
            .map(|batch| {
                let start = batch * batch_size;
                let end = (start + batch_size).min(cell_count);
                self.probe_batch(layout, environment, start..end, cancel)
            })
            .collect();

        if cancel.is_cancelled() {
            debug!(batch_count, "sampling refresh cancelled");
            return Err(SamplingError::Cancelled);
        }

        let mut samples = Vec::with_capacity(cell_count);
        for batch in batches {
            samples.extend(batch.ok_or(SamplingError::Cancelled)?);
        }

        let survey = Survey::new(layout.width(), layout.height(), samples)?;
        let failed = survey.failed_probes();
        if failed > 0 {
            warn!(failed, "probes failed; cells treated as not walkable until next refresh");
        }
        debug!(
            batch_count,
            walkable = survey.walkable_count(),
            "sampling refresh complete"
        );
        Ok(survey)
    }

    fn probe_batch<E>(
        &self,
        layout: &GridLayout,
        environment: &E,
        range: std::ops::Range<usize>,
        cancel: &CancelToken,
    ) -> Option<Vec<CellSample>>
    where
        E: Environment + ?Sized,
    {
        range
            .into_par_iter()
            .map(|index| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(self.probe_cell(layout, environment, layout.coord_of(index)))
            })
            .collect()
    }

    fn probe_cell<E>(&self, layout: &GridLayout, environment: &E, coord: CellCoord) -> CellSample
    where
        E: Environment + ?Sized,
    {
        let start = layout.world_center_of(coord) + Vec3::Y * self.config.probe_height;
        let ray = Ray::downward(start);
        match environment.cast_ray(&ray, self.config.probe_length, self.config.filters.all()) {
            Ok(hit) => self.config.filters.classify(hit.as_ref()),
            Err(error) => {
                debug!(%coord, %error, "probe failed");
                CellSample::FAILED
            }
        }
    }
}
