//! TOML configuration describing the lattice, the sampler and the probed scene.

use std::{fs, ops::RangeInclusive, path::Path, time::Duration};

use anyhow::{ensure, Context, Result};
use glam::Vec3;
use serde::Deserialize;
use walkgrid_core::GridLayout;
use walkgrid_scene::{Collider, StaticScene};
use walkgrid_system_pathfinding::{PathSearchEngine, SearchLimits};
use walkgrid_system_sampling::{
    EnvironmentSampler, ProbeFilters, RefreshSchedule, SamplerConfig, DEFAULT_BATCH_SIZE,
};

/// Accepted refresh intervals in milliseconds.
const REFRESH_INTERVAL_MS: RangeInclusive<u64> = 100..=1000;

/// Root of a walkgrid configuration file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WalkgridConfig {
    /// Lattice geometry.
    pub(crate) grid: GridSection,
    /// Sampler tuning and refresh cadence.
    #[serde(default)]
    pub(crate) sampling: SamplingSection,
    /// Path search limits.
    #[serde(default)]
    pub(crate) search: SearchSection,
    /// Boxes forming the probed environment.
    #[serde(default)]
    pub(crate) colliders: Vec<Collider>,
}

impl WalkgridConfig {
    /// Reads and parses the configuration stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid configuration {}", path.display()))
    }

    /// Parses configuration text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse configuration toml contents")
    }

    /// Builds the collider scene described by the configuration.
    pub(crate) fn scene(&self) -> Result<StaticScene> {
        StaticScene::new(self.colliders.clone()).context("invalid [[colliders]] entry")
    }
}

/// `[grid]` section.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GridSection {
    pub(crate) width: u32,
    pub(crate) height: u32,
    #[serde(default = "unit_length")]
    pub(crate) cell_width: f32,
    #[serde(default = "unit_length")]
    pub(crate) cell_height: f32,
    #[serde(default)]
    pub(crate) origin: Vec3,
}

impl GridSection {
    /// Validated lattice geometry.
    pub(crate) fn layout(&self) -> Result<GridLayout> {
        GridLayout::new(
            self.width,
            self.height,
            self.cell_width,
            self.cell_height,
            self.origin,
        )
        .context("invalid [grid] section")
    }
}

/// `[sampling]` section.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SamplingSection {
    pub(crate) filters: ProbeFilters,
    pub(crate) batch_size: usize,
    pub(crate) probe_height: f32,
    pub(crate) probe_length: f32,
    /// Whether the grid is refreshed periodically after the first survey.
    pub(crate) refresh: bool,
    pub(crate) refresh_interval_ms: u64,
}

impl Default for SamplingSection {
    fn default() -> Self {
        let sampler = SamplerConfig::default();
        Self {
            filters: sampler.filters,
            batch_size: DEFAULT_BATCH_SIZE,
            probe_height: sampler.probe_height,
            probe_length: sampler.probe_length,
            refresh: true,
            refresh_interval_ms: 500,
        }
    }
}

impl SamplingSection {
    /// Sampler configured from the section.
    pub(crate) fn sampler(&self) -> Result<EnvironmentSampler> {
        EnvironmentSampler::new(SamplerConfig {
            filters: self.filters,
            batch_size: self.batch_size,
            probe_height: self.probe_height,
            probe_length: self.probe_length,
        })
        .context("invalid [sampling] section")
    }

    /// Refresh cadence configured by the section.
    pub(crate) fn schedule(&self) -> Result<RefreshSchedule> {
        if !self.refresh {
            return Ok(RefreshSchedule::disabled());
        }
        ensure!(
            REFRESH_INTERVAL_MS.contains(&self.refresh_interval_ms),
            "refresh_interval_ms {} must lie within {}..={}",
            self.refresh_interval_ms,
            REFRESH_INTERVAL_MS.start(),
            REFRESH_INTERVAL_MS.end()
        );
        Ok(RefreshSchedule::every(Duration::from_millis(
            self.refresh_interval_ms,
        )))
    }
}

/// `[search]` section.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SearchSection {
    pub(crate) max_expansions: Option<usize>,
}

impl SearchSection {
    /// Engine honouring the configured limits.
    pub(crate) fn engine(&self) -> PathSearchEngine {
        PathSearchEngine::new(SearchLimits {
            max_expansions: self.max_expansions,
        })
    }
}

fn unit_length() -> f32 {
    1.0
}
