//! Reclaim phases and phase selection.
//!
//! The sweep always runs in the fixed dependency order of [`SWEEP_ORDER`];
//! callers choose *which* phases run through a [`PhaseSet`], not the order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One phase of the resource sweep.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ReclaimPhase {
    /// Custom training jobs matching the app-name prefix.
    CustomJobs,
    /// Hyperparameter-tuning jobs matching the app-name prefix.
    TuningJobs,
    /// Endpoints matching the app-name prefix (undeploy, then delete).
    Endpoints,
    /// Models matching the app-name prefix.
    Models,
    /// Pipeline runs matching the pipeline name, plus their spawned jobs.
    PipelineRuns,
    /// Every metadata artifact in scope, unfiltered.
    Artifacts,
}

/// Fixed sweep order: resources holding references to others go first.
pub const SWEEP_ORDER: [ReclaimPhase; 6] = [
    ReclaimPhase::CustomJobs,
    ReclaimPhase::TuningJobs,
    ReclaimPhase::Endpoints,
    ReclaimPhase::Models,
    ReclaimPhase::PipelineRuns,
    ReclaimPhase::Artifacts,
];

impl ReclaimPhase {
    /// Stable label used in logs and reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::CustomJobs => "custom_jobs",
            Self::TuningJobs => "tuning_jobs",
            Self::Endpoints => "endpoints",
            Self::Models => "models",
            Self::PipelineRuns => "pipeline_runs",
            Self::Artifacts => "artifacts",
        }
    }
}

/// A selection of phases to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSet {
    phases: BTreeSet<ReclaimPhase>,
}

impl PhaseSet {
    /// An empty selection.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Every phase.
    #[must_use]
    pub fn all() -> Self {
        let mut set = Self::none();
        for phase in SWEEP_ORDER {
            set.phases.insert(phase);
        }
        set
    }

    /// Adds a phase to the selection.
    #[must_use]
    pub fn with(mut self, phase: ReclaimPhase) -> Self {
        self.phases.insert(phase);
        self
    }

    /// Removes a phase from the selection.
    #[must_use]
    pub fn without(mut self, phase: ReclaimPhase) -> Self {
        self.phases.remove(&phase);
        self
    }

    /// Whether the phase is selected.
    #[must_use]
    pub fn contains(&self, phase: ReclaimPhase) -> bool {
        self.phases.contains(&phase)
    }

    /// Whether no phase is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

impl FromIterator<ReclaimPhase> for PhaseSet {
    fn from_iter<I: IntoIterator<Item = ReclaimPhase>>(iter: I) -> Self {
        Self {
            phases: iter.into_iter().collect(),
        }
    }
}
