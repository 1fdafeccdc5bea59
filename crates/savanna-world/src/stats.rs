//! Population counts and per-step reports.

use savanna_core::{DeathCause, Species};
use serde::{Deserialize, Serialize};
use tracing::{event, info, Level};

/// Live entities per species
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub grazers: usize,
    pub hunters: usize,
}

impl Census {
    pub fn count(&mut self, species: Species) {
        match species {
            Species::Grazer => self.grazers += 1,
            Species::Hunter => self.hunters += 1,
        }
    }

    pub fn of(&self, species: Species) -> usize {
        match species {
            Species::Grazer => self.grazers,
            Species::Hunter => self.hunters,
        }
    }

    pub fn total(&self) -> usize {
        self.grazers + self.hunters
    }

    pub fn is_extinct(&self) -> bool {
        self.total() == 0
    }
}

/// Deaths by cause
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathTally {
    pub old_age: usize,
    pub starvation: usize,
    pub predation: usize,
}

impl DeathTally {
    pub fn record(&mut self, cause: DeathCause) {
        match cause {
            DeathCause::OldAge => self.old_age += 1,
            DeathCause::Starvation => self.starvation += 1,
            DeathCause::Predation => self.predation += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.old_age + self.starvation + self.predation
    }
}

/// Summary of one world step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: u64,
    /// Entities whose turn ran
    pub acted: usize,
    /// Roster entries skipped because they were removed earlier in the pass
    pub skipped_stale: usize,
    pub births: Census,
    pub deaths: DeathTally,
    /// Population once the step finished
    pub census: Census,
}

impl StepReport {
    pub fn new(step: u64) -> Self {
        Self {
            step,
            ..Default::default()
        }
    }

    /// Emit the report as structured metrics
    pub fn emit(&self) {
        info!(
            event = "population_metrics",
            step = self.step,
            grazers = self.census.grazers,
            hunters = self.census.hunters,
            acted = self.acted,
            skipped_stale = self.skipped_stale,
            grazer_births = self.births.grazers,
            hunter_births = self.births.hunters,
            deaths_old_age = self.deaths.old_age,
            deaths_starvation = self.deaths.starvation,
            deaths_predation = self.deaths.predation,
            deaths_total = self.deaths.total(),
            "Population metrics snapshot"
        );

        for species in [Species::Grazer, Species::Hunter] {
            event!(
                Level::DEBUG,
                gauge_name = "population",
                species = species.as_str(),
                gauge_value = self.census.of(species),
                step = self.step,
                "Population gauge"
            );
        }
    }
}
