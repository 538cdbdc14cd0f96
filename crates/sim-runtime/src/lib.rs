#![deny(warnings)]

//! Fleet runtime: the per-vessel mission state machine and the coordinator
//! that steps every vessel one simulated day at a time inside an ECS world.

pub mod fleet;
pub mod vessel;

pub use fleet::{Fleet, FleetReport, StopHandle};
pub use vessel::Vessel;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use sim_core::{CargoError, ClaimError, CostStructure, MissionTuning, ShipSpecs, ValidationError};
use sim_econ::EconError;
use thiserror::Error;

/// Configuration for one fleet run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Master seed; every vessel stream is forked from it.
    pub rng_seed: u64,
    pub vessels: u32,
    /// Runaway guard. A run still going after this many days is stopped.
    pub max_days: u32,
    /// Calendar date of simulated day 0; prices are quoted per date.
    pub start_date: NaiveDate,
    pub ship: ShipSpecs,
    pub tuning: MissionTuning,
    pub costs: CostStructure,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            vessels: 3,
            max_days: 3_650,
            start_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap_or(NaiveDate::MIN),
            ship: ShipSpecs::default(),
            tuning: MissionTuning::default(),
            costs: CostStructure::default(),
        }
    }
}

impl FleetConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ship.validate()?;
        self.tuning.validate()?;
        self.costs.validate()?;
        Ok(())
    }

    /// Calendar date of simulated day `day`.
    pub fn date_of(&self, day: u32) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(u64::from(day)))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Fatal run errors: invariant violations and invalid configuration.
/// Adverse mission outcomes are never errors.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Cargo(#[from] CargoError),
    #[error(transparent)]
    Claim(#[from] ClaimError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),
    #[error(transparent)]
    Econ(#[from] EconError),
}
