//! Per-vessel mission record: everything the economics engine needs to settle
//! a mission, accumulated as the vessel walks its phases.

use crate::hazard::HazardEvent;
use crate::log::EventLog;
use crate::ore::{OreGrade, YieldReport};
use crate::{Asteroid, AsteroidClass, AsteroidId, VesselId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The claimed asteroid, as remembered by the record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsteroidRef {
    pub id: AsteroidId,
    pub name: String,
    pub class: AsteroidClass,
    pub distance: f64,
}

impl AsteroidRef {
    pub fn new(id: AsteroidId, asteroid: &Asteroid) -> Self {
        Self {
            id,
            name: asteroid.name.clone(),
            class: asteroid.class,
            distance: asteroid.distance,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionOutcome {
    #[default]
    InProgress,
    /// Walked every phase through to `Complete`.
    Completed,
    /// The pool was empty at selection; nothing was mined.
    NoAsteroid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MissionRecord {
    pub vessel: VesselId,
    pub asteroid: Option<AsteroidRef>,
    pub log: EventLog,
    pub hazards: Vec<HazardEvent>,
    /// Cargo as it stood when the vessel was released from the sale.
    pub final_cargo: BTreeMap<String, u64>,
    pub extracted_kg: u64,
    pub yield_report: Option<YieldReport>,
    /// Share of the pooled-sale revenue attributed to this vessel.
    pub sale_share: Option<Decimal>,
    pub started_day: u32,
    pub finished_day: Option<u32>,
    pub mining_days: u32,
    pub launch_scrubs: u32,
    pub damage_count: u32,
    pub hull_damage: u32,
    pub extra_transit_days: u32,
    pub off_course_days: u32,
    pub outcome: MissionOutcome,
}

impl MissionRecord {
    pub fn new(vessel: VesselId, started_day: u32) -> Self {
        Self {
            vessel,
            asteroid: None,
            log: EventLog::new(),
            hazards: Vec::new(),
            final_cargo: BTreeMap::new(),
            extracted_kg: 0,
            yield_report: None,
            sale_share: None,
            started_day,
            finished_day: None,
            mining_days: 0,
            launch_scrubs: 0,
            damage_count: 0,
            hull_damage: 0,
            extra_transit_days: 0,
            off_course_days: 0,
            outcome: MissionOutcome::InProgress,
        }
    }

    /// Days from start to finish, inclusive of the finishing day. Zero while running.
    pub fn total_days(&self) -> u32 {
        self.finished_day
            .map(|end| end.saturating_sub(self.started_day) + 1)
            .unwrap_or(0)
    }

    pub fn hazard_count(&self) -> u32 {
        self.hazards.len() as u32
    }

    pub fn ore_grade(&self) -> Option<OreGrade> {
        self.yield_report.as_ref().map(|r| r.grade)
    }

    /// Refined commodity mass from the yield model; empty if nothing was mined.
    pub fn commodity_yield(&self) -> BTreeMap<String, f64> {
        self.yield_report
            .as_ref()
            .map(|r| r.commodities_kg.clone())
            .unwrap_or_default()
    }

    pub fn is_finalized(&self) -> bool {
        self.outcome != MissionOutcome::InProgress && self.finished_day.is_some()
    }
}
