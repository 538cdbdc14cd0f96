#![deny(warnings)]

//! Core domain models and invariants for the asteroid mining fleet simulation.
//!
//! This crate defines the serializable types shared by the economics engine
//! and the fleet runtime, the static configuration tables, and the stochastic
//! models (luck, hazards, ore yield) that drive a mission day by day.

pub mod cargo;
pub mod hazard;
pub mod log;
pub mod ore;
pub mod pool;
pub mod record;
pub mod rng;
pub mod tables;

pub use cargo::{Cargo, CargoError};
pub use hazard::{HazardEvent, HazardKind, HazardPhase, HazardStatistics, SeverityLevel};
pub use log::{EventCategory, EventLog, LogEntry};
pub use ore::{OreGrade, OreYieldModel, YieldReport};
pub use pool::{AsteroidPool, ClaimError};
pub use record::{AsteroidRef, MissionOutcome, MissionRecord};
pub use rng::{Luck, LuckBand, SimRng};
pub use tables::{CostStructure, GradeBand, MissionTuning, ShipSpecs, Span};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Identifier of a vessel, unique within one fleet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VesselId(pub u32);

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vessel-{}", self.0)
    }
}

/// Index of an asteroid inside a fleet's [`AsteroidPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AsteroidId(pub usize);

/// Spectral class of an asteroid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsteroidClass {
    /// Carbonaceous
    C,
    /// Silicate
    S,
    /// Metallic
    M,
}

impl AsteroidClass {
    pub const ALL: [AsteroidClass; 3] = [AsteroidClass::C, AsteroidClass::S, AsteroidClass::M];

    /// Parse a free-text class label. Unknown labels fall back to `C`, the
    /// most conservative class, and are logged.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "C" => AsteroidClass::C,
            "S" => AsteroidClass::S,
            "M" => AsteroidClass::M,
            other => {
                warn!(label = other, "unknown asteroid class, defaulting to C");
                AsteroidClass::C
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AsteroidClass::C => "C",
            AsteroidClass::S => "S",
            AsteroidClass::M => "M",
        }
    }
}

/// One entry of an asteroid's elemental composition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Element name, e.g. "Gold".
    pub name: String,
    /// Mass available on the asteroid in kg (>= 0).
    pub mass_kg: f64,
}

impl Element {
    pub fn new(name: impl Into<String>, mass_kg: f64) -> Self {
        Self {
            name: name.into(),
            mass_kg,
        }
    }
}

/// Immutable asteroid record. Claimed by at most one vessel per fleet run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    /// Designation, e.g. "101955 Bennu".
    pub name: String,
    /// Distance from the home port in arbitrary units (>= 0).
    pub distance: f64,
    /// Spectral class.
    pub class: AsteroidClass,
    /// Ordered elemental composition.
    pub composition: Vec<Element>,
}

impl Asteroid {
    /// Sum of all available element masses.
    pub fn total_mass_kg(&self) -> f64 {
        self.composition.iter().map(|e| e.mass_kg.max(0.0)).sum()
    }
}

/// Phases of a single vessel's mission, in the order they are walked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MissionPhase {
    Initialization,
    Selection,
    Planning,
    TravelOutbound,
    Landing,
    Setup,
    Extraction,
    TravelReturn,
    ReEntry,
    Selling,
    Repair,
    NextMissionPrep,
    Complete,
}

impl MissionPhase {
    /// The phase that normally follows this one. `Complete` has no successor.
    pub fn next(self) -> Option<MissionPhase> {
        use MissionPhase::*;
        Some(match self {
            Initialization => Selection,
            Selection => Planning,
            Planning => TravelOutbound,
            TravelOutbound => Landing,
            Landing => Setup,
            Setup => Extraction,
            Extraction => TravelReturn,
            TravelReturn => ReEntry,
            ReEntry => Selling,
            Selling => Repair,
            Repair => NextMissionPrep,
            NextMissionPrep => Complete,
            Complete => return None,
        })
    }

    pub fn is_terminal(self) -> bool {
        self == MissionPhase::Complete
    }

    /// Stable phases the fleet waits for before the pooled sale.
    pub fn is_settled(self) -> bool {
        matches!(self, MissionPhase::Selling | MissionPhase::Complete)
    }

    pub fn label(self) -> &'static str {
        use MissionPhase::*;
        match self {
            Initialization => "initialization",
            Selection => "selection",
            Planning => "planning",
            TravelOutbound => "travel-outbound",
            Landing => "landing",
            Setup => "setup",
            Extraction => "extraction",
            TravelReturn => "travel-return",
            ReEntry => "re-entry",
            Selling => "selling",
            Repair => "repair",
            NextMissionPrep => "next-mission-prep",
            Complete => "complete",
        }
    }
}

impl fmt::Display for MissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Simulated day counter shared by every vessel of a fleet. Only moves forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    day: u32,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated day.
    pub fn today(&self) -> u32 {
        self.day
    }

    /// Move to the next day and return it.
    pub fn advance(&mut self) -> u32 {
        self.day = self.day.saturating_add(1);
        self.day
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Names must not be blank.
    #[error("name must not be empty")]
    EmptyName,
    /// Distance must be finite and non-negative.
    #[error("distance must be finite and >= 0, got {0}")]
    InvalidDistance(f64),
    /// Element masses must be finite and non-negative.
    #[error("negative or non-finite mass for element {0}")]
    InvalidMass(String),
    /// Cargo capacity must be strictly positive.
    #[error("cargo capacity must be > 0")]
    ZeroCapacity,
    /// Rates and speeds must be finite and strictly positive.
    #[error("rate must be finite and > 0")]
    NonPositiveRate,
    /// Probabilities must be within [0, 1].
    #[error("probability {0} outside [0, 1]")]
    Probability(f64),
    /// A range whose minimum exceeds its maximum.
    #[error("range [{0}, {1}] is empty")]
    EmptyRange(u64, u64),
    /// Monetary values must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Luck must lie in `[1, 100]`.
    #[error("luck {0} outside [1, 100]")]
    LuckOutOfRange(u8),
}

/// Validate an asteroid record. An empty composition is allowed (it is
/// handled leniently at extraction time), negative masses are not.
pub fn validate_asteroid(a: &Asteroid) -> Result<(), ValidationError> {
    if a.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !a.distance.is_finite() || a.distance < 0.0 {
        return Err(ValidationError::InvalidDistance(a.distance));
    }
    for e in &a.composition {
        if !e.mass_kg.is_finite() || e.mass_kg < 0.0 {
            return Err(ValidationError::InvalidMass(e.name.clone()));
        }
    }
    Ok(())
}

/// Validate a probability value.
pub fn validate_probability(p: f64) -> Result<(), ValidationError> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(ValidationError::Probability(p));
    }
    Ok(())
}
