//! Static configuration tables: cost rates, ore-grade bands, ship specs and
//! the mission tuning parameters of the vessel state machine.

use crate::{validate_probability, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range used for day counts and masses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Span<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: T) -> bool {
        v >= self.min && v <= self.max
    }
}

impl Span<u64> {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.min > self.max {
            return Err(ValidationError::EmptyRange(self.min, self.max));
        }
        Ok(())
    }
}

impl Span<u32> {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.min > self.max {
            return Err(ValidationError::EmptyRange(
                u64::from(self.min),
                u64::from(self.max),
            ));
        }
        Ok(())
    }
}

/// Per-unit cost rates in USD.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostStructure {
    /// Ground control, per mission day.
    pub ground_control_per_day: Decimal,
    /// Penalty per launch scrub.
    pub launch_scrub: Decimal,
    /// Flat cost per hazard occurrence.
    pub space_event: Decimal,
    /// Mining operations, per extraction day.
    pub mining_operations_per_day: Decimal,
    /// Ship maintenance, per mission day.
    pub ship_maintenance_per_day: Decimal,
    /// Fuel, per mission day.
    pub fuel_per_day: Decimal,
    /// Life support, per mission day.
    pub life_support_per_day: Decimal,
    /// Gangue separation, per kg of effective ore processed.
    pub gangue_separation_per_kg: Decimal,
    /// Ship repair, per hull-damage point.
    pub repair_per_damage_point: Decimal,
    /// Upper bound on the ship repair bill.
    pub repair_cap: Decimal,
    /// Simple annual interest charged by investors on the mission principal.
    pub investor_annual_rate: Decimal,
}

impl Default for CostStructure {
    fn default() -> Self {
        Self {
            ground_control_per_day: Decimal::new(75_000, 0),
            launch_scrub: Decimal::new(75_000, 0),
            space_event: Decimal::new(100_000, 0),
            mining_operations_per_day: Decimal::new(50_000, 0),
            ship_maintenance_per_day: Decimal::new(25_000, 0),
            fuel_per_day: Decimal::new(15_000, 0),
            life_support_per_day: Decimal::new(10_000, 0),
            gangue_separation_per_kg: Decimal::new(50, 2),
            repair_per_damage_point: Decimal::new(1_000_000, 0),
            repair_cap: Decimal::new(25_000_000, 0),
            investor_annual_rate: Decimal::new(15, 2),
        }
    }
}

impl CostStructure {
    /// Sum of all per-day rates charged for every mission day.
    pub fn daily_operating_rate(&self) -> Decimal {
        self.ground_control_per_day
            + self.ship_maintenance_per_day
            + self.fuel_per_day
            + self.life_support_per_day
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let all = [
            self.ground_control_per_day,
            self.launch_scrub,
            self.space_event,
            self.mining_operations_per_day,
            self.ship_maintenance_per_day,
            self.fuel_per_day,
            self.life_support_per_day,
            self.gangue_separation_per_kg,
            self.repair_per_damage_point,
            self.repair_cap,
            self.investor_annual_rate,
        ];
        if all.iter().any(|d| d.is_sign_negative() && !d.is_zero()) {
            return Err(ValidationError::NegativeMoney);
        }
        Ok(())
    }
}

/// Lowest ore grade any draw can produce.
pub const GRADE_MIN: f64 = 0.01;
/// Highest ore grade any draw can produce.
pub const GRADE_MAX: f64 = 0.35;

/// Ore grade classification. Bands are contiguous and non-overlapping:
/// low `[0.01, 0.05)`, medium `[0.05, 0.10)`, high `[0.10, 0.20)`, premium `[0.20, 0.35]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeBand {
    Low,
    Medium,
    High,
    Premium,
}

impl GradeBand {
    pub const ALL: [GradeBand; 4] = [
        GradeBand::Low,
        GradeBand::Medium,
        GradeBand::High,
        GradeBand::Premium,
    ];

    /// Lower (inclusive) and upper bound of the band's grade percentage.
    /// The upper bound is exclusive except for `Premium`.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            GradeBand::Low => (GRADE_MIN, 0.05),
            GradeBand::Medium => (0.05, 0.10),
            GradeBand::High => (0.10, 0.20),
            GradeBand::Premium => (0.20, GRADE_MAX),
        }
    }

    /// Extraction efficiency, strictly increasing with grade.
    pub fn efficiency(self) -> f64 {
        match self {
            GradeBand::Low => 0.75,
            GradeBand::Medium => 0.85,
            GradeBand::High => 0.92,
            GradeBand::Premium => 0.98,
        }
    }

    pub fn contains(self, pct: f64) -> bool {
        let (lo, hi) = self.bounds();
        match self {
            GradeBand::Premium => pct >= lo && pct <= hi,
            _ => pct >= lo && pct < hi,
        }
    }

    /// Classify a grade percentage. Values below the low band classify as
    /// `Low`, values above the premium band as `Premium`.
    pub fn classify(pct: f64) -> GradeBand {
        if pct < 0.05 || pct.is_nan() {
            GradeBand::Low
        } else if pct < 0.10 {
            GradeBand::Medium
        } else if pct < 0.20 {
            GradeBand::High
        } else {
            GradeBand::Premium
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GradeBand::Low => "low",
            GradeBand::Medium => "medium",
            GradeBand::High => "high",
            GradeBand::Premium => "premium",
        }
    }
}

/// Default capacity and rate constants for a mining vessel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipSpecs {
    /// Cargo capacity in kg (> 0).
    pub cargo_capacity_kg: u64,
    /// Peak ore throughput used by the yield model, kg per day.
    pub max_daily_mining_rate_kg: u64,
    /// Distance units covered per day in transit.
    pub cruise_speed: f64,
    /// Hazard probability discount earned by veteran crews, `[0, 0.15]`.
    pub veteran_discount: f64,
    /// Hull integrity points of a fresh ship.
    pub hull_integrity: u32,
}

impl Default for ShipSpecs {
    fn default() -> Self {
        Self {
            cargo_capacity_kg: 50_000,
            max_daily_mining_rate_kg: 1_500,
            cruise_speed: 1.0,
            veteran_discount: 0.0,
            hull_integrity: 100,
        }
    }
}

/// Upper bound on the veteran discount.
pub const MAX_VETERAN_DISCOUNT: f64 = 0.15;

impl ShipSpecs {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cargo_capacity_kg == 0 {
            return Err(ValidationError::ZeroCapacity);
        }
        if self.max_daily_mining_rate_kg == 0
            || !self.cruise_speed.is_finite()
            || self.cruise_speed <= 0.0
        {
            return Err(ValidationError::NonPositiveRate);
        }
        Ok(())
    }

    /// Veteran discount clamped into `[0, 0.15]`.
    pub fn effective_veteran_discount(&self) -> f64 {
        if self.veteran_discount.is_nan() {
            return 0.0;
        }
        self.veteran_discount.clamp(0.0, MAX_VETERAN_DISCOUNT)
    }

    /// Planned one-way transit days for `distance`, never less than one.
    pub fn transit_days(&self, distance: f64) -> u32 {
        let days = (distance.max(0.0) / self.cruise_speed).ceil();
        if days.is_finite() && days >= 1.0 {
            days.min(f64::from(u32::MAX)) as u32
        } else {
            1
        }
    }
}

/// Probabilities, durations and yield bands of the per-phase mission logic.
/// Probabilities are base values; the day's luck scales them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionTuning {
    pub initialization_days: u32,
    pub planning_days: u32,
    pub launch_scrub_chance: f64,
    pub course_deviation_chance: f64,
    pub structural_damage_chance: f64,
    pub structural_repair_days: Span<u32>,
    pub landing_success_chance: f64,
    pub landing_retry_penalty_days: u32,
    pub setup_days: u32,
    pub calibration_delay_chance: f64,
    pub rich_vein_chance: f64,
    pub rich_vein_days: Span<u32>,
    pub rich_vein_yield_kg: Span<u64>,
    pub safety_halt_chance: f64,
    pub safety_halt_days: Span<u32>,
    pub daily_yield_kg: Span<u64>,
    pub reentry_delay_chance: f64,
    pub reentry_delay_days: Span<u32>,
    pub wrap_up_days: u32,
    pub hazards_enabled: bool,
}

impl Default for MissionTuning {
    fn default() -> Self {
        Self {
            initialization_days: 1,
            planning_days: 2,
            launch_scrub_chance: 0.15,
            course_deviation_chance: 0.05,
            structural_damage_chance: 0.02,
            structural_repair_days: Span::new(1, 3),
            landing_success_chance: 0.85,
            landing_retry_penalty_days: 2,
            setup_days: 3,
            calibration_delay_chance: 0.10,
            rich_vein_chance: 0.05,
            rich_vein_days: Span::new(2, 4),
            rich_vein_yield_kg: Span::new(2_500, 3_500),
            safety_halt_chance: 0.04,
            safety_halt_days: Span::new(1, 2),
            daily_yield_kg: Span::new(800, 1_500),
            reentry_delay_chance: 0.15,
            reentry_delay_days: Span::new(1, 2),
            wrap_up_days: 2,
            hazards_enabled: true,
        }
    }
}

impl MissionTuning {
    /// Tuning with every adverse or random event switched off: fixed
    /// durations, no hazards, no veins, and a constant `daily_yield_kg`.
    pub fn calm(daily_yield_kg: u64) -> Self {
        Self {
            launch_scrub_chance: 0.0,
            course_deviation_chance: 0.0,
            structural_damage_chance: 0.0,
            landing_success_chance: 1.0,
            calibration_delay_chance: 0.0,
            rich_vein_chance: 0.0,
            safety_halt_chance: 0.0,
            daily_yield_kg: Span::new(daily_yield_kg, daily_yield_kg),
            reentry_delay_chance: 0.0,
            hazards_enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for p in [
            self.launch_scrub_chance,
            self.course_deviation_chance,
            self.structural_damage_chance,
            self.landing_success_chance,
            self.calibration_delay_chance,
            self.rich_vein_chance,
            self.safety_halt_chance,
            self.reentry_delay_chance,
        ] {
            validate_probability(p)?;
        }
        self.structural_repair_days.validate()?;
        self.rich_vein_days.validate()?;
        self.rich_vein_yield_kg.validate()?;
        self.safety_halt_days.validate()?;
        self.daily_yield_kg.validate()?;
        self.reentry_delay_days.validate()?;
        Ok(())
    }

    /// Luck-dependent normal-day yield range: the worst luck draws from the
    /// lower half of `daily_yield_kg`, the best luck from the upper half.
    pub fn daily_yield_range(&self, luck_fraction: f64) -> Span<u64> {
        let f = luck_fraction.clamp(0.0, 1.0);
        let min = self.daily_yield_kg.min as f64;
        let width = self.daily_yield_kg.max.saturating_sub(self.daily_yield_kg.min) as f64;
        let lo = (min + width * f / 2.0).round() as u64;
        let hi = (min + width * (1.0 + f) / 2.0).round() as u64;
        Span::new(lo, hi.max(lo))
    }
}
