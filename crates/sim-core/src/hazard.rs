//! Space hazard model: eight static hazard profiles, a daily occurrence roll
//! and the severity-driven impact of whatever fired.

use crate::rng::SimRng;
use crate::tables::MAX_VETERAN_DISCOUNT;
use crate::MissionPhase;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hazard types in their fixed enumeration order. When several types fire on
/// the same day only the first one in this order is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    SolarFlare,
    Micrometeorite,
    PowerFailure,
    CommunicationFailure,
    RadiationStorm,
    DebrisField,
    EngineAnomaly,
    LifeSupportIssue,
}

/// Static parameters of one hazard type.
#[derive(Clone, Debug, PartialEq)]
pub struct HazardProfile {
    pub base_probability: f64,
    pub delay_multiplier: f64,
    pub cost_multiplier: Decimal,
    /// Inclusive hull-damage range, possibly `(0, 0)`.
    pub hull_damage: (u32, u32),
    pub failure_chance: f64,
    pub description: &'static str,
}

impl HazardKind {
    pub const ALL: [HazardKind; 8] = [
        HazardKind::SolarFlare,
        HazardKind::Micrometeorite,
        HazardKind::PowerFailure,
        HazardKind::CommunicationFailure,
        HazardKind::RadiationStorm,
        HazardKind::DebrisField,
        HazardKind::EngineAnomaly,
        HazardKind::LifeSupportIssue,
    ];

    pub fn profile(self) -> HazardProfile {
        let p = |base_probability, delay_multiplier, cost_tenths, hull_damage, failure_chance, description| {
            HazardProfile {
                base_probability,
                delay_multiplier,
                cost_multiplier: Decimal::new(cost_tenths, 1),
                hull_damage,
                failure_chance,
                description,
            }
        };
        match self {
            HazardKind::SolarFlare => p(0.05, 0.5, 20, (0, 2), 0.3, "Solar flare disrupts onboard electronics"),
            HazardKind::Micrometeorite => p(0.03, 1.0, 30, (1, 5), 0.5, "Micrometeorite impact on the hull"),
            HazardKind::PowerFailure => p(0.06, 0.3, 15, (0, 1), 0.8, "Power system failure"),
            HazardKind::CommunicationFailure => {
                p(0.04, 0.2, 12, (0, 0), 0.4, "Communication link with ground control lost")
            }
            HazardKind::RadiationStorm => p(0.02, 0.4, 25, (0, 1), 0.2, "Radiation storm forces crew to shelter"),
            HazardKind::DebrisField => p(0.01, 2.0, 40, (2, 8), 0.6, "Debris field requires evasive manoeuvres"),
            HazardKind::EngineAnomaly => p(0.03, 0.8, 20, (0, 2), 0.7, "Engine anomaly detected"),
            HazardKind::LifeSupportIssue => p(0.02, 0.1, 18, (0, 0), 0.9, "Life support malfunction"),
        }
    }

    /// Daily occurrence probability, clamped to `[0, 1]`. The veteran discount
    /// is capped at [`MAX_VETERAN_DISCOUNT`].
    pub fn probability(self, phase: HazardPhase, days_in_space: u32, veteran_discount: f64) -> f64 {
        let discount = if veteran_discount.is_nan() {
            0.0
        } else {
            veteran_discount.clamp(0.0, MAX_VETERAN_DISCOUNT)
        };
        let p = self.profile().base_probability
            * phase.multiplier()
            * (1.0 + f64::from(days_in_space) / 1000.0)
            * (1.0 - discount);
        p.clamp(0.0, 1.0)
    }

    /// Deterministic part of the impact for a drawn severity.
    pub fn impact(self, severity: u8, base_daily_cost: Decimal) -> HazardImpact {
        let profile = self.profile();
        let sev = f64::from(severity);
        let delay = (profile.delay_multiplier * sev / 5.0).round().max(0.0) as u32;
        let cost = base_daily_cost * profile.cost_multiplier * Decimal::from(severity) / Decimal::from(5u8);
        let (lo, hi) = profile.hull_damage;
        let hull = (f64::from(lo) + f64::from(hi.saturating_sub(lo)) * sev / 10.0).floor() as u32;
        HazardImpact {
            delay_days: delay,
            additional_cost: cost.max(Decimal::ZERO),
            hull_damage: hull,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HazardKind::SolarFlare => "solar flare",
            HazardKind::Micrometeorite => "micrometeorite",
            HazardKind::PowerFailure => "power failure",
            HazardKind::CommunicationFailure => "communication failure",
            HazardKind::RadiationStorm => "radiation storm",
            HazardKind::DebrisField => "debris field",
            HazardKind::EngineAnomaly => "engine anomaly",
            HazardKind::LifeSupportIssue => "life support issue",
        }
    }
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Exposure class of a mission phase. Transit is riskiest, stationary mining
/// least risky, ground-side phases carry no exposure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardPhase {
    TravelOutbound,
    TravelReturn,
    Operations,
    Extraction,
    Grounded,
}

impl HazardPhase {
    pub fn multiplier(self) -> f64 {
        match self {
            HazardPhase::TravelOutbound => 1.5,
            HazardPhase::TravelReturn => 1.3,
            HazardPhase::Operations => 1.2,
            HazardPhase::Extraction => 0.8,
            HazardPhase::Grounded => 0.0,
        }
    }
}

impl From<MissionPhase> for HazardPhase {
    fn from(phase: MissionPhase) -> Self {
        match phase {
            MissionPhase::TravelOutbound => HazardPhase::TravelOutbound,
            MissionPhase::TravelReturn => HazardPhase::TravelReturn,
            MissionPhase::Landing | MissionPhase::Setup | MissionPhase::ReEntry => {
                HazardPhase::Operations
            }
            MissionPhase::Extraction => HazardPhase::Extraction,
            _ => HazardPhase::Grounded,
        }
    }
}

/// Severity bands with weights 60/25/12/3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityLevel {
    Minor,
    Moderate,
    Severe,
    Critical,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 4] = [
        SeverityLevel::Minor,
        SeverityLevel::Moderate,
        SeverityLevel::Severe,
        SeverityLevel::Critical,
    ];
    const WEIGHTS: [f64; 4] = [60.0, 25.0, 12.0, 3.0];

    /// Inclusive numeric severity range of the band.
    pub fn range(self) -> (u8, u8) {
        match self {
            SeverityLevel::Minor => (1, 3),
            SeverityLevel::Moderate => (4, 6),
            SeverityLevel::Severe => (7, 8),
            SeverityLevel::Critical => (9, 10),
        }
    }

    pub fn from_severity(severity: u8) -> Self {
        match severity {
            0..=3 => SeverityLevel::Minor,
            4..=6 => SeverityLevel::Moderate,
            7..=8 => SeverityLevel::Severe,
            _ => SeverityLevel::Critical,
        }
    }

    /// Draw a band, then a uniform severity inside it.
    pub fn draw(rng: &mut SimRng) -> (SeverityLevel, u8) {
        let level = Self::ALL[rng.weighted_index(&Self::WEIGHTS)];
        let (lo, hi) = level.range();
        let sev = rng.uniform_u32(u32::from(lo), u32::from(hi)) as u8;
        (level, sev)
    }
}

/// Deterministic consequences of a hazard at a given severity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HazardImpact {
    pub delay_days: u32,
    pub additional_cost: Decimal,
    pub hull_damage: u32,
}

/// One hazard occurrence as recorded in a mission record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardEvent {
    pub kind: HazardKind,
    pub severity: u8,
    pub level: SeverityLevel,
    pub delay_days: u32,
    pub additional_cost: Decimal,
    pub hull_damage: u32,
    pub system_failure: bool,
    pub description: String,
    pub day: u32,
}

/// Roll every hazard type for one day and return the first that fires.
/// `scale` multiplies each probability before clamping (the day's luck).
pub fn roll_day(
    rng: &mut SimRng,
    phase: HazardPhase,
    days_in_space: u32,
    veteran_discount: f64,
    scale: f64,
) -> Option<HazardKind> {
    let mut fired = None;
    for kind in HazardKind::ALL {
        let p = (kind.probability(phase, days_in_space, veteran_discount) * scale).clamp(0.0, 1.0);
        if rng.chance(p) && fired.is_none() {
            fired = Some(kind);
        }
    }
    fired
}

/// Draw the severity and failure flag of a hazard that fired on `day`.
pub fn generate(rng: &mut SimRng, kind: HazardKind, day: u32, base_daily_cost: Decimal) -> HazardEvent {
    let (level, severity) = SeverityLevel::draw(rng);
    let impact = kind.impact(severity, base_daily_cost);
    let system_failure = rng.chance(kind.profile().failure_chance);
    let mut description = format!("{} (severity {severity})", kind.profile().description);
    if system_failure {
        description.push_str(", system failure");
    }
    HazardEvent {
        kind,
        severity,
        level,
        delay_days: impact.delay_days,
        additional_cost: impact.additional_cost,
        hull_damage: impact.hull_damage,
        system_failure,
        description,
        day,
    }
}

/// Aggregate view over a hazard history.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardStatistics {
    pub total_hazards: u32,
    pub total_hull_damage: u32,
    pub total_cost_impact: Decimal,
    pub total_delay_days: u32,
    pub by_kind: BTreeMap<HazardKind, u32>,
    pub by_level: BTreeMap<SeverityLevel, u32>,
    pub average_severity: f64,
}

impl HazardStatistics {
    pub fn from_history<'a>(history: impl IntoIterator<Item = &'a HazardEvent>) -> Self {
        let mut stats = HazardStatistics::default();
        let mut severity_sum = 0u32;
        for h in history {
            stats.total_hazards += 1;
            stats.total_hull_damage += h.hull_damage;
            stats.total_cost_impact += h.additional_cost;
            stats.total_delay_days += h.delay_days;
            *stats.by_kind.entry(h.kind).or_default() += 1;
            *stats.by_level.entry(h.level).or_default() += 1;
            severity_sum += u32::from(h.severity);
        }
        if stats.total_hazards > 0 {
            stats.average_severity = f64::from(severity_sum) / f64::from(stats.total_hazards);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn micrometeorite_at_severity_five() {
        let impact = HazardKind::Micrometeorite.impact(5, Decimal::new(75_000, 0));
        assert_eq!(impact.additional_cost, Decimal::new(225_000, 0));
        assert_eq!(impact.delay_days, 1);
        assert_eq!(impact.hull_damage, 3);
    }

    #[test]
    fn grounded_phases_never_fire() {
        let mut rng = SimRng::new(11);
        for kind in HazardKind::ALL {
            assert_eq!(kind.probability(HazardPhase::Grounded, 400, 0.0), 0.0);
        }
        for _ in 0..500 {
            assert!(roll_day(&mut rng, HazardPhase::Grounded, 400, 0.0, 1.5).is_none());
        }
        assert_eq!(HazardPhase::from(MissionPhase::Planning), HazardPhase::Grounded);
        assert_eq!(HazardPhase::from(MissionPhase::ReEntry), HazardPhase::Operations);
    }

    #[test]
    fn probability_formula() {
        let p = HazardKind::SolarFlare.probability(HazardPhase::TravelOutbound, 100, 0.1);
        let expected = 0.05 * 1.5 * 1.1 * 0.9;
        assert!((p - expected).abs() < 1e-12);
        assert!(
            HazardKind::DebrisField.probability(HazardPhase::Extraction, 0, 0.0)
                < HazardKind::DebrisField.probability(HazardPhase::TravelOutbound, 0, 0.0)
        );
    }

    #[test]
    fn veteran_discount_is_capped() {
        let capped = HazardKind::EngineAnomaly.probability(HazardPhase::Extraction, 10, MAX_VETERAN_DISCOUNT);
        let generous = HazardKind::EngineAnomaly.probability(HazardPhase::Extraction, 10, 0.9);
        assert_eq!(generous, capped);
        let expected = 0.03 * 0.8 * 1.01 * (1.0 - MAX_VETERAN_DISCOUNT);
        assert!((capped - expected).abs() < 1e-12);
    }

    #[test]
    fn severity_levels_match_ranges() {
        for level in SeverityLevel::ALL {
            let (lo, hi) = level.range();
            for s in lo..=hi {
                assert_eq!(SeverityLevel::from_severity(s), level);
            }
        }
    }

    #[test]
    fn statistics_over_history() {
        let mut rng = SimRng::new(5);
        let base = Decimal::new(75_000, 0);
        let history: Vec<HazardEvent> = (0..10)
            .map(|d| generate(&mut rng, HazardKind::ALL[d % 8], d as u32, base))
            .collect();
        let stats = HazardStatistics::from_history(&history);
        assert_eq!(stats.total_hazards, 10);
        assert_eq!(stats.by_kind.values().sum::<u32>(), 10);
        assert_eq!(stats.by_level.values().sum::<u32>(), 10);
        assert_eq!(stats.total_hull_damage, history.iter().map(|h| h.hull_damage).sum::<u32>());
        assert!(stats.average_severity >= 1.0 && stats.average_severity <= 10.0);
        assert_eq!(HazardStatistics::from_history(std::iter::empty()).average_severity, 0.0);
    }

    proptest! {
        #[test]
        fn impact_non_negative_and_cost_increasing(kind_idx in 0usize..8, sev in 1u8..10, base in 1i64..1_000_000) {
            let kind = HazardKind::ALL[kind_idx];
            let base = Decimal::new(base, 0);
            let lo = kind.impact(sev, base);
            let hi = kind.impact(sev + 1, base);
            prop_assert!(lo.additional_cost >= Decimal::ZERO);
            prop_assert!(hi.additional_cost > lo.additional_cost);
            prop_assert!(hi.hull_damage >= lo.hull_damage);
            prop_assert!(hi.delay_days >= lo.delay_days);
        }

        #[test]
        fn drawn_severity_within_band(seed in any::<u64>()) {
            let mut rng = SimRng::new(seed);
            let (level, sev) = SeverityLevel::draw(&mut rng);
            let (lo, hi) = level.range();
            prop_assert!(sev >= lo && sev <= hi);
        }

        #[test]
        fn probability_clamped(days in 0u32..100_000, vet in -1.0f64..2.0) {
            for kind in HazardKind::ALL {
                let p = kind.probability(HazardPhase::TravelOutbound, days, vet);
                prop_assert!((0.0..=1.0).contains(&p));
            }
        }
    }
}
