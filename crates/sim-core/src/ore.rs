//! Ore yield model: class-dependent grade draws, extraction efficiency and
//! the split of mined mass into commodities and gangue.

use crate::rng::SimRng;
use crate::tables::{GradeBand, GRADE_MAX};
use crate::{Asteroid, AsteroidClass};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Elements that are sold as commodities. Everything else is bulk rock.
pub const VALUABLE_ELEMENTS: [&str; 7] = [
    "Gold",
    "Platinum",
    "Palladium",
    "Silver",
    "Copper",
    "Lithium",
    "Cobalt",
];

/// Name of the single hold used when an asteroid has no usable composition.
pub const REGOLITH: &str = "regolith";

pub fn is_valuable(name: &str) -> bool {
    VALUABLE_ELEMENTS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(name.trim()))
}

/// A drawn ore grade: its band and the exact percentage (as a fraction).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OreGrade {
    pub band: GradeBand,
    pub percentage: f64,
}

impl OreGrade {
    pub fn efficiency(&self) -> f64 {
        self.band.efficiency()
    }
}

/// Categorical weights over low/medium/high/premium. Metallic bodies lean
/// toward the richer bands.
fn grade_weights(class: AsteroidClass) -> [f64; 4] {
    match class {
        AsteroidClass::C => [0.40, 0.35, 0.20, 0.05],
        AsteroidClass::S => [0.30, 0.40, 0.25, 0.05],
        AsteroidClass::M => [0.25, 0.35, 0.30, 0.10],
    }
}

/// Per-class scaling of commodity mass.
pub fn class_multiplier(class: AsteroidClass) -> f64 {
    match class {
        AsteroidClass::C => 0.9,
        AsteroidClass::S => 1.0,
        AsteroidClass::M => 1.3,
    }
}

pub fn draw_grade(class: AsteroidClass, rng: &mut SimRng) -> OreGrade {
    let band = GradeBand::ALL[rng.weighted_index(&grade_weights(class))];
    let (lo, hi) = band.bounds();
    let percentage = if band == GradeBand::Premium {
        rng.uniform_f64_inclusive(lo, hi).min(GRADE_MAX)
    } else {
        rng.uniform_f64(lo, hi)
    };
    OreGrade { band, percentage }
}

/// Outcome of an extraction period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YieldReport {
    pub grade: OreGrade,
    /// Raw ore moved, kg.
    pub total_ore_kg: f64,
    /// Ore actually processed after efficiency losses, kg.
    pub effective_yield_kg: f64,
    /// Refined commodity mass per valuable element, kg.
    pub commodities_kg: BTreeMap<String, f64>,
    /// Waste rock separated from the effective yield, kg.
    pub gangue_kg: f64,
}

impl YieldReport {
    pub fn commodity_total_kg(&self) -> f64 {
        self.commodities_kg.values().sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OreYieldModel {
    pub max_daily_rate_kg: u64,
}

impl OreYieldModel {
    pub fn new(max_daily_rate_kg: u64) -> Self {
        Self { max_daily_rate_kg }
    }

    /// Yield of `days` of mining at a known grade, bounded by the remaining
    /// cargo capacity.
    pub fn extraction_yield(
        &self,
        asteroid: &Asteroid,
        days: u32,
        remaining_capacity_kg: u64,
        grade: OreGrade,
    ) -> YieldReport {
        let possible = u64::from(days).saturating_mul(self.max_daily_rate_kg);
        let total_ore_kg = possible.min(remaining_capacity_kg) as f64;
        let effective_yield_kg = total_ore_kg * grade.efficiency();

        let valuables: Vec<(&str, f64)> = asteroid
            .composition
            .iter()
            .filter(|e| is_valuable(&e.name) && e.mass_kg.is_finite() && e.mass_kg > 0.0)
            .map(|e| (e.name.as_str(), e.mass_kg))
            .collect();
        let valuable_mass: f64 = valuables.iter().map(|(_, m)| m).sum();

        let mut commodities_kg = BTreeMap::new();
        if valuable_mass > 0.0 {
            let class_mult = class_multiplier(asteroid.class);
            for (name, mass) in &valuables {
                let kg = effective_yield_kg * (mass / valuable_mass) * class_mult * grade.percentage;
                *commodities_kg.entry(name.to_string()).or_insert(0.0) += kg;
            }
            let bound = effective_yield_kg * grade.percentage;
            let sum: f64 = commodities_kg.values().sum();
            if sum > bound && sum > 0.0 {
                let scale = bound / sum;
                for v in commodities_kg.values_mut() {
                    *v *= scale;
                }
            }
        }

        YieldReport {
            grade,
            total_ore_kg,
            effective_yield_kg,
            commodities_kg,
            gangue_kg: effective_yield_kg * (1.0 - grade.percentage),
        }
    }

    /// Draw a grade for the asteroid and compute the period's yield.
    pub fn assess(
        &self,
        asteroid: &Asteroid,
        days: u32,
        remaining_capacity_kg: u64,
        rng: &mut SimRng,
    ) -> YieldReport {
        let grade = draw_grade(asteroid.class, rng);
        self.extraction_yield(asteroid, days, remaining_capacity_kg, grade)
    }
}

/// Split `kg` of mined mass across the asteroid's elements in proportion to
/// their available mass. The parts sum to exactly `kg`.
pub fn split_mass(asteroid: &Asteroid, kg: u64) -> Vec<(String, u64)> {
    let usable: Vec<(&str, f64)> = asteroid
        .composition
        .iter()
        .filter(|e| e.mass_kg.is_finite() && e.mass_kg > 0.0)
        .map(|e| (e.name.as_str(), e.mass_kg))
        .collect();
    let total: f64 = usable.iter().map(|(_, m)| m).sum();
    if usable.is_empty() || !total.is_finite() || total <= 0.0 {
        warn!(asteroid = %asteroid.name, "no usable composition, storing as regolith");
        return vec![(REGOLITH.to_string(), kg)];
    }

    let quotas: Vec<f64> = usable.iter().map(|(_, m)| kg as f64 * m / total).collect();
    let mut parts: Vec<u64> = quotas.iter().map(|q| (q.floor() as u64).min(kg)).collect();
    let assigned: u64 = parts.iter().sum();

    if assigned < kg {
        let mut order: Vec<usize> = (0..parts.len()).collect();
        order.sort_by(|&a, &b| {
            let ra = quotas[a] - quotas[a].floor();
            let rb = quotas[b] - quotas[b].floor();
            rb.total_cmp(&ra).then(a.cmp(&b))
        });
        let mut left = kg - assigned;
        for i in order.iter().cycle() {
            if left == 0 {
                break;
            }
            parts[*i] += 1;
            left -= 1;
        }
    } else if assigned > kg {
        let mut excess = assigned - kg;
        while excess > 0 {
            if let Some(max) = parts.iter_mut().max() {
                *max -= 1;
            }
            excess -= 1;
        }
    }

    usable
        .iter()
        .zip(parts)
        .filter(|(_, kg)| *kg > 0)
        .map(|((name, _), kg)| (name.to_string(), kg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Element;
    use proptest::prelude::*;

    fn psyche() -> Asteroid {
        Asteroid {
            name: "16 Psyche".to_string(),
            distance: 20.0,
            class: AsteroidClass::M,
            composition: vec![
                Element::new("Iron", 6.0e9),
                Element::new("Nickel", 3.0e9),
                Element::new("Gold", 3.0e6),
                Element::new("Platinum", 1.0e6),
            ],
        }
    }

    #[test]
    fn yield_is_bounded_by_capacity() {
        let model = OreYieldModel::new(1_500);
        let grade = OreGrade {
            band: GradeBand::High,
            percentage: 0.15,
        };
        let report = model.extraction_yield(&psyche(), 100, 50_000, grade);
        assert_eq!(report.total_ore_kg, 50_000.0);
        assert!((report.effective_yield_kg - 46_000.0).abs() < 1e-9);
        assert!((report.gangue_kg - 46_000.0 * 0.85).abs() < 1e-6);
    }

    #[test]
    fn metallic_commodities_are_rescaled_to_grade_bound() {
        let model = OreYieldModel::new(1_000);
        let grade = OreGrade {
            band: GradeBand::Medium,
            percentage: 0.08,
        };
        let report = model.extraction_yield(&psyche(), 10, 50_000, grade);
        let bound = report.effective_yield_kg * 0.08;
        assert!((report.commodity_total_kg() - bound).abs() < 1e-6);
        let gold = report.commodities_kg["Gold"];
        let platinum = report.commodities_kg["Platinum"];
        assert!((gold / platinum - 3.0).abs() < 1e-9);
        assert!(!report.commodities_kg.contains_key("Iron"));
    }

    #[test]
    fn carbonaceous_commodities_below_bound() {
        let mut a = psyche();
        a.class = AsteroidClass::C;
        let grade = OreGrade {
            band: GradeBand::Low,
            percentage: 0.02,
        };
        let report = OreYieldModel::new(1_000).extraction_yield(&a, 10, 50_000, grade);
        let bound = report.effective_yield_kg * 0.02;
        assert!((report.commodity_total_kg() - bound * 0.9).abs() < 1e-6);
    }

    #[test]
    fn split_sums_exactly() {
        let parts = split_mass(&psyche(), 1_237);
        assert_eq!(parts.iter().map(|(_, kg)| kg).sum::<u64>(), 1_237);
        assert_eq!(parts[0].0, "Iron");
    }

    #[test]
    fn empty_composition_is_regolith() {
        let mut a = psyche();
        a.composition.clear();
        assert_eq!(split_mass(&a, 900), vec![(REGOLITH.to_string(), 900)]);
    }

    #[test]
    fn valuable_names_case_insensitive() {
        assert!(is_valuable("gold"));
        assert!(is_valuable(" COBALT "));
        assert!(!is_valuable("Iron"));
    }

    proptest! {
        #[test]
        fn drawn_grade_round_trips(seed in any::<u64>(), class_idx in 0usize..3) {
            let mut rng = SimRng::new(seed);
            let grade = draw_grade(AsteroidClass::ALL[class_idx], &mut rng);
            prop_assert!(grade.band.contains(grade.percentage));
            prop_assert_eq!(GradeBand::classify(grade.percentage), grade.band);
        }

        #[test]
        fn split_is_exact(kg in 0u64..10_000_000, a in 0.0f64..1e9, b in 0.0f64..1e9, c in 1.0f64..1e9) {
            let ast = Asteroid {
                name: "x".to_string(),
                distance: 1.0,
                class: AsteroidClass::S,
                composition: vec![Element::new("A", a), Element::new("B", b), Element::new("C", c)],
            };
            let parts = split_mass(&ast, kg);
            prop_assert_eq!(parts.iter().map(|(_, k)| k).sum::<u64>(), kg);
        }
    }
}
