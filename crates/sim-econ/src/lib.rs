#![deny(warnings)]

//! Mission economics: cost breakdown, cargo valuation, settlement and risk
//! assessment for finished mining missions, plus the pooled fleet sale.
//!
//! Everything here is a pure function of its inputs. Settling the same
//! finished mission record twice yields identical figures.

pub mod market;
pub mod pricing;
pub mod summary;

pub use market::{draw_sale_factors, pooled_sale, PooledSale, SaleFactors, SaleLine};
pub use pricing::{
    fallback_prices, get_prices_per_unit_mass, CachedPricing, Commodity, PriceSource, PriceTable,
    PricingError, StaticPrices,
};
pub use summary::PortfolioSummary;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{CostStructure, HazardStatistics, MissionRecord, VesselId};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Monetary values must be non-negative and finite.
    #[error("invalid price or cost value")]
    InvalidPrice,
    /// Numeric conversion to Decimal failed.
    #[error("non-finite numeric conversion")]
    NonFinite,
    /// Only finished missions can be settled.
    #[error("mission of {0} is still in progress")]
    NotFinalized(VesselId),
}

/// The simulated counts a mission's costs are linear in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionFacts {
    pub total_days: u32,
    pub launch_scrubs: u32,
    pub hazard_count: u32,
    pub mining_days: u32,
    pub hull_damage: u32,
    pub ore_grade: Option<f64>,
    pub effective_yield_kg: f64,
}

impl MissionFacts {
    pub fn from_record(record: &MissionRecord) -> Self {
        Self {
            total_days: record.total_days(),
            launch_scrubs: record.launch_scrubs,
            hazard_count: record.hazard_count(),
            mining_days: record.mining_days,
            hull_damage: record.hull_damage,
            ore_grade: record.ore_grade().map(|g| g.percentage),
            effective_yield_kg: record
                .yield_report
                .as_ref()
                .map(|r| r.effective_yield_kg)
                .unwrap_or(0.0),
        }
    }
}

/// Per-component mission cost in USD.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub ground_control: Decimal,
    pub launch_scrubs: Decimal,
    pub space_events: Decimal,
    pub mining_operations: Decimal,
    pub ship_maintenance: Decimal,
    pub fuel: Decimal,
    pub life_support: Decimal,
    pub total: Decimal,
}

pub fn cost_breakdown(facts: &MissionFacts, costs: &CostStructure) -> CostBreakdown {
    let days = Decimal::from(facts.total_days);
    let mut b = CostBreakdown {
        ground_control: costs.ground_control_per_day * days,
        launch_scrubs: costs.launch_scrub * Decimal::from(facts.launch_scrubs),
        space_events: costs.space_event * Decimal::from(facts.hazard_count),
        mining_operations: costs.mining_operations_per_day * Decimal::from(facts.mining_days),
        ship_maintenance: costs.ship_maintenance_per_day * days,
        fuel: costs.fuel_per_day * days,
        life_support: costs.life_support_per_day * days,
        total: Decimal::ZERO,
    };
    b.total = b.ground_control
        + b.launch_scrubs
        + b.space_events
        + b.mining_operations
        + b.ship_maintenance
        + b.fuel
        + b.life_support;
    b
}

/// Value of refined cargo at current prices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CargoValuation {
    pub lines: BTreeMap<String, Decimal>,
    pub total: Decimal,
    /// Commodities without a market price; valued at zero.
    pub unpriced: Vec<String>,
}

/// Value each commodity as `mass × price per kg`.
pub fn value_cargo(
    commodities_kg: &BTreeMap<String, f64>,
    prices: &PriceTable,
) -> Result<CargoValuation, EconError> {
    let mut v = CargoValuation::default();
    for (name, kg) in commodities_kg {
        if !kg.is_finite() || *kg < 0.0 {
            return Err(EconError::NonFinite);
        }
        let price = name
            .parse::<Commodity>()
            .ok()
            .and_then(|c| prices.get(c));
        let Some(price) = price else {
            warn!(commodity = %name, "no market price, valuing at zero");
            v.unpriced.push(name.clone());
            v.lines.insert(name.clone(), Decimal::ZERO);
            continue;
        };
        let mass = Decimal::from_f64(*kg).ok_or(EconError::NonFinite)?;
        let value = mass * price;
        v.total += value;
        v.lines.insert(name.clone(), value);
    }
    Ok(v)
}

/// Principal plus simple interest over the mission duration.
///
/// Example:
/// // 1,000,000 over 365 days at 15% -> 1,150,000
pub fn investor_repayment(total_cost: Decimal, total_days: u32, costs: &CostStructure) -> Decimal {
    let years = Decimal::from(total_days) / Decimal::from(365);
    total_cost * (Decimal::ONE + costs.investor_annual_rate * years)
}

pub fn ship_repair_cost(hull_damage: u32, costs: &CostStructure) -> Decimal {
    (costs.repair_per_damage_point * Decimal::from(hull_damage)).min(costs.repair_cap)
}

pub fn gangue_separation_cost(effective_yield_kg: f64, costs: &CostStructure) -> Result<Decimal, EconError> {
    if !effective_yield_kg.is_finite() || effective_yield_kg < 0.0 {
        return Err(EconError::NonFinite);
    }
    let kg = Decimal::from_f64(effective_yield_kg).ok_or(EconError::NonFinite)?;
    Ok(kg * costs.gangue_separation_per_kg)
}

/// Return on investment in percent; zero when nothing was spent.
pub fn roi_percent(net_profit: Decimal, total_cost: Decimal) -> Decimal {
    if total_cost.is_zero() {
        return Decimal::ZERO;
    }
    net_profit / total_cost * Decimal::ONE_HUNDRED
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskFactor {
    LowProfitMargin,
    HighTotalCost,
    LowRoi,
    HighHullDamage,
    LongDuration,
    LowOreGrade,
}

impl RiskFactor {
    pub const ALL: [RiskFactor; 6] = [
        RiskFactor::LowProfitMargin,
        RiskFactor::HighTotalCost,
        RiskFactor::LowRoi,
        RiskFactor::HighHullDamage,
        RiskFactor::LongDuration,
        RiskFactor::LowOreGrade,
    ];

    pub fn recommendation(self) -> &'static str {
        match self {
            RiskFactor::LowProfitMargin => {
                "Consider higher-grade asteroids or longer mining operations"
            }
            RiskFactor::HighTotalCost => "Optimize mission duration and reduce operational costs",
            RiskFactor::LowRoi => "Focus on high-value commodities and efficient operations",
            RiskFactor::HighHullDamage => "Invest in better ship protection and hazard avoidance",
            RiskFactor::LongDuration => "Consider shorter missions or more efficient travel routes",
            RiskFactor::LowOreGrade => "Target asteroids with higher commodity concentrations",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=1 => RiskLevel::Low,
            2..=3 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

/// Limits beyond which a figure counts as a risk factor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub min_net_profit: Decimal,
    pub max_total_cost: Decimal,
    pub min_roi_percent: Decimal,
    pub max_hull_damage: u32,
    pub max_days: u32,
    pub min_ore_grade: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            min_net_profit: Decimal::new(100_000_000, 0),
            max_total_cost: Decimal::new(500_000_000, 0),
            min_roi_percent: Decimal::new(50, 0),
            max_hull_damage: 10,
            max_days: 300,
            min_ore_grade: 0.05,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub net_profit: Decimal,
    pub total_cost: Decimal,
    pub roi_percent: Decimal,
    pub hull_damage: u32,
    pub total_days: u32,
    /// `None` when nothing was mined, which counts as a low grade.
    pub ore_grade: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub factors: Vec<RiskFactor>,
    pub score: u32,
    pub level: RiskLevel,
    pub recommendations: Vec<String>,
}

impl RiskAssessment {
    pub fn has(&self, factor: RiskFactor) -> bool {
        self.factors.contains(&factor)
    }
}

impl RiskThresholds {
    pub fn assess(&self, inputs: &RiskInputs) -> RiskAssessment {
        let flagged = |f: RiskFactor| match f {
            RiskFactor::LowProfitMargin => inputs.net_profit < self.min_net_profit,
            RiskFactor::HighTotalCost => inputs.total_cost > self.max_total_cost,
            RiskFactor::LowRoi => inputs.roi_percent < self.min_roi_percent,
            RiskFactor::HighHullDamage => inputs.hull_damage > self.max_hull_damage,
            RiskFactor::LongDuration => inputs.total_days > self.max_days,
            RiskFactor::LowOreGrade => inputs.ore_grade.map_or(true, |g| g < self.min_ore_grade),
        };
        let factors: Vec<RiskFactor> = RiskFactor::ALL.into_iter().filter(|f| flagged(*f)).collect();
        let score = factors.len() as u32;
        RiskAssessment {
            recommendations: factors.iter().map(|f| f.recommendation().to_string()).collect(),
            level: RiskLevel::from_score(score),
            score,
            factors,
        }
    }
}

/// Assess against the default thresholds.
pub fn assess_risk(inputs: &RiskInputs) -> RiskAssessment {
    RiskThresholds::default().assess(inputs)
}

/// Full settlement of one finished mission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MissionEconomics {
    pub vessel: VesselId,
    pub facts: MissionFacts,
    pub costs: CostBreakdown,
    pub cargo: CargoValuation,
    pub investor_repayment: Decimal,
    pub ship_repair: Decimal,
    pub gangue_separation: Decimal,
    pub net_profit: Decimal,
    pub roi_percent: Decimal,
    pub risk: RiskAssessment,
    pub hazards: HazardStatistics,
    /// This vessel's share of the pooled sale, when it took part in one.
    pub pooled_revenue_share: Option<Decimal>,
}

/// Settle a finished mission. Pure: the same record always settles identically.
pub fn evaluate_mission(
    record: &MissionRecord,
    prices: &PriceTable,
    costs: &CostStructure,
) -> Result<MissionEconomics, EconError> {
    if !record.is_finalized() {
        return Err(EconError::NotFinalized(record.vessel));
    }
    let facts = MissionFacts::from_record(record);
    let breakdown = cost_breakdown(&facts, costs);
    let cargo = value_cargo(&record.commodity_yield(), prices)?;
    let investor = investor_repayment(breakdown.total, facts.total_days, costs);
    let repair = ship_repair_cost(facts.hull_damage, costs);
    let gangue = gangue_separation_cost(facts.effective_yield_kg, costs)?;
    let net_profit = cargo.total - breakdown.total - investor - repair - gangue;
    let roi = roi_percent(net_profit, breakdown.total);
    let risk = assess_risk(&RiskInputs {
        net_profit,
        total_cost: breakdown.total,
        roi_percent: roi,
        hull_damage: facts.hull_damage,
        total_days: facts.total_days,
        ore_grade: facts.ore_grade,
    });
    Ok(MissionEconomics {
        vessel: record.vessel,
        costs: breakdown,
        cargo,
        investor_repayment: investor,
        ship_repair: repair,
        gangue_separation: gangue,
        net_profit,
        roi_percent: roi,
        risk,
        hazards: HazardStatistics::from_history(&record.hazards),
        pooled_revenue_share: record.sale_share,
        facts,
    })
}

/// Fleet-level settlement: every mission's costs against the pooled-sale revenue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetEconomics {
    pub missions: Vec<MissionEconomics>,
    pub revenue: Decimal,
    pub total_cost: Decimal,
    pub investor_repayment: Decimal,
    pub ship_repair: Decimal,
    pub gangue_separation: Decimal,
    pub net_profit: Decimal,
    pub roi_percent: Decimal,
    pub risk: RiskAssessment,
}

pub fn evaluate_fleet(
    records: &[MissionRecord],
    sale: Option<&PooledSale>,
    prices: &PriceTable,
    costs: &CostStructure,
) -> Result<FleetEconomics, EconError> {
    let missions = records
        .iter()
        .map(|r| evaluate_mission(r, prices, costs))
        .collect::<Result<Vec<_>, _>>()?;
    let revenue = sale.map(|s| s.total_revenue).unwrap_or(Decimal::ZERO);
    let total_cost: Decimal = missions.iter().map(|m| m.costs.total).sum();
    let investor: Decimal = missions.iter().map(|m| m.investor_repayment).sum();
    let repair: Decimal = missions.iter().map(|m| m.ship_repair).sum();
    let gangue: Decimal = missions.iter().map(|m| m.gangue_separation).sum();
    let net_profit = revenue - total_cost - investor - repair - gangue;
    let roi = roi_percent(net_profit, total_cost);

    let grades: Vec<f64> = missions.iter().filter_map(|m| m.facts.ore_grade).collect();
    let mean_grade = if grades.is_empty() {
        None
    } else {
        Some(grades.iter().sum::<f64>() / grades.len() as f64)
    };
    let risk = assess_risk(&RiskInputs {
        net_profit,
        total_cost,
        roi_percent: roi,
        hull_damage: missions.iter().map(|m| m.facts.hull_damage).max().unwrap_or(0),
        total_days: missions.iter().map(|m| m.facts.total_days).max().unwrap_or(0),
        ore_grade: mean_grade,
    });
    Ok(FleetEconomics {
        missions,
        revenue,
        total_cost,
        investor_repayment: investor,
        ship_repair: repair,
        gangue_separation: gangue,
        net_profit,
        roi_percent: roi,
        risk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{GradeBand, MissionOutcome, OreGrade, OreYieldModel, YieldReport};

    fn finished_record() -> MissionRecord {
        let mut r = MissionRecord::new(VesselId(0), 0);
        r.finished_day = Some(99);
        r.outcome = MissionOutcome::Completed;
        r.launch_scrubs = 1;
        r.mining_days = 40;
        r.hull_damage = 3;
        let mut commodities_kg = BTreeMap::new();
        commodities_kg.insert("Gold".to_string(), 1_000.0);
        commodities_kg.insert("Cobalt".to_string(), 10.0);
        r.yield_report = Some(YieldReport {
            grade: OreGrade {
                band: GradeBand::High,
                percentage: 0.12,
            },
            total_ore_kg: 50_000.0,
            effective_yield_kg: 46_000.0,
            commodities_kg,
            gangue_kg: 46_000.0 * 0.88,
        });
        r
    }

    #[test]
    fn breakdown_is_linear_in_counts() {
        let costs = CostStructure::default();
        let facts = MissionFacts {
            total_days: 100,
            launch_scrubs: 2,
            hazard_count: 3,
            mining_days: 40,
            ..MissionFacts::default()
        };
        let b = cost_breakdown(&facts, &costs);
        assert_eq!(b.ground_control, Decimal::from(7_500_000));
        assert_eq!(b.launch_scrubs, Decimal::from(150_000));
        assert_eq!(b.space_events, Decimal::from(300_000));
        assert_eq!(b.mining_operations, Decimal::from(2_000_000));
        assert_eq!(b.total, Decimal::from(7_500_000 + 150_000 + 300_000 + 2_000_000 + 5_000_000));
    }

    #[test]
    fn negative_roi_flags_low_roi_and_margin() {
        let roi = roi_percent(Decimal::from(-10), Decimal::from(100));
        assert_eq!(roi, Decimal::from(-10));
        let risk = assess_risk(&RiskInputs {
            net_profit: Decimal::from(-10),
            total_cost: Decimal::from(100),
            roi_percent: roi,
            hull_damage: 0,
            total_days: 10,
            ore_grade: Some(0.2),
        });
        assert!(risk.has(RiskFactor::LowRoi));
        assert!(risk.has(RiskFactor::LowProfitMargin));
        assert_eq!(risk.score, 2);
        assert_eq!(risk.level, RiskLevel::Medium);
        assert_eq!(
            risk.recommendations,
            vec![
                "Consider higher-grade asteroids or longer mining operations".to_string(),
                "Focus on high-value commodities and efficient operations".to_string(),
            ]
        );
    }

    #[test]
    fn roi_zero_without_cost() {
        assert_eq!(roi_percent(Decimal::from(5), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn repair_is_capped() {
        let costs = CostStructure::default();
        assert_eq!(ship_repair_cost(3, &costs), Decimal::from(3_000_000));
        assert_eq!(ship_repair_cost(40, &costs), Decimal::from(25_000_000));
    }

    #[test]
    fn investor_interest_is_simple() {
        let costs = CostStructure::default();
        assert_eq!(
            investor_repayment(Decimal::from(1_000_000), 365, &costs),
            Decimal::from(1_150_000)
        );
        assert_eq!(
            investor_repayment(Decimal::from(1_000_000), 0, &costs),
            Decimal::from(1_000_000)
        );
    }

    #[test]
    fn unpriced_commodities_value_at_zero() {
        let r = finished_record();
        let v = value_cargo(&r.commodity_yield(), &fallback_prices()).unwrap();
        assert_eq!(v.total, Decimal::from(70_548_000));
        assert_eq!(v.unpriced, vec!["Cobalt".to_string()]);
    }

    #[test]
    fn settlement_is_idempotent() {
        let r = finished_record();
        let costs = CostStructure::default();
        let prices = fallback_prices();
        let a = evaluate_mission(&r, &prices, &costs).unwrap();
        let b = evaluate_mission(&r, &prices, &costs).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.facts.total_days, 100);
        assert_eq!(a.gangue_separation, Decimal::from(23_000));
        assert_eq!(
            a.net_profit,
            a.cargo.total - a.costs.total - a.investor_repayment - a.ship_repair - a.gangue_separation
        );
    }

    #[test]
    fn in_progress_mission_is_rejected() {
        let r = MissionRecord::new(VesselId(4), 0);
        assert_eq!(
            evaluate_mission(&r, &fallback_prices(), &CostStructure::default()).unwrap_err(),
            EconError::NotFinalized(VesselId(4))
        );
    }

    #[test]
    fn fleet_uses_pooled_revenue() {
        let records = vec![finished_record(), finished_record()];
        let prices = fallback_prices();
        let costs = CostStructure::default();
        let sale = pooled_sale(&[20_000, 30_000], &prices, SaleFactors::NEUTRAL).unwrap();
        let fleet = evaluate_fleet(&records, Some(&sale), &prices, &costs).unwrap();
        assert_eq!(fleet.revenue, sale.total_revenue);
        assert_eq!(fleet.total_cost, fleet.missions[0].costs.total * Decimal::from(2));
        let none = evaluate_fleet(&records, None, &prices, &costs).unwrap();
        assert_eq!(none.revenue, Decimal::ZERO);
        assert!(none.risk.has(RiskFactor::LowRoi));
    }

    #[test]
    fn yield_model_feeds_valuation() {
        let asteroid = sim_core::Asteroid {
            name: "test".into(),
            distance: 1.0,
            class: sim_core::AsteroidClass::S,
            composition: vec![sim_core::Element::new("Gold", 1.0)],
        };
        let grade = OreGrade {
            band: GradeBand::Medium,
            percentage: 0.05,
        };
        let report = OreYieldModel::new(1_000).extraction_yield(&asteroid, 10, 50_000, grade);
        let v = value_cargo(&report.commodities_kg, &fallback_prices()).unwrap();
        assert!(v.total > Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn risk_score_matches_factors(net in -1_000_000_000i64..1_000_000_000, cost in 0i64..1_000_000_000,
                                      hull in 0u32..30, days in 0u32..600, grade in 0.0f64..0.4) {
            let net = Decimal::from(net);
            let cost = Decimal::from(cost);
            let risk = assess_risk(&RiskInputs {
                net_profit: net,
                total_cost: cost,
                roi_percent: roi_percent(net, cost),
                hull_damage: hull,
                total_days: days,
                ore_grade: Some(grade),
            });
            prop_assert_eq!(risk.score as usize, risk.factors.len());
            prop_assert_eq!(risk.recommendations.len(), risk.factors.len());
            prop_assert_eq!(risk.level, RiskLevel::from_score(risk.score));
        }
    }
}
