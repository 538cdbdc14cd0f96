//! Portfolio view over many settled missions.

use crate::{roi_percent, MissionEconomics};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub missions: u32,
    pub profitable_missions: u32,
    /// Percentage of missions with a positive net profit.
    pub success_rate: Decimal,
    pub total_profit: Decimal,
    pub total_cost: Decimal,
    pub average_profit: Decimal,
    pub overall_roi_percent: Decimal,
}

impl PortfolioSummary {
    pub fn from_missions<'a>(missions: impl IntoIterator<Item = &'a MissionEconomics>) -> Self {
        let mut s = PortfolioSummary::default();
        for m in missions {
            s.missions += 1;
            if m.net_profit > Decimal::ZERO {
                s.profitable_missions += 1;
            }
            s.total_profit += m.net_profit;
            s.total_cost += m.costs.total;
        }
        if s.missions > 0 {
            let n = Decimal::from(s.missions);
            s.success_rate = Decimal::from(s.profitable_missions) / n * Decimal::ONE_HUNDRED;
            s.average_profit = s.total_profit / n;
        }
        s.overall_roi_percent = roi_percent(s.total_profit, s.total_cost);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{evaluate_mission, fallback_prices};
    use sim_core::{CostStructure, MissionOutcome, MissionRecord, VesselId};

    #[test]
    fn empty_portfolio_is_zeroed() {
        let s = PortfolioSummary::from_missions(std::iter::empty());
        assert_eq!(s, PortfolioSummary::default());
    }

    #[test]
    fn aggregates_profit_and_rate() {
        let mut r = MissionRecord::new(VesselId(0), 0);
        r.finished_day = Some(9);
        r.outcome = MissionOutcome::NoAsteroid;
        let costs = CostStructure::default();
        let m = evaluate_mission(&r, &fallback_prices(), &costs).unwrap();
        let mut winner = m.clone();
        winner.net_profit = Decimal::from(5_000_000);
        let all = [m.clone(), winner];
        let s = PortfolioSummary::from_missions(&all);
        assert_eq!(s.missions, 2);
        assert_eq!(s.profitable_missions, 1);
        assert_eq!(s.success_rate, Decimal::from(50));
        assert_eq!(s.total_profit, m.net_profit + Decimal::from(5_000_000));
        assert_eq!(s.total_cost, m.costs.total * Decimal::from(2));
        assert_eq!(s.average_profit, s.total_profit / Decimal::from(2));
    }
}
