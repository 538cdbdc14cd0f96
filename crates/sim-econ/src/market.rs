//! Pooled sale arithmetic: the fleet sells its combined extracted mass once,
//! against a fixed commodity profile, at prices discounted by market impact
//! and trade barriers.

use crate::pricing::{Commodity, PriceTable};
use crate::EconError;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{Luck, SimRng};

/// Fraction of sold mass attributed to each commodity. Sums to one.
pub fn sale_profile() -> [(Commodity, Decimal); 5] {
    [
        (Commodity::Gold, Decimal::new(70, 2)),
        (Commodity::Platinum, Decimal::new(20, 2)),
        (Commodity::Palladium, Decimal::new(5, 2)),
        (Commodity::Silver, Decimal::new(4, 2)),
        (Commodity::Copper, Decimal::new(1, 2)),
    ]
}

/// Multiplicative price discounts applied to the whole sale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleFactors {
    /// Price depression from flooding the market, `(0, 1]`.
    pub market_impact: f64,
    /// Tariffs and other cross-border friction, `(0, 1]`.
    pub trade_barrier: f64,
}

impl SaleFactors {
    pub const NEUTRAL: SaleFactors = SaleFactors {
        market_impact: 1.0,
        trade_barrier: 1.0,
    };
}

/// Ranges the two factors are sampled from. Luckier fleets sell closer to list price.
pub fn factor_ranges(luck: Luck) -> ((f64, f64), (f64, f64)) {
    match luck.value() {
        0..=30 => ((0.80, 0.90), (0.85, 0.95)),
        31..=70 => ((0.85, 0.95), (0.90, 0.98)),
        _ => ((0.90, 1.00), (0.95, 1.00)),
    }
}

pub fn draw_sale_factors(luck: Luck, rng: &mut SimRng) -> SaleFactors {
    let ((mi_lo, mi_hi), (tb_lo, tb_hi)) = factor_ranges(luck);
    SaleFactors {
        market_impact: rng.uniform_f64_inclusive(mi_lo, mi_hi),
        trade_barrier: rng.uniform_f64_inclusive(tb_lo, tb_hi),
    }
}

/// One commodity line of a pooled sale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub commodity: Commodity,
    pub mass_kg: Decimal,
    pub list_price_per_kg: Decimal,
    pub effective_price_per_kg: Decimal,
    pub revenue: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PooledSale {
    pub total_mass_kg: u64,
    pub factors: SaleFactors,
    pub lines: Vec<SaleLine>,
    pub total_revenue: Decimal,
}

impl PooledSale {
    pub fn line(&self, commodity: Commodity) -> Option<&SaleLine> {
        self.lines.iter().find(|l| l.commodity == commodity)
    }

    /// Revenue attributed to a vessel that contributed `mass_kg`.
    pub fn share_for(&self, mass_kg: u64) -> Decimal {
        if self.total_mass_kg == 0 {
            return Decimal::ZERO;
        }
        self.total_revenue * Decimal::from(mass_kg) / Decimal::from(self.total_mass_kg)
    }
}

/// Sell the combined `masses` at `prices` discounted by `factors`.
/// Commodities missing from the price table sell for nothing.
///
/// Example:
/// let sale = pooled_sale(&[10_000, 40_000], &fallback_prices(), SaleFactors::NEUTRAL)?;
/// assert_eq!(sale.total_mass_kg, 50_000);
pub fn pooled_sale(
    masses: &[u64],
    prices: &PriceTable,
    factors: SaleFactors,
) -> Result<PooledSale, EconError> {
    let total_mass_kg = masses
        .iter()
        .try_fold(0u64, |acc, m| acc.checked_add(*m))
        .ok_or(EconError::NonFinite)?;
    let impact = factor_decimal(factors.market_impact)?;
    let barrier = factor_decimal(factors.trade_barrier)?;
    let total = Decimal::from(total_mass_kg);

    let mut lines = Vec::with_capacity(5);
    let mut total_revenue = Decimal::ZERO;
    for (commodity, fraction) in sale_profile() {
        let list = prices.get(commodity).unwrap_or(Decimal::ZERO);
        if list < Decimal::ZERO {
            return Err(EconError::InvalidPrice);
        }
        let mass_kg = total * fraction;
        let effective = list * impact * barrier;
        let revenue = mass_kg * effective;
        total_revenue += revenue;
        lines.push(SaleLine {
            commodity,
            mass_kg,
            list_price_per_kg: list,
            effective_price_per_kg: effective,
            revenue,
        });
    }
    Ok(PooledSale {
        total_mass_kg,
        factors,
        lines,
        total_revenue,
    })
}

fn factor_decimal(f: f64) -> Result<Decimal, EconError> {
    if !f.is_finite() || f < 0.0 {
        return Err(EconError::NonFinite);
    }
    Decimal::from_f64(f).ok_or(EconError::NonFinite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::fallback_prices;
    use proptest::prelude::*;

    #[test]
    fn gold_revenue_from_three_vessels() {
        let prices = fallback_prices();
        let sale = pooled_sale(&[10_000, 15_000, 25_000], &prices, SaleFactors::NEUTRAL).unwrap();
        let gold = sale.line(Commodity::Gold).unwrap();
        let price = prices.get(Commodity::Gold).unwrap();
        assert_eq!(gold.mass_kg, Decimal::from(35_000));
        assert_eq!(gold.revenue, Decimal::from(35_000) * price);
        let mass: Decimal = sale.lines.iter().map(|l| l.mass_kg).sum();
        assert_eq!(mass, Decimal::from(50_000));
    }

    #[test]
    fn shares_are_proportional() {
        let sale = pooled_sale(&[10_000, 30_000], &fallback_prices(), SaleFactors::NEUTRAL).unwrap();
        let a = sale.share_for(10_000);
        let b = sale.share_for(30_000);
        assert_eq!(a * Decimal::from(3), b);
        assert_eq!(a + b, sale.total_revenue);
    }

    #[test]
    fn empty_sale_has_no_revenue() {
        let sale = pooled_sale(&[], &fallback_prices(), SaleFactors::NEUTRAL).unwrap();
        assert_eq!(sale.total_revenue, Decimal::ZERO);
        assert_eq!(sale.share_for(0), Decimal::ZERO);
    }

    #[test]
    fn discounts_reduce_revenue() {
        let prices = fallback_prices();
        let full = pooled_sale(&[1_000], &prices, SaleFactors::NEUTRAL).unwrap();
        let cut = pooled_sale(
            &[1_000],
            &prices,
            SaleFactors {
                market_impact: 0.5,
                trade_barrier: 0.5,
            },
        )
        .unwrap();
        assert_eq!(cut.total_revenue * Decimal::from(4), full.total_revenue);
        assert!(pooled_sale(
            &[1],
            &prices,
            SaleFactors {
                market_impact: f64::NAN,
                trade_barrier: 1.0
            }
        )
        .is_err());
    }

    proptest! {
        #[test]
        fn drawn_factors_within_luck_ranges(seed in any::<u64>(), luck in 1u8..=100) {
            let mut rng = SimRng::new(seed);
            let luck = Luck::new(luck);
            let f = draw_sale_factors(luck, &mut rng);
            let ((mi_lo, mi_hi), (tb_lo, tb_hi)) = factor_ranges(luck);
            prop_assert!(f.market_impact >= mi_lo && f.market_impact <= mi_hi);
            prop_assert!(f.trade_barrier >= tb_lo && f.trade_barrier <= tb_hi);
        }
    }
}
