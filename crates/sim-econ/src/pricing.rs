//! Commodity pricing collaborator: a pluggable price source, the static
//! fallback table, and a once-per-day cache.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// Commodities the market buys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Commodity {
    Gold,
    Platinum,
    Palladium,
    Silver,
    Copper,
}

impl Commodity {
    pub const ALL: [Commodity; 5] = [
        Commodity::Gold,
        Commodity::Platinum,
        Commodity::Palladium,
        Commodity::Silver,
        Commodity::Copper,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Commodity::Gold => "Gold",
            Commodity::Platinum => "Platinum",
            Commodity::Palladium => "Palladium",
            Commodity::Silver => "Silver",
            Commodity::Copper => "Copper",
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown commodity: {0}")]
pub struct UnknownCommodity(pub String);

impl FromStr for Commodity {
    type Err = UnknownCommodity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Commodity::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCommodity(s.to_string()))
    }
}

/// Price source failures. Never fatal to a run: callers fall back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// The upstream source could not be reached or answered with an error.
    #[error("price source unavailable: {0}")]
    Unavailable(String),
    /// The source answered but without any usable price.
    #[error("price source returned no prices")]
    Empty,
}

/// USD per kg for each commodity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    per_kg: BTreeMap<Commodity, Decimal>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, commodity: Commodity, per_kg: Decimal) -> Self {
        self.set(commodity, per_kg);
        self
    }

    pub fn set(&mut self, commodity: Commodity, per_kg: Decimal) {
        self.per_kg.insert(commodity, per_kg);
    }

    pub fn get(&self, commodity: Commodity) -> Option<Decimal> {
        self.per_kg.get(&commodity).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.per_kg.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Commodity, Decimal)> + '_ {
        self.per_kg.iter().map(|(c, p)| (*c, *p))
    }
}

/// Static per-kg prices used whenever the live source is unavailable.
/// Derived from per-ounce quotes at 35.274 oz/kg.
pub fn fallback_prices() -> PriceTable {
    PriceTable::new()
        .with(Commodity::Gold, Decimal::new(70_548, 0))
        .with(Commodity::Platinum, Decimal::new(35_274, 0))
        .with(Commodity::Palladium, Decimal::new(70_548, 0))
        .with(Commodity::Silver, Decimal::new(88_185, 2))
        .with(Commodity::Copper, Decimal::new(141_096, 3))
}

/// Anything that can quote per-kg commodity prices for a calendar date.
pub trait PriceSource {
    fn fetch_prices_per_kg(&mut self, date: NaiveDate) -> Result<PriceTable, PricingError>;
}

/// A source that always answers with the same table.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticPrices(pub PriceTable);

impl Default for StaticPrices {
    fn default() -> Self {
        StaticPrices(fallback_prices())
    }
}

impl PriceSource for StaticPrices {
    fn fetch_prices_per_kg(&mut self, _date: NaiveDate) -> Result<PriceTable, PricingError> {
        if self.0.is_empty() {
            return Err(PricingError::Empty);
        }
        Ok(self.0.clone())
    }
}

/// Prices per kg on `date`. Source failures are logged and answered with the
/// fallback table; this never fails.
pub fn get_prices_per_unit_mass(source: &mut dyn PriceSource, date: NaiveDate) -> PriceTable {
    match source.fetch_prices_per_kg(date) {
        Ok(table) if !table.is_empty() => table,
        Ok(_) => {
            warn!(%date, "price source returned an empty table, using fallback prices");
            fallback_prices()
        }
        Err(e) => {
            warn!(%date, error = %e, "price source unavailable, using fallback prices");
            fallback_prices()
        }
    }
}

/// Wraps a source and refreshes at most once per calendar date. Markets are
/// closed on weekends, so a cached table is reused then.
#[derive(Debug)]
pub struct CachedPricing<S> {
    source: S,
    cache: Option<(NaiveDate, PriceTable)>,
}

impl<S: PriceSource> CachedPricing<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Date of the cached table, if any.
    pub fn cached_on(&self) -> Option<NaiveDate> {
        self.cache.as_ref().map(|(d, _)| *d)
    }

    pub fn prices_on(&mut self, date: NaiveDate) -> PriceTable {
        if let Some((cached, table)) = &self.cache {
            let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            if *cached == date || weekend {
                debug!(%date, cached = %cached, "using cached prices");
                return table.clone();
            }
        }
        match self.source.fetch_prices_per_kg(date) {
            Ok(table) if !table.is_empty() => {
                self.cache = Some((date, table.clone()));
                table
            }
            outcome => {
                if let Err(e) = outcome {
                    warn!(%date, error = %e, "price refresh failed");
                } else {
                    warn!(%date, "price refresh returned no prices");
                }
                match &self.cache {
                    Some((_, table)) => table.clone(),
                    None => fallback_prices(),
                }
            }
        }
    }
}

impl<S: PriceSource> PriceSource for CachedPricing<S> {
    /// Never fails: refresh failures are absorbed by the cache and the fallback table.
    fn fetch_prices_per_kg(&mut self, date: NaiveDate) -> Result<PriceTable, PricingError> {
        Ok(self.prices_on(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flaky {
        calls: u32,
        fail: bool,
    }

    impl PriceSource for Flaky {
        fn fetch_prices_per_kg(&mut self, _date: NaiveDate) -> Result<PriceTable, PricingError> {
            self.calls += 1;
            if self.fail {
                return Err(PricingError::Unavailable("timeout".into()));
            }
            Ok(PriceTable::new().with(Commodity::Gold, Decimal::from(self.calls)))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn commodity_parsing_is_case_insensitive() {
        assert_eq!("gold".parse::<Commodity>(), Ok(Commodity::Gold));
        assert_eq!(" PALLADIUM ".parse::<Commodity>(), Ok(Commodity::Palladium));
        assert!("Iron".parse::<Commodity>().is_err());
    }

    #[test]
    fn unavailable_source_falls_back() {
        let mut src = Flaky {
            calls: 0,
            fail: true,
        };
        let today = date(2024, 3, 18);
        assert_eq!(get_prices_per_unit_mass(&mut src, today), fallback_prices());
        let mut empty = StaticPrices(PriceTable::new());
        assert_eq!(get_prices_per_unit_mass(&mut empty, today), fallback_prices());
    }

    #[test]
    fn fallback_silver_and_copper() {
        let t = fallback_prices();
        assert_eq!(t.get(Commodity::Silver), Some(Decimal::new(88_185, 2)));
        assert_eq!(t.get(Commodity::Copper), Some(Decimal::new(141_096, 3)));
    }

    #[test]
    fn cache_refreshes_once_per_day_and_skips_weekends() {
        let mut cached = CachedPricing::new(Flaky {
            calls: 0,
            fail: false,
        });
        // 2024-03-15 is a Friday.
        let fri = date(2024, 3, 15);
        let first = cached.prices_on(fri);
        let again = cached.prices_on(fri);
        assert_eq!(first, again);
        assert_eq!(first.get(Commodity::Gold), Some(Decimal::from(1)));
        let sat = cached.prices_on(date(2024, 3, 16));
        assert_eq!(sat, first);
        let mon = cached.prices_on(date(2024, 3, 18));
        assert_eq!(mon.get(Commodity::Gold), Some(Decimal::from(2)));
        assert_eq!(cached.cached_on(), Some(date(2024, 3, 18)));
    }

    #[test]
    fn cache_survives_source_failure() {
        let mut cached = CachedPricing::new(Flaky {
            calls: 0,
            fail: false,
        });
        let mon = cached.prices_on(date(2024, 3, 18));
        cached.source.fail = true;
        assert_eq!(cached.prices_on(date(2024, 3, 19)), mon);

        let mut cold = CachedPricing::new(Flaky {
            calls: 0,
            fail: true,
        });
        assert_eq!(cold.prices_on(date(2024, 3, 19)), fallback_prices());
    }

    #[test]
    fn cached_source_plugs_in_as_a_price_source() {
        let mut cached = CachedPricing::new(Flaky {
            calls: 0,
            fail: false,
        });
        let source: &mut dyn PriceSource = &mut cached;
        let tue = date(2024, 3, 19);
        let first = get_prices_per_unit_mass(source, tue);
        let again = get_prices_per_unit_mass(source, tue);
        assert_eq!(first, again);
        assert_eq!(first.get(Commodity::Gold), Some(Decimal::from(1)));
        assert_eq!(cached.source.calls, 1);
        assert_eq!(cached.cached_on(), Some(tue));

        let mut cold = CachedPricing::new(Flaky {
            calls: 0,
            fail: true,
        });
        assert_eq!(get_prices_per_unit_mass(&mut cold, tue), fallback_prices());
    }
}
