//! Capacity-bounded cargo hold. Adding beyond capacity is rejected, never
//! clamped; callers that want truncation clamp against [`Cargo::remaining_kg`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CargoError {
    /// The requested mass does not fit in the hold.
    #[error("cargo overflow: requested {requested} kg with {remaining} kg remaining")]
    Overflow { requested: u64, remaining: u64 },
}

/// Mass held per commodity in integer kilograms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cargo {
    capacity_kg: u64,
    holds: BTreeMap<String, u64>,
    total_kg: u64,
}

impl Cargo {
    pub fn new(capacity_kg: u64) -> Self {
        Self {
            capacity_kg,
            holds: BTreeMap::new(),
            total_kg: 0,
        }
    }

    pub fn capacity_kg(&self) -> u64 {
        self.capacity_kg
    }

    pub fn total_kg(&self) -> u64 {
        self.total_kg
    }

    pub fn remaining_kg(&self) -> u64 {
        self.capacity_kg.saturating_sub(self.total_kg)
    }

    pub fn is_full(&self) -> bool {
        self.total_kg >= self.capacity_kg
    }

    pub fn holds(&self) -> &BTreeMap<String, u64> {
        &self.holds
    }

    pub fn add(&mut self, commodity: &str, kg: u64) -> Result<(), CargoError> {
        self.check(kg)?;
        if kg > 0 {
            *self.holds.entry(commodity.to_string()).or_insert(0) += kg;
            self.total_kg += kg;
        }
        Ok(())
    }

    /// Add several parts at once. Either every part is stored or none is.
    pub fn add_split(&mut self, parts: &[(String, u64)]) -> Result<(), CargoError> {
        let sum = parts
            .iter()
            .try_fold(0u64, |acc, (_, kg)| acc.checked_add(*kg))
            .ok_or(CargoError::Overflow {
                requested: u64::MAX,
                remaining: self.remaining_kg(),
            })?;
        self.check(sum)?;
        for (name, kg) in parts {
            self.add(name, *kg)?;
        }
        Ok(())
    }

    /// Empty the hold, returning what it contained.
    pub fn clear(&mut self) -> BTreeMap<String, u64> {
        self.total_kg = 0;
        std::mem::take(&mut self.holds)
    }

    fn check(&self, kg: u64) -> Result<(), CargoError> {
        let remaining = self.remaining_kg();
        if kg > remaining {
            return Err(CargoError::Overflow {
                requested: kg,
                remaining,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn overflow_is_rejected_not_clamped() {
        let mut cargo = Cargo::new(1_000);
        cargo.add("Gold", 600).unwrap();
        let err = cargo.add("Gold", 401).unwrap_err();
        assert_eq!(
            err,
            CargoError::Overflow {
                requested: 401,
                remaining: 400
            }
        );
        assert_eq!(cargo.total_kg(), 600);
        cargo.add("Iron", 400).unwrap();
        assert!(cargo.is_full());
    }

    #[test]
    fn split_is_atomic() {
        let mut cargo = Cargo::new(100);
        let parts = vec![("Iron".to_string(), 60), ("Nickel".to_string(), 50)];
        assert!(cargo.add_split(&parts).is_err());
        assert_eq!(cargo.total_kg(), 0);
        assert!(cargo.holds().is_empty());
    }

    #[test]
    fn clear_returns_contents() {
        let mut cargo = Cargo::new(100);
        cargo.add("Iron", 30).unwrap();
        cargo.add("Gold", 5).unwrap();
        let taken = cargo.clear();
        assert_eq!(taken.values().sum::<u64>(), 35);
        assert_eq!(cargo.total_kg(), 0);
        assert_eq!(cargo.remaining_kg(), 100);
    }

    proptest! {
        #[test]
        fn total_never_exceeds_capacity(cap in 1u64..10_000, adds in proptest::collection::vec(0u64..3_000, 0..20)) {
            let mut cargo = Cargo::new(cap);
            for kg in adds {
                let _ = cargo.add("Ore", kg);
                prop_assert!(cargo.total_kg() <= cargo.capacity_kg());
                prop_assert_eq!(cargo.holds().values().sum::<u64>(), cargo.total_kg());
            }
        }
    }
}
