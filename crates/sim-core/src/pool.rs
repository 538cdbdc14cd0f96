//! Fleet-wide asteroid pool. Asteroids live in an arena and are claimed by
//! index; a claim removes the asteroid from the available list and records
//! its owner in one step, and is never undone within a run.

use crate::rng::SimRng;
use crate::{Asteroid, AsteroidId, VesselId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("asteroid {0:?} does not exist")]
    Unknown(AsteroidId),
    #[error("asteroid {asteroid:?} already claimed by {owner}")]
    AlreadyClaimed { asteroid: AsteroidId, owner: VesselId },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Slot {
    asteroid: Asteroid,
    claimed_by: Option<VesselId>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AsteroidPool {
    slots: Vec<Slot>,
    available: Vec<AsteroidId>,
}

impl AsteroidPool {
    pub fn new(asteroids: impl IntoIterator<Item = Asteroid>) -> Self {
        let slots: Vec<Slot> = asteroids
            .into_iter()
            .map(|asteroid| Slot {
                asteroid,
                claimed_by: None,
            })
            .collect();
        let available = (0..slots.len()).map(AsteroidId).collect();
        Self { slots, available }
    }

    /// Number of asteroids still claimable.
    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, id: AsteroidId) -> Option<&Asteroid> {
        self.slots.get(id.0).map(|s| &s.asteroid)
    }

    pub fn claimed_by(&self, id: AsteroidId) -> Option<VesselId> {
        self.slots.get(id.0).and_then(|s| s.claimed_by)
    }

    /// Claim a specific asteroid for `vessel`.
    pub fn claim(&mut self, id: AsteroidId, vessel: VesselId) -> Result<&Asteroid, ClaimError> {
        let slot = self.slots.get_mut(id.0).ok_or(ClaimError::Unknown(id))?;
        if let Some(owner) = slot.claimed_by {
            return Err(ClaimError::AlreadyClaimed {
                asteroid: id,
                owner,
            });
        }
        slot.claimed_by = Some(vessel);
        self.available.retain(|a| *a != id);
        Ok(&slot.asteroid)
    }

    /// Claim a uniformly random available asteroid, or `None` when the pool is exhausted.
    pub fn claim_random(
        &mut self,
        rng: &mut SimRng,
        vessel: VesselId,
    ) -> Option<(AsteroidId, Asteroid)> {
        if self.available.is_empty() {
            return None;
        }
        let idx = rng.uniform_u64(0, (self.available.len() - 1) as u64) as usize;
        let id = self.available.swap_remove(idx);
        let slot = self.slots.get_mut(id.0)?;
        slot.claimed_by = Some(vessel);
        Some((id, slot.asteroid.clone()))
    }
}
