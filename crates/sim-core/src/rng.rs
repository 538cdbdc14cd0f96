//! Stochastic engine: a seedable random source plus the dice-like helpers the
//! models draw from, and the per-day luck value.
//!
//! A run owns exactly one master seed. Independent actors get their own
//! ChaCha stream via [`SimRng::fork`], so the order in which actors act
//! within a simulated day never changes any actor's draws.

use crate::ValidationError;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seedable random source injected into every stochastic component.
#[derive(Clone, Debug)]
pub struct SimRng {
    seed: u64,
    stream: u64,
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            stream: 0,
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Derive an independent generator on `stream` from the same master seed.
    pub fn fork(&self, stream: u64) -> SimRng {
        let mut inner = ChaCha8Rng::seed_from_u64(self.seed);
        inner.set_stream(stream);
        SimRng {
            seed: self.seed,
            stream,
            inner,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&self) -> u64 {
        self.stream
    }

    /// Uniform draw in [0, 1).
    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Bernoulli trial. `p` is clamped into [0, 1]; NaN never fires.
    pub fn chance(&mut self, p: f64) -> bool {
        if !(p > 0.0) {
            return false;
        }
        self.unit() < p.min(1.0)
    }

    /// Uniform integer in the inclusive range `[lo, hi]` (bounds may be given in any order).
    pub fn uniform_u32(&mut self, lo: u32, hi: u32) -> u32 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.inner.gen_range(lo..=hi)
    }

    /// Uniform integer in the inclusive range `[lo, hi]` (bounds may be given in any order).
    pub fn uniform_u64(&mut self, lo: u64, hi: u64) -> u64 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.inner.gen_range(lo..=hi)
    }

    /// Uniform real in the half-open range `[lo, hi)`; returns `lo` for an empty range.
    pub fn uniform_f64(&mut self, lo: f64, hi: f64) -> f64 {
        if !(hi > lo) {
            return lo;
        }
        self.inner.gen_range(lo..hi)
    }

    /// Uniform real in the closed range `[lo, hi]`.
    pub fn uniform_f64_inclusive(&mut self, lo: f64, hi: f64) -> f64 {
        if !(hi > lo) {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    /// Pick an index from a categorical distribution. Weights need not sum
    /// to one; non-positive weights are never picked unless all are.
    pub fn weighted_index(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if weights.is_empty() || !(total > 0.0) {
            return 0;
        }
        let roll = self.unit() * total;
        let mut cumulative = 0.0;
        let mut last_positive = 0;
        for (i, w) in weights.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            last_positive = i;
            cumulative += *w;
            if roll < cumulative {
                return i;
            }
        }
        last_positive
    }

    /// Draw a fresh day-scoped luck value.
    pub fn roll_luck(&mut self) -> Luck {
        Luck(self.inner.gen_range(Luck::MIN..=Luck::MAX))
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Per-day, per-vessel luck in `[1, 100]`. Lower luck makes adverse events
/// more likely and favourable ones less likely; the mapping is strictly monotonic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Luck(u8);

/// Coarse luck bands used for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LuckBand {
    Cursed,
    Poor,
    Average,
    Fortunate,
    Blessed,
}

impl Luck {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;
    pub const NEUTRAL: Luck = Luck(50);

    /// Build a luck value, clamping into `[MIN, MAX]`.
    pub fn new(value: u8) -> Self {
        Luck(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Position within the luck range, 0.0 at `MIN` and 1.0 at `MAX`.
    pub fn fraction(self) -> f64 {
        f64::from(self.0 - Self::MIN) / f64::from(Self::MAX - Self::MIN)
    }

    /// Scale for adverse-event probabilities: 1.5 at the worst luck, 0.5 at the best.
    pub fn adverse_factor(self) -> f64 {
        1.5 - self.fraction()
    }

    /// Scale for success/favourable probabilities: 0.5 at the worst luck, 1.5 at the best.
    pub fn favourable_factor(self) -> f64 {
        0.5 + self.fraction()
    }

    /// `base` scaled for an adverse event, clamped to a probability.
    pub fn adverse(self, base: f64) -> f64 {
        (base * self.adverse_factor()).clamp(0.0, 1.0)
    }

    /// `base` scaled for a favourable event, clamped to a probability.
    pub fn favourable(self, base: f64) -> f64 {
        (base * self.favourable_factor()).clamp(0.0, 1.0)
    }

    /// Probability of a success check with base rate `base`, computed as
    /// `base ^ adverse_factor`. Certain success and certain failure are unchanged
    /// by luck.
    pub fn success(self, base: f64) -> f64 {
        if base.is_nan() {
            return 0.0;
        }
        base.clamp(0.0, 1.0).powf(self.adverse_factor())
    }

    pub fn band(self) -> LuckBand {
        match self.0 {
            0..=20 => LuckBand::Cursed,
            21..=40 => LuckBand::Poor,
            41..=60 => LuckBand::Average,
            61..=80 => LuckBand::Fortunate,
            _ => LuckBand::Blessed,
        }
    }

    /// Arithmetic mean of several luck values, rounded; neutral when empty.
    pub fn mean(values: impl IntoIterator<Item = Luck>) -> Luck {
        let (sum, n) = values
            .into_iter()
            .fold((0u32, 0u32), |(s, n), l| (s + u32::from(l.0), n + 1));
        if n == 0 {
            return Luck::NEUTRAL;
        }
        let avg = (f64::from(sum) / f64::from(n)).round() as u8;
        Luck::new(avg)
    }
}

impl TryFrom<u8> for Luck {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Luck(value))
        } else {
            Err(ValidationError::LuckOutOfRange(value))
        }
    }
}

impl From<Luck> for u8 {
    fn from(luck: Luck) -> u8 {
        luck.0
    }
}

impl Default for Luck {
    fn default() -> Self {
        Luck::NEUTRAL
    }
}
