//! YAML scenario loading and the built-in asteroid catalog.

use anyhow::{Context, Result};
use serde::Deserialize;
use sim_core::{Asteroid, AsteroidClass, Element};
use sim_runtime::FleetConfig;
use std::path::Path;

/// Asteroid entry as written in a scenario file. The class is free text.
#[derive(Debug, Deserialize)]
pub struct AsteroidSpec {
    pub name: String,
    pub distance: f64,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub composition: Vec<Element>,
}

impl AsteroidSpec {
    fn into_asteroid(self) -> Asteroid {
        Asteroid {
            name: self.name,
            distance: self.distance,
            class: AsteroidClass::from_label(&self.class),
            composition: self.composition,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub fleet: FleetConfig,
    pub asteroids: Vec<AsteroidSpec>,
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// The scenario's asteroids, or the built-in catalog when none are listed.
    pub fn into_parts(self) -> (FleetConfig, Vec<Asteroid>) {
        let asteroids = if self.asteroids.is_empty() {
            default_asteroids()
        } else {
            self.asteroids.into_iter().map(AsteroidSpec::into_asteroid).collect()
        };
        (self.fleet, asteroids)
    }
}

pub fn default_asteroids() -> Vec<Asteroid> {
    let rock = |name: &str, distance: f64, class: AsteroidClass, composition: &[(&str, f64)]| Asteroid {
        name: name.to_string(),
        distance,
        class,
        composition: composition
            .iter()
            .map(|(n, kg)| Element::new(*n, *kg))
            .collect(),
    };
    vec![
        rock(
            "101955 Bennu",
            12.0,
            AsteroidClass::C,
            &[("Carbon", 2.0e10), ("Iron", 6.0e9), ("Nickel", 1.0e9), ("Cobalt", 4.0e6), ("Gold", 2.0e5)],
        ),
        rock(
            "162173 Ryugu",
            10.0,
            AsteroidClass::C,
            &[("Carbon", 9.0e10), ("Iron", 2.0e10), ("Platinum", 1.0e6), ("Gold", 4.0e5)],
        ),
        rock(
            "433 Eros",
            8.0,
            AsteroidClass::S,
            &[("Silicon", 3.0e12), ("Iron", 1.0e12), ("Copper", 4.0e9), ("Silver", 2.0e8), ("Gold", 2.0e7)],
        ),
        rock(
            "25143 Itokawa",
            6.0,
            AsteroidClass::S,
            &[("Silicon", 2.0e10), ("Iron", 7.0e9), ("Lithium", 3.0e6), ("Palladium", 8.0e5)],
        ),
        rock(
            "16 Psyche",
            20.0,
            AsteroidClass::M,
            &[("Iron", 9.0e15), ("Nickel", 1.0e15), ("Platinum", 4.0e12), ("Gold", 3.0e12), ("Palladium", 1.0e12)],
        ),
        rock(
            "216 Kleopatra",
            25.0,
            AsteroidClass::M,
            &[("Iron", 4.0e15), ("Nickel", 9.0e14), ("Gold", 1.0e12), ("Silver", 3.0e12)],
        ),
    ]
}
