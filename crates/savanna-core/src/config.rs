//! Configuration types for the simulation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// World configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world grid
    pub width: i32,
    /// Height of the world grid
    pub height: i32,
    /// Grazers placed at initialization
    pub initial_grazers: usize,
    /// Hunters placed at initialization
    pub initial_hunters: usize,
    pub grazer: GrazerConfig,
    pub hunter: HunterConfig,
    pub render: RenderConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            initial_grazers: 20,
            initial_hunters: 5,
            grazer: GrazerConfig::default(),
            hunter: HunterConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: WorldConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn cell_count(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Check dimensions, rules and that the initial population fits the grid
    pub fn validate(&self) -> Result<()> {
        self.validate_rules()?;
        let requested = self
            .initial_grazers
            .checked_add(self.initial_hunters)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "initial population {} + {} is too large",
                    self.initial_grazers, self.initial_hunters
                ))
            })?;
        if requested > self.cell_count() {
            return Err(Error::CapacityExceeded {
                requested,
                available: self.cell_count(),
            });
        }
        Ok(())
    }

    /// Check dimensions and rules, ignoring the initial population
    pub fn validate_rules(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(Error::Validation(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width.checked_mul(self.height).is_none() {
            return Err(Error::Validation(format!(
                "grid of {}x{} cells is too large",
                self.width, self.height
            )));
        }
        if self.hunter.hunger_limit == 0 {
            return Err(Error::Validation(
                "hunter.hunger_limit must be at least 1".to_string(),
            ));
        }
        if self.grazer.starves && self.grazer.hunger_limit == 0 {
            return Err(Error::Validation(
                "grazer.hunger_limit must be at least 1 when grazers starve".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reproduction gate shared by both species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reproduction {
    /// Reproduce when `age % interval == 0`. Zero disables reproduction.
    pub interval: u32,
    /// No reproduction below this age
    pub min_age: u32,
}

impl Reproduction {
    pub fn new(interval: u32, min_age: u32) -> Self {
        Self { interval, min_age }
    }

    pub fn is_due(&self, age: u32) -> bool {
        self.interval > 0 && age >= self.min_age && age % self.interval == 0
    }
}

/// Prey parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrazerConfig {
    /// Death once age reaches this value. `None` disables old age.
    pub max_age: Option<u32>,
    pub reproduction: Reproduction,
    /// Enables hunger for grazers. Grazer hunger never resets.
    pub starves: bool,
    /// Only consulted when `starves` is set
    pub hunger_limit: u32,
}

impl Default for GrazerConfig {
    fn default() -> Self {
        Self {
            max_age: Some(12),
            reproduction: Reproduction::new(3, 0),
            starves: false,
            hunger_limit: 10,
        }
    }
}

/// Ordering of the starvation check against reproduction in a hunter's turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HunterTurnOrder {
    /// A starving hunter dies before it can reproduce
    #[default]
    StarveThenReproduce,
    /// A hunter may leave an offspring on the turn it starves
    ReproduceThenStarve,
}

/// Predator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HunterConfig {
    /// Death once age reaches this value. `None` disables old age.
    pub max_age: Option<u32>,
    pub reproduction: Reproduction,
    /// Death once hunger reaches this value
    pub hunger_limit: u32,
    pub turn_order: HunterTurnOrder,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            max_age: None,
            reproduction: Reproduction::new(5, 0),
            hunger_limit: 5,
            turn_order: HunterTurnOrder::default(),
        }
    }
}

/// Symbols used by the text renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub grazer_symbol: char,
    pub hunter_symbol: char,
    pub empty_symbol: char,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            grazer_symbol: 'O',
            hunter_symbol: 'X',
            empty_symbol: '-',
        }
    }
}
