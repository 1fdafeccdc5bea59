//! Entity state.

use crate::grid::Occupant;
use savanna_core::{EntityId, Position, Species};
use serde::{Deserialize, Serialize};

/// A grazer or hunter living on the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub species: Species,
    pub position: Position,
    pub age: u32,
    /// Turns since the last meal. Grazers only accumulate it when starvation is enabled.
    pub hunger: u32,
    /// Step the entity was created in; zero for the initial population
    pub birth_step: u64,
    pub offspring_count: u32,
    pub kills: u32,
}

impl Entity {
    pub fn new(id: EntityId, species: Species, position: Position) -> Self {
        Self::new_with_birth_step(id, species, position, 0)
    }

    pub fn new_with_birth_step(
        id: EntityId,
        species: Species,
        position: Position,
        birth_step: u64,
    ) -> Self {
        Self {
            id,
            species,
            position,
            age: 0,
            hunger: 0,
            birth_step,
            offspring_count: 0,
            kills: 0,
        }
    }

    /// The grid reference for this entity
    pub fn occupant(&self) -> Occupant {
        Occupant::new(self.id, self.species)
    }

    pub fn tick(&mut self) {
        self.age += 1;
    }

    pub fn grow_hungry(&mut self) {
        self.hunger += 1;
    }

    pub fn move_to(&mut self, new_position: Position) {
        self.position = new_position;
    }

    pub fn record_kill(&mut self) {
        self.hunger = 0;
        self.kills += 1;
    }

    pub fn record_offspring(&mut self) {
        self.offspring_count += 1;
    }
}
