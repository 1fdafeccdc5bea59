//! Step engine for the predator–prey world.

use crate::behavior::{self, Turn, TurnOutcome};
use crate::entity::Entity;
use crate::grid::Grid;
use crate::random::RandomSource;
use crate::render::Frame;
use crate::stats::{Census, StepReport};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use savanna_core::{DeathCause, EntityId, Error, Position, Result, Species, WorldConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, trace};

/// Random probes before spawn placement falls back to enumerating empty cells
const SPAWN_ATTEMPTS: usize = 100;

pub struct World<R: RandomSource = ChaCha8Rng> {
    config: WorldConfig,
    grid: Grid,
    entities: HashMap<EntityId, Entity>,
    roster: Vec<EntityId>,
    /// Births of the current (or last completed) step
    newborns: Vec<EntityId>,
    nursery: Vec<Entity>,
    rng: R,
    step: u64,
    next_id: u64,
}

impl World<ChaCha8Rng> {
    /// Create a populated world driven by a seeded ChaCha generator
    pub fn from_seed(config: WorldConfig, seed: u64) -> Result<Self> {
        Self::new(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: RandomSource> World<R> {
    /// Create a world and place the configured initial population at random
    pub fn new(config: WorldConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let mut world = Self::empty(config, rng);

        world.spawn(Species::Grazer, world.config.initial_grazers)?;
        world.spawn(Species::Hunter, world.config.initial_hunters)?;

        info!(
            width = world.config.width,
            height = world.config.height,
            grazers = world.config.initial_grazers,
            hunters = world.config.initial_hunters,
            "World initialized"
        );
        Ok(world)
    }

    /// Create a world with entities at fixed positions. The configured initial
    /// counts are ignored.
    pub fn from_placements(
        config: WorldConfig,
        rng: R,
        placements: &[(Species, Position)],
    ) -> Result<Self> {
        config.validate_rules()?;
        let mut world = Self::empty(config, rng);
        for &(species, pos) in placements {
            world.insert_at(species, pos)?;
        }
        Ok(world)
    }

    /// Rebuild a world from a snapshot, continuing with `rng`
    pub fn restore(config: WorldConfig, snapshot: Snapshot, rng: R) -> Result<Self> {
        config.validate_rules()?;
        if (config.width, config.height) != (snapshot.width, snapshot.height) {
            return Err(Error::InvalidState(format!(
                "snapshot is {}x{} but the configuration is {}x{}",
                snapshot.width, snapshot.height, config.width, config.height
            )));
        }

        let mut world = Self::empty(config, rng);
        world.step = snapshot.step;
        world.next_id = snapshot.next_id;

        for entity in snapshot.entities {
            if entity.id.0 >= snapshot.next_id {
                return Err(Error::InvalidState(format!(
                    "entity {} is not below the next id {}",
                    entity.id, snapshot.next_id
                )));
            }
            if world.entities.contains_key(&entity.id) {
                return Err(Error::InvalidState(format!("duplicate entity {}", entity.id)));
            }
            world.ensure_free(entity.position)?;
            world.grid.place(entity.occupant(), entity.position);
            world.roster.push(entity.id);
            world.entities.insert(entity.id, entity);
        }

        world.check_invariants()?;
        Ok(world)
    }

    fn empty(config: WorldConfig, rng: R) -> Self {
        let grid = Grid::new(config.width, config.height);
        Self {
            config,
            grid,
            entities: HashMap::new(),
            roster: Vec::new(),
            newborns: Vec::new(),
            nursery: Vec::new(),
            rng,
            step: 0,
            next_id: 0,
        }
    }

    /// Place `count` new entities on random empty cells
    pub fn spawn(&mut self, species: Species, count: usize) -> Result<()> {
        let available = self.grid.cell_count() - self.grid.occupied_count();
        if count > available {
            return Err(Error::CapacityExceeded {
                requested: count,
                available,
            });
        }

        for _ in 0..count {
            let pos = self.random_empty_cell()?;
            self.insert_at(species, pos)?;
        }
        Ok(())
    }

    fn random_empty_cell(&mut self) -> Result<Position> {
        for _ in 0..SPAWN_ATTEMPTS {
            let x = self.rng.below(self.grid.width as usize) as i32;
            let y = self.rng.below(self.grid.height as usize) as i32;
            let pos = Position::new(x, y);
            if self.grid.is_empty(pos) {
                return Ok(pos);
            }
        }

        let empty = self.grid.empty_cells();
        if empty.is_empty() {
            return Err(Error::CapacityExceeded {
                requested: 1,
                available: 0,
            });
        }
        Ok(empty[self.rng.below(empty.len())])
    }

    fn ensure_free(&self, pos: Position) -> Result<()> {
        if !self.grid.contains(pos) {
            return Err(Error::InvalidState(format!(
                "position {} outside {}x{} grid",
                pos, self.grid.width, self.grid.height
            )));
        }
        if let Some(occupant) = self.grid.occupant(pos) {
            return Err(Error::InvalidState(format!(
                "position {} already holds {} {}",
                pos, occupant.species, occupant.id
            )));
        }
        Ok(())
    }

    fn insert_at(&mut self, species: Species, pos: Position) -> Result<EntityId> {
        self.ensure_free(pos)?;

        let id = EntityId(self.next_id);
        self.next_id += 1;

        let entity = Entity::new_with_birth_step(id, species, pos, self.step);
        self.grid.place(entity.occupant(), pos);
        self.roster.push(id);
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Advance the world by one discrete step.
    ///
    /// Every entity on the roster acts at most once, in shuffled order. An
    /// entity whose cell no longer references it (eaten earlier in the pass) is
    /// skipped. Newborns join the roster after the pass and first act next step.
    pub fn step(&mut self) -> StepReport {
        self.step += 1;
        let mut report = StepReport::new(self.step);

        let mut order = self.roster.clone();
        self.rng.shuffle(&mut order);
        self.newborns.clear();

        for id in order {
            let Some(entity) = self.entities.get_mut(&id) else {
                report.skipped_stale += 1;
                continue;
            };
            if self.grid.occupant(entity.position).map(|o| o.id) != Some(id) {
                trace!(entity_id = %id, step = self.step, "Skipping stale entity");
                report.skipped_stale += 1;
                continue;
            }

            let mut turn = Turn {
                grid: &mut self.grid,
                rng: &mut self.rng,
                config: &self.config,
                next_id: &mut self.next_id,
                step: self.step,
                nursery: &mut self.nursery,
            };
            let outcome = behavior::act(entity, &mut turn);
            let actor = entity.clone();

            report.acted += 1;
            self.record_outcome(&actor, outcome, &mut report);
        }

        self.rebuild_roster();
        report.census = self.census();

        debug_assert!(
            self.check_invariants().is_ok(),
            "invariants broken after step {}: {:?}",
            self.step,
            self.check_invariants()
        );

        report
    }

    fn record_outcome(&mut self, actor: &Entity, outcome: TurnOutcome, report: &mut StepReport) {
        if let Some(prey_id) = outcome.prey {
            report.deaths.record(DeathCause::Predation);
            if let Some(prey) = self.entities.get(&prey_id) {
                debug!(
                    event = "predation",
                    hunter_id = %actor.id,
                    prey_id = %prey_id,
                    prey_age = prey.age,
                    step = self.step,
                    position_x = actor.position.x,
                    position_y = actor.position.y,
                    "Hunter caught a grazer"
                );
            }
        }

        for child in self.nursery.drain(..) {
            report.births.count(child.species);
            debug!(
                event = "birth",
                parent_id = %actor.id,
                offspring_id = %child.id,
                species = %child.species,
                step = self.step,
                position_x = child.position.x,
                position_y = child.position.y,
                "Entity reproduced"
            );
            self.newborns.push(child.id);
            self.entities.insert(child.id, child);
        }

        if let Some(cause) = outcome.death {
            report.deaths.record(cause);
            debug!(
                event = "entity_death",
                entity_id = %actor.id,
                species = %actor.species,
                cause = ?cause,
                age = actor.age,
                hunger = actor.hunger,
                lifetime = self.step - actor.birth_step,
                offspring_count = actor.offspring_count,
                kills = actor.kills,
                "Entity died"
            );
        }
    }

    /// Rebuild the roster from the grid, then append this step's surviving
    /// newborns, and drop storage for everything no longer placed.
    fn rebuild_roster(&mut self) {
        let newborns: HashSet<EntityId> = self.newborns.iter().copied().collect();
        let mut roster: Vec<EntityId> = self
            .grid
            .occupants()
            .map(|(_, occupant)| occupant.id)
            .filter(|id| !newborns.contains(id))
            .collect();

        // A newborn grazer may already have been eaten later in the pass
        let grid = &self.grid;
        let entities = &self.entities;
        roster.extend(self.newborns.iter().copied().filter(|id| {
            entities
                .get(id)
                .and_then(|e| grid.occupant(e.position))
                .is_some_and(|o| o.id == *id)
        }));

        let live: HashSet<EntityId> = roster.iter().copied().collect();
        self.entities.retain(|id, _| live.contains(id));
        self.roster = roster;
    }

    /// Step up to `steps` times, stopping early once both species are gone
    #[instrument(skip(self), fields(start_step = self.step))]
    pub fn run(&mut self, steps: u64) -> Vec<StepReport> {
        info!("Running up to {} steps", steps);

        let mut reports = Vec::new();
        for _ in 0..steps {
            let report = self.step();
            report.emit();
            let extinct = report.census.is_extinct();
            reports.push(report);

            if extinct {
                info!(event = "extinction", step = self.step, "All entities have died");
                break;
            }
        }
        reports
    }

    /// Verify grid/roster agreement
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for id in &self.roster {
            if !seen.insert(*id) {
                return Err(Error::InvalidState(format!("{} appears twice in the roster", id)));
            }
            let entity = self
                .entities
                .get(id)
                .ok_or_else(|| Error::InvalidState(format!("{} missing from storage", id)))?;
            let occupant = self.grid.occupant(entity.position);
            if occupant.map(|o| o.id) != Some(*id) {
                return Err(Error::InvalidState(format!(
                    "{} records position {} but the cell holds {:?}",
                    id, entity.position, occupant
                )));
            }
        }

        if self.grid.occupied_count() != self.roster.len() {
            return Err(Error::InvalidState(format!(
                "grid holds {} occupants but the roster has {}",
                self.grid.occupied_count(),
                self.roster.len()
            )));
        }
        Ok(())
    }

    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for entity in self.entities() {
            census.count(entity.species);
        }
        census
    }

    /// Capture grid and roster state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            step: self.step,
            next_id: self.next_id,
            width: self.grid.width,
            height: self.grid.height,
            entities: self.entities().cloned().collect(),
        }
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame::new(&self.grid, &self.config.render)
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Live entity ids in roster order
    pub fn roster(&self) -> &[EntityId] {
        &self.roster
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Live entities in roster order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.roster.iter().filter_map(move |id| self.entities.get(id))
    }

    /// Ids born during the most recent step
    pub fn newborns(&self) -> &[EntityId] {
        &self.newborns
    }

    /// Number of completed steps
    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// Serializable grid and roster state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub step: u64,
    pub next_id: u64,
    pub width: i32,
    pub height: i32,
    /// Live entities in roster order
    pub entities: Vec<Entity>,
}
