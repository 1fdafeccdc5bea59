//! Per-species turn rules.
//!
//! [`act`] runs one entity's turn against the shared grid. Every scan over
//! neighboring cells uses a freshly shuffled candidate list and takes the first
//! cell that qualifies, so ties are broken by the random source alone.

use crate::entity::Entity;
use crate::grid::Grid;
use crate::random::RandomSource;
use savanna_core::{DeathCause, EntityId, HunterTurnOrder, Position, Species, WorldConfig};
use tracing::trace;

/// Everything a single turn may touch
pub struct Turn<'a, R: RandomSource> {
    pub grid: &'a mut Grid,
    pub rng: &'a mut R,
    pub config: &'a WorldConfig,
    /// Next free entity id, advanced for each birth
    pub next_id: &'a mut u64,
    /// Current step number, stamped on newborns
    pub step: u64,
    /// Receives entities born during this turn. They are already on the grid.
    pub nursery: &'a mut Vec<Entity>,
}

/// What happened during one turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    pub death: Option<DeathCause>,
    pub moved: bool,
    pub prey: Option<EntityId>,
    pub offspring: Option<EntityId>,
}

impl TurnOutcome {
    pub fn survived(&self) -> bool {
        self.death.is_none()
    }
}

/// Run one turn for `entity`.
///
/// Panics if the grid does not reference `entity` at its recorded position;
/// the scheduler must filter stale entities before calling this.
pub fn act<R: RandomSource>(entity: &mut Entity, turn: &mut Turn<'_, R>) -> TurnOutcome {
    let occupant = turn.grid.occupant(entity.position);
    assert_eq!(
        occupant.map(|o| o.id),
        Some(entity.id),
        "{} {} acting at {} but the grid holds {:?}",
        entity.species,
        entity.id,
        entity.position,
        occupant
    );

    match entity.species {
        Species::Grazer => act_grazer(entity, turn),
        Species::Hunter => act_hunter(entity, turn),
    }
}

/// In-bounds orthogonal neighbors of `pos` in random order
pub fn candidates<R: RandomSource>(grid: &Grid, pos: Position, rng: &mut R) -> Vec<Position> {
    let mut cells = grid.neighbors(pos);
    rng.shuffle(&mut cells);
    cells
}

fn act_grazer<R: RandomSource>(entity: &mut Entity, turn: &mut Turn<'_, R>) -> TurnOutcome {
    let config = turn.config;
    let rules = &config.grazer;
    let mut outcome = TurnOutcome::default();

    entity.tick();
    if rules.starves {
        entity.grow_hungry();
    }

    if rules.max_age.is_some_and(|max_age| entity.age >= max_age) {
        turn.remove(entity, DeathCause::OldAge, &mut outcome);
        return outcome;
    }
    if rules.starves && entity.hunger >= rules.hunger_limit {
        turn.remove(entity, DeathCause::Starvation, &mut outcome);
        return outcome;
    }

    outcome.moved = turn.wander(entity);

    if rules.reproduction.is_due(entity.age) {
        outcome.offspring = turn.reproduce(entity);
    }

    outcome
}

fn act_hunter<R: RandomSource>(entity: &mut Entity, turn: &mut Turn<'_, R>) -> TurnOutcome {
    let config = turn.config;
    let rules = &config.hunter;
    let mut outcome = TurnOutcome::default();

    entity.tick();
    entity.grow_hungry();

    if rules.max_age.is_some_and(|max_age| entity.age >= max_age) {
        turn.remove(entity, DeathCause::OldAge, &mut outcome);
        return outcome;
    }

    outcome.prey = turn.hunt(entity);
    outcome.moved = outcome.prey.is_some() || turn.wander(entity);

    let starving = entity.hunger >= rules.hunger_limit;
    let due = rules.reproduction.is_due(entity.age);

    match rules.turn_order {
        HunterTurnOrder::StarveThenReproduce => {
            if starving {
                turn.remove(entity, DeathCause::Starvation, &mut outcome);
            } else if due {
                outcome.offspring = turn.reproduce(entity);
            }
        }
        HunterTurnOrder::ReproduceThenStarve => {
            if due {
                outcome.offspring = turn.reproduce(entity);
            }
            if starving {
                turn.remove(entity, DeathCause::Starvation, &mut outcome);
            }
        }
    }

    outcome
}

impl<'a, R: RandomSource> Turn<'a, R> {
    fn first_empty(&mut self, pos: Position) -> Option<Position> {
        candidates(self.grid, pos, self.rng)
            .into_iter()
            .find(|cell| self.grid.is_empty(*cell))
    }

    /// Move into the first empty neighbor, if any
    fn wander(&mut self, entity: &mut Entity) -> bool {
        match self.first_empty(entity.position) {
            Some(target) => {
                self.grid.relocate(entity.position, target);
                entity.move_to(target);
                true
            }
            None => false,
        }
    }

    /// Evict the first neighboring grazer and take its cell
    fn hunt(&mut self, entity: &mut Entity) -> Option<EntityId> {
        let target = candidates(self.grid, entity.position, self.rng)
            .into_iter()
            .find(|cell| {
                self.grid
                    .occupant(*cell)
                    .is_some_and(|o| o.species == Species::Grazer)
            })?;

        let prey = self.grid.clear(target)?;
        self.grid.relocate(entity.position, target);
        entity.move_to(target);
        entity.record_kill();
        Some(prey.id)
    }

    /// Place an age-zero offspring into the first empty neighbor
    fn reproduce(&mut self, parent: &mut Entity) -> Option<EntityId> {
        let Some(cell) = self.first_empty(parent.position) else {
            trace!(
                entity_id = %parent.id,
                species = %parent.species,
                step = self.step,
                position_x = parent.position.x,
                position_y = parent.position.y,
                "Reproduction failed: no empty adjacent cell found"
            );
            return None;
        };

        let id = EntityId(*self.next_id);
        *self.next_id += 1;

        let child = Entity::new_with_birth_step(id, parent.species, cell, self.step);
        self.grid.place(child.occupant(), cell);
        self.nursery.push(child);
        parent.record_offspring();
        Some(id)
    }

    fn remove(&mut self, entity: &Entity, cause: DeathCause, outcome: &mut TurnOutcome) {
        self.grid.clear(entity.position);
        outcome.death = Some(cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::Sequential;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use savanna_core::Reproduction;

    struct Bench {
        grid: Grid,
        config: WorldConfig,
        next_id: u64,
        nursery: Vec<Entity>,
    }

    impl Bench {
        fn new(width: i32, height: i32, config: WorldConfig) -> Self {
            Self {
                grid: Grid::new(width, height),
                config,
                next_id: 100,
                nursery: Vec::new(),
            }
        }

        fn spawn(&mut self, id: u64, species: Species, x: i32, y: i32) -> Entity {
            let entity = Entity::new(EntityId(id), species, Position::new(x, y));
            self.grid.place(entity.occupant(), entity.position);
            entity
        }

        fn act<R: RandomSource>(&mut self, entity: &mut Entity, rng: &mut R) -> TurnOutcome {
            let mut turn = Turn {
                grid: &mut self.grid,
                rng,
                config: &self.config,
                next_id: &mut self.next_id,
                step: 1,
                nursery: &mut self.nursery,
            };
            act(entity, &mut turn)
        }
    }

    fn quiet_config() -> WorldConfig {
        let mut config = WorldConfig::default();
        config.grazer.max_age = None;
        config.grazer.reproduction = Reproduction::new(0, 0);
        config.hunter.reproduction = Reproduction::new(0, 0);
        config
    }

    #[test]
    fn test_candidates_stay_in_bounds() {
        let grid = Grid::new(3, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..20 {
            let corner = candidates(&grid, Position::new(2, 2), &mut rng);
            assert_eq!(corner.len(), 2);
            assert!(corner.iter().all(|pos| grid.contains(*pos)));
        }
    }

    #[test]
    fn test_candidate_order_varies() {
        let grid = Grid::new(5, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let first = candidates(&grid, Position::new(2, 2), &mut rng);
        let varied = (0..20).any(|_| candidates(&grid, Position::new(2, 2), &mut rng) != first);
        assert!(varied);
    }

    #[test]
    fn test_grazer_moves_into_empty_neighbor() {
        let mut bench = Bench::new(3, 1, quiet_config());
        let mut grazer = bench.spawn(1, Species::Grazer, 0, 0);

        let outcome = bench.act(&mut grazer, &mut Sequential);

        assert!(outcome.moved);
        assert!(outcome.survived());
        assert_eq!(grazer.age, 1);
        assert_eq!(grazer.hunger, 0);
        assert_eq!(grazer.position, Position::new(1, 0));
        assert!(bench.grid.is_empty(Position::new(0, 0)));
        assert_eq!(bench.grid.occupant(Position::new(1, 0)).map(|o| o.id), Some(EntityId(1)));
    }

    #[test]
    fn test_boxed_in_grazer_stays() {
        let mut bench = Bench::new(2, 1, quiet_config());
        let mut grazer = bench.spawn(1, Species::Grazer, 0, 0);
        bench.spawn(2, Species::Grazer, 1, 0);

        let outcome = bench.act(&mut grazer, &mut Sequential);

        assert!(!outcome.moved);
        assert_eq!(grazer.position, Position::new(0, 0));
    }

    #[test]
    fn test_grazer_dies_of_old_age() {
        let mut config = quiet_config();
        config.grazer.max_age = Some(3);
        let mut bench = Bench::new(3, 3, config);
        let mut grazer = bench.spawn(1, Species::Grazer, 1, 1);
        grazer.age = 2;

        let outcome = bench.act(&mut grazer, &mut Sequential);

        assert_eq!(outcome.death, Some(DeathCause::OldAge));
        assert!(!outcome.moved);
        assert_eq!(bench.grid.occupied_count(), 0);
    }

    #[test]
    fn test_grazer_starvation_is_opt_in() {
        let mut config = quiet_config();
        config.grazer.starves = true;
        config.grazer.hunger_limit = 2;
        let mut bench = Bench::new(4, 4, config);
        let mut grazer = bench.spawn(1, Species::Grazer, 0, 0);

        assert!(bench.act(&mut grazer, &mut Sequential).survived());
        assert_eq!(grazer.hunger, 1);
        let outcome = bench.act(&mut grazer, &mut Sequential);
        assert_eq!(outcome.death, Some(DeathCause::Starvation));
        assert_eq!(bench.grid.occupied_count(), 0);
    }

    #[test]
    fn test_grazer_reproduces_into_neighbor() {
        let mut config = quiet_config();
        config.grazer.reproduction = Reproduction::new(1, 0);
        let mut bench = Bench::new(3, 3, config);
        let mut grazer = bench.spawn(1, Species::Grazer, 1, 1);

        let outcome = bench.act(&mut grazer, &mut Sequential);

        assert_eq!(outcome.offspring, Some(EntityId(100)));
        assert_eq!(bench.next_id, 101);
        assert_eq!(bench.nursery.len(), 1);
        let child = &bench.nursery[0];
        assert_eq!(child.age, 0);
        assert_eq!(child.birth_step, 1);
        assert!(child.position.is_adjacent(&grazer.position));
        assert_eq!(bench.grid.occupant(child.position), Some(child.occupant()));
        assert_eq!(grazer.offspring_count, 1);
    }

    #[test]
    fn test_reproduction_without_room_is_skipped() {
        let mut config = quiet_config();
        config.grazer.reproduction = Reproduction::new(1, 0);
        let mut bench = Bench::new(1, 1, config);
        let mut grazer = bench.spawn(1, Species::Grazer, 0, 0);

        let outcome = bench.act(&mut grazer, &mut Sequential);

        assert_eq!(outcome.offspring, None);
        assert!(bench.nursery.is_empty());
        assert_eq!(bench.next_id, 100);
    }

    #[test]
    fn test_hunter_eats_adjacent_grazer() {
        let mut bench = Bench::new(3, 3, quiet_config());
        let mut hunter = bench.spawn(1, Species::Hunter, 1, 1);
        bench.spawn(2, Species::Grazer, 1, 2);
        hunter.hunger = 3;

        let outcome = bench.act(&mut hunter, &mut ChaCha8Rng::seed_from_u64(1));

        assert_eq!(outcome.prey, Some(EntityId(2)));
        assert!(outcome.moved);
        assert_eq!(hunter.position, Position::new(1, 2));
        assert_eq!(hunter.hunger, 0);
        assert_eq!(hunter.kills, 1);
        assert_eq!(bench.grid.occupied_count(), 1);
        assert!(bench.grid.is_empty(Position::new(1, 1)));
    }

    #[test]
    fn test_hunter_ignores_other_hunters() {
        let mut bench = Bench::new(2, 1, quiet_config());
        let mut hunter = bench.spawn(1, Species::Hunter, 0, 0);
        bench.spawn(2, Species::Hunter, 1, 0);

        let outcome = bench.act(&mut hunter, &mut Sequential);

        assert_eq!(outcome.prey, None);
        assert!(!outcome.moved);
        assert_eq!(hunter.hunger, 1);
        assert_eq!(bench.grid.occupied_count(), 2);
    }

    #[test]
    fn test_hunter_prefers_prey_over_empty_cells() {
        // Whatever the shuffle, the only grazer neighbor wins over three empty cells
        for seed in 0..10 {
            let mut bench = Bench::new(3, 3, quiet_config());
            let mut hunter = bench.spawn(1, Species::Hunter, 1, 1);
            bench.spawn(2, Species::Grazer, 2, 1);
            let outcome = bench.act(&mut hunter, &mut ChaCha8Rng::seed_from_u64(seed));
            assert_eq!(outcome.prey, Some(EntityId(2)));
            assert_eq!(hunter.position, Position::new(2, 1));
        }
    }

    #[test]
    fn test_hunter_starves_before_reproducing() {
        let mut config = quiet_config();
        config.hunter.hunger_limit = 1;
        config.hunter.reproduction = Reproduction::new(1, 0);
        let mut bench = Bench::new(3, 3, config);
        let mut hunter = bench.spawn(1, Species::Hunter, 1, 1);

        let outcome = bench.act(&mut hunter, &mut Sequential);

        assert_eq!(outcome.death, Some(DeathCause::Starvation));
        assert_eq!(outcome.offspring, None);
        assert_eq!(bench.grid.occupied_count(), 0);
    }

    #[test]
    fn test_hunter_reproduce_then_starve_leaves_offspring() {
        let mut config = quiet_config();
        config.hunter.hunger_limit = 1;
        config.hunter.reproduction = Reproduction::new(1, 0);
        config.hunter.turn_order = HunterTurnOrder::ReproduceThenStarve;
        let mut bench = Bench::new(3, 3, config);
        let mut hunter = bench.spawn(1, Species::Hunter, 1, 1);

        let outcome = bench.act(&mut hunter, &mut Sequential);

        assert_eq!(outcome.death, Some(DeathCause::Starvation));
        assert_eq!(outcome.offspring, Some(EntityId(100)));
        assert_eq!(bench.grid.occupied_count(), 1);
        assert_eq!(bench.nursery[0].species, Species::Hunter);
        assert_eq!(bench.nursery[0].hunger, 0);
    }

    #[test]
    fn test_hunter_old_age_precedes_hunt() {
        let mut config = quiet_config();
        config.hunter.max_age = Some(1);
        let mut bench = Bench::new(2, 1, config);
        let mut hunter = bench.spawn(1, Species::Hunter, 0, 0);
        bench.spawn(2, Species::Grazer, 1, 0);

        let outcome = bench.act(&mut hunter, &mut Sequential);

        assert_eq!(outcome.death, Some(DeathCause::OldAge));
        assert_eq!(outcome.prey, None);
        assert_eq!(
            bench.grid.occupant(Position::new(1, 0)).map(|o| o.id),
            Some(EntityId(2))
        );
    }

    #[test]
    #[should_panic(expected = "acting at")]
    fn test_acting_on_misplaced_entity_panics() {
        let mut bench = Bench::new(3, 3, quiet_config());
        let mut grazer = bench.spawn(1, Species::Grazer, 0, 0);
        grazer.position = Position::new(2, 2);
        bench.act(&mut grazer, &mut Sequential);
    }
}
