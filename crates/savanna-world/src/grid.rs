//! Bounded 2D occupancy grid.

use savanna_core::{Direction, EntityId, Position, Species};
use serde::{Deserialize, Serialize};

/// What a cell holds: the id of the entity living there and its species, so
/// predators can recognise prey without touching entity storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub id: EntityId,
    pub species: Species,
}

impl Occupant {
    pub fn new(id: EntityId, species: Species) -> Self {
        Self { id, species }
    }
}

/// A dense, non-wrapping grid where each cell holds at most one occupant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Option<Occupant>>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        assert!(
            width > 0 && height > 0,
            "grid dimensions must be positive, got {}x{}",
            width,
            height
        );
        let size = width
            .checked_mul(height)
            .unwrap_or_else(|| panic!("grid of {}x{} cells is too large", width, height))
            as usize;
        Self {
            width,
            height,
            cells: vec![None; size],
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Occupant at position. Out-of-bounds positions read as empty.
    pub fn occupant(&self, pos: Position) -> Option<Occupant> {
        if !self.contains(pos) {
            return None;
        }
        self.cells[self.pos_to_index(pos)]
    }

    pub fn is_empty(&self, pos: Position) -> bool {
        self.contains(pos) && self.cells[self.pos_to_index(pos)].is_none()
    }

    /// Put an occupant into an empty cell.
    ///
    /// Panics if the position is out of bounds or already occupied.
    pub fn place(&mut self, occupant: Occupant, pos: Position) {
        let index = self.checked_index(pos);
        if let Some(existing) = self.cells[index] {
            panic!(
                "cannot place {} {} at {}: cell holds {} {}",
                occupant.species, occupant.id, pos, existing.species, existing.id
            );
        }
        self.cells[index] = Some(occupant);
    }

    /// Empty a cell, returning whatever it held
    pub fn clear(&mut self, pos: Position) -> Option<Occupant> {
        let index = self.checked_index(pos);
        self.cells[index].take()
    }

    /// Move the occupant of `from` into the empty cell `to`.
    ///
    /// Panics if `from` is empty or `to` is occupied.
    pub fn relocate(&mut self, from: Position, to: Position) {
        let occupant = self
            .clear(from)
            .unwrap_or_else(|| panic!("cannot relocate from empty cell {}", from));
        self.place(occupant, to);
    }

    /// In-bounds orthogonal neighbors in fixed North, South, West, East order
    pub fn neighbors(&self, pos: Position) -> Vec<Position> {
        Direction::all()
            .into_iter()
            .map(|direction| pos.step(direction))
            .filter(|neighbor| self.contains(*neighbor))
            .collect()
    }

    /// All empty positions, row-major
    pub fn empty_cells(&self) -> Vec<Position> {
        self.iter()
            .filter(|(_, cell)| cell.is_none())
            .map(|(pos, _)| pos)
            .collect()
    }

    /// All occupants with their positions, row-major
    pub fn occupants(&self) -> impl Iterator<Item = (Position, Occupant)> + '_ {
        self.iter()
            .filter_map(|(pos, cell)| cell.map(|occupant| (pos, occupant)))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Number of cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn checked_index(&self, pos: Position) -> usize {
        assert!(
            self.contains(pos),
            "position {} outside {}x{} grid",
            pos,
            self.width,
            self.height
        );
        self.pos_to_index(pos)
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        pos.y as usize * self.width as usize + pos.x as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all cells with positions, row-major
    pub fn iter(&self) -> impl Iterator<Item = (Position, Option<Occupant>)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), *cell))
    }
}
