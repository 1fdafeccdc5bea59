//! Text rendering of the grid.

use crate::grid::Grid;
use savanna_core::{Position, RenderConfig, Species};
use std::fmt;

/// A bordered text frame of the grid with zero-padded row and column indices
pub struct Frame<'a> {
    grid: &'a Grid,
    symbols: &'a RenderConfig,
}

impl<'a> Frame<'a> {
    pub fn new(grid: &'a Grid, symbols: &'a RenderConfig) -> Self {
        Self { grid, symbols }
    }

    /// Digits used for indices; never fewer than two
    fn index_width(&self) -> usize {
        let largest = (self.grid.width.max(self.grid.height) - 1).max(0);
        largest.to_string().len().max(2)
    }

    fn symbol(&self, pos: Position) -> char {
        match self.grid.occupant(pos).map(|o| o.species) {
            Some(Species::Grazer) => self.symbols.grazer_symbol,
            Some(Species::Hunter) => self.symbols.hunter_symbol,
            None => self.symbols.empty_symbol,
        }
    }
}

impl fmt::Display for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = self.index_width();
        let indent = " ".repeat(pad + 1);
        let columns = self.grid.width as usize;
        let border = format!("{}+{}+", indent, "-".repeat((pad + 1) * columns + 1));

        writeln!(f, "{}", border)?;
        let header: Vec<String> = (0..columns).map(|x| format!("{:0pad$}", x)).collect();
        writeln!(f, "{}| {} |", indent, header.join(" "))?;
        writeln!(f, "{}", border)?;

        for y in 0..self.grid.height {
            let cells: Vec<String> = (0..self.grid.width)
                .map(|x| format!("{:<pad$}", self.symbol(Position::new(x, y))))
                .collect();
            writeln!(f, "{:0pad$} | {} |", y, cells.join(" "))?;
        }

        writeln!(f, "{}", border)
    }
}

/// Render a grid to a string
pub fn render(grid: &Grid, symbols: &RenderConfig) -> String {
    Frame::new(grid, symbols).to_string()
}
