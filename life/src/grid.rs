use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::config::AliveProbability;
use crate::error::{GridError, Result};
use crate::grid::CellState::{Alive, Dead};
use crate::patterns::Pattern;

#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub enum CellState {
    #[default]
    Dead,
    Alive,
}

impl CellState {
    pub fn is_alive(self) -> bool {
        self == Alive
    }

    pub fn toggled(self) -> Self {
        match self {
            Alive => Dead,
            Dead => Alive,
        }
    }

    fn marker(self) -> char {
        match self {
            Alive => '*',
            Dead => '.',
        }
    }

    fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '*' | '#' | 'O' => Some(Alive),
            '.' | '0' | '-' => Some(Dead),
            _ => None,
        }
    }
}

// Moore neighborhood, row offset first.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// An immutable board snapshot. Every "update" returns a new `Grid`.
///
/// Cells are stored row-major, so every row has exactly `columns` cells by
/// construction. Degenerate boards (zero rows or zero columns) are allowed
/// and simply have nothing to step.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<CellState>,
}

impl Grid {
    pub fn empty(rows: usize, columns: usize) -> Self {
        Grid {
            rows,
            columns,
            cells: vec![Dead; rows * columns],
        }
    }

    /// Fill a board where each cell is independently alive with `probability`.
    pub fn random<R>(rows: usize, columns: usize, probability: AliveProbability, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let cells = (0..rows * columns)
            .map(|_| if rng.random_bool(probability.get()) { Alive } else { Dead })
            .collect();
        Grid { rows, columns, cells }
    }

    /// Build a board from explicit rows. Rows of differing length are rejected.
    pub fn from_rows(rows: Vec<Vec<CellState>>) -> Result<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != columns) {
            return Err(GridError::InvalidDimensions(format!(
                "row {index} has {} cells, expected {columns}",
                row.len()
            )));
        }
        Ok(Grid {
            rows: rows.len(),
            columns,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// An empty board with `pattern` stamped at `origin` (top-left of the pattern).
    pub fn with_pattern(
        rows: usize,
        columns: usize,
        pattern: &Pattern,
        origin: (usize, usize),
    ) -> Result<Self> {
        let mut grid = Grid::empty(rows, columns);
        for &(dr, dc) in pattern.cells {
            let (row, col) = match (origin.0.checked_add(dr), origin.1.checked_add(dc)) {
                (Some(row), Some(col)) => (row, col),
                _ => {
                    return Err(GridError::OutOfBounds {
                        row: origin.0.saturating_add(dr),
                        col: origin.1.saturating_add(dc),
                        rows,
                        columns,
                    })
                }
            };
            let index = grid.index(row, col)?;
            grid.cells[index] = Alive;
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, col: usize) -> Result<CellState> {
        self.index(row, col).map(|index| self.cells[index])
    }

    /// A copy of this board with one cell replaced.
    pub fn set_cell(&self, row: usize, col: usize, state: CellState) -> Result<Grid> {
        let index = self.index(row, col)?;
        let mut next = self.clone();
        next.cells[index] = state;
        Ok(next)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[CellState]> + '_ {
        (0..self.rows).map(move |row| &self.cells[row * self.columns..(row + 1) * self.columns])
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_alive()).count()
    }

    /// Count live cells in the Moore neighborhood of `(row, col)`.
    ///
    /// Positions past the edge are not counted; the board does not wrap.
    pub fn live_neighbors(&self, row: usize, col: usize) -> Result<usize> {
        self.index(row, col)?;
        Ok(self.count_live_neighbors(row, col))
    }

    /// Advance the grid by one generation.
    ///
    /// Every neighbor count is taken from `self` before any cell of the
    /// result is decided, so the outcome does not depend on visiting order.
    pub fn step(&self) -> Grid {
        let columns = self.columns;
        let counts: Vec<usize> = (0..self.rows)
            .flat_map(|row| (0..columns).map(move |col| self.count_live_neighbors(row, col)))
            .collect();

        let cells = self
            .cells
            .iter()
            .zip(counts)
            .map(|(&state, live_neighbors)| next_state(state, live_neighbors))
            .collect();

        Grid {
            rows: self.rows,
            columns: self.columns,
            cells,
        }
    }

    fn count_live_neighbors(&self, row: usize, col: usize) -> usize {
        NEIGHBOR_OFFSETS
            .iter()
            .filter(|&&(dr, dc)| {
                match (row.checked_add_signed(dr), col.checked_add_signed(dc)) {
                    (Some(r), Some(c)) if r < self.rows && c < self.columns => {
                        self.cells[r * self.columns + c].is_alive()
                    }
                    _ => false,
                }
            })
            .count()
    }

    fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row < self.rows && col < self.columns {
            Ok(row * self.columns + col)
        } else {
            Err(GridError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }
}

fn next_state(state: CellState, live_neighbors: usize) -> CellState {
    match (state, live_neighbors) {
        (Alive, n) if n < 2 => Dead, // Underpopulation
        (Alive, n) if n > 3 => Dead, // Overpopulation
        (Alive, _) => Alive,         // Survives
        (Dead, 3) => Alive,          // Reproduction
        (Dead, _) => Dead,
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.iter_rows() {
            let line: String = row.iter().map(|cell| cell.marker()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Parses the text form produced by `Display`: one line per row, blank
/// lines ignored.
impl FromStr for Grid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(line, text)| {
                text.chars()
                    .map(|marker| {
                        CellState::from_marker(marker)
                            .ok_or(GridError::InvalidCell { marker, line: line + 1 })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Grid::from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::patterns;

    fn grid(text: &str) -> Grid {
        text.parse().expect("valid grid text")
    }

    /// A board whose centre cell is `centre` with exactly `neighbors` live neighbors.
    fn centre_with_neighbors(centre: CellState, neighbors: usize) -> Grid {
        let mut board = Grid::empty(3, 3).set_cell(1, 1, centre).unwrap();
        let ring = [(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)];
        for &(row, col) in ring.iter().take(neighbors) {
            board = board.set_cell(row, col, Alive).unwrap();
        }
        board
    }

    #[test]
    fn counts_full_neighborhood_in_the_interior() {
        let board = grid("***\n***\n***");
        assert_eq!(board.live_neighbors(1, 1), Ok(8));
    }

    #[test]
    fn edges_and_corners_do_not_wrap() {
        let board = grid(
            "*..*
             ....
             ....
             *..*",
        );
        // A torus would see the other three corners.
        assert_eq!(board.live_neighbors(0, 0), Ok(0));
        assert_eq!(board.live_neighbors(3, 3), Ok(0));

        let full = grid("***\n***\n***");
        assert_eq!(full.live_neighbors(0, 0), Ok(3));
        assert_eq!(full.live_neighbors(0, 1), Ok(5));
    }

    #[test]
    fn neighbor_count_outside_the_board_is_an_error() {
        let board = Grid::empty(4, 5);
        assert_eq!(
            board.live_neighbors(4, 0),
            Err(GridError::OutOfBounds { row: 4, col: 0, rows: 4, columns: 5 })
        );
        assert!(board.live_neighbors(0, 5).is_err());
    }

    #[test]
    fn live_cell_with_fewer_than_two_neighbors_dies() {
        for neighbors in 0..2 {
            let next = centre_with_neighbors(Alive, neighbors).step();
            assert_eq!(next.get(1, 1), Ok(Dead), "{neighbors} neighbors");
        }
    }

    #[test]
    fn live_cell_with_more_than_three_neighbors_dies() {
        for neighbors in 4..=8 {
            let next = centre_with_neighbors(Alive, neighbors).step();
            assert_eq!(next.get(1, 1), Ok(Dead), "{neighbors} neighbors");
        }
    }

    #[test]
    fn live_cell_with_two_or_three_neighbors_survives() {
        for neighbors in 2..=3 {
            let next = centre_with_neighbors(Alive, neighbors).step();
            assert_eq!(next.get(1, 1), Ok(Alive), "{neighbors} neighbors");
        }
    }

    #[test]
    fn dead_cell_comes_alive_only_with_exactly_three_neighbors() {
        for neighbors in 0..=8 {
            let expected = if neighbors == 3 { Alive } else { Dead };
            let next = centre_with_neighbors(Dead, neighbors).step();
            assert_eq!(next.get(1, 1), Ok(expected), "{neighbors} neighbors");
        }
    }

    #[test]
    fn empty_grid_is_a_fixed_point() {
        let board = Grid::empty(30, 30);
        assert_eq!(board.step(), board);
    }

    #[test]
    fn isolated_cell_dies() {
        let board = Grid::empty(5, 5).set_cell(2, 2, Alive).unwrap();
        assert_eq!(board.step(), Grid::empty(5, 5));
    }

    #[test]
    fn degenerate_grids_step_to_themselves() {
        for (rows, columns) in [(0, 0), (0, 7), (7, 0)] {
            let board = Grid::empty(rows, columns);
            let next = board.step();
            assert_eq!((next.rows(), next.columns()), (rows, columns));
            assert_eq!(next, board);
        }
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        let mut horizontal = Grid::empty(9, 9);
        for col in 4..=6 {
            horizontal = horizontal.set_cell(5, col, Alive).unwrap();
        }
        let mut vertical = Grid::empty(9, 9);
        for row in 4..=6 {
            vertical = vertical.set_cell(row, 5, Alive).unwrap();
        }

        assert_eq!(horizontal.step(), vertical);
        assert_eq!(horizontal.step().step(), horizontal);
    }

    #[test]
    fn blinker_against_the_edge_does_not_wrap() {
        let board = grid(
            "***..
             .....
             .....",
        );
        let expected = grid(
            ".*...
             .*...
             .....",
        );
        assert_eq!(board.step(), expected);
    }

    #[test]
    fn glider_moves_one_cell_diagonally_every_four_generations() {
        let start = Grid::with_pattern(10, 10, &patterns::GLIDER, (1, 1)).unwrap();
        let moved = Grid::with_pattern(10, 10, &patterns::GLIDER, (2, 2)).unwrap();
        let after = (0..4).fold(start, |board, _| board.step());
        assert_eq!(after, moved);
    }

    #[test]
    fn step_does_not_depend_on_visiting_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Grid::random(12, 17, AliveProbability::default(), &mut rng);
        let next = board.step();

        // Decide every cell from the untouched input, walking backwards.
        let mut reference = Grid::empty(board.rows(), board.columns());
        for row in (0..board.rows()).rev() {
            for col in (0..board.columns()).rev() {
                let state = next_state(board.get(row, col).unwrap(), board.live_neighbors(row, col).unwrap());
                reference = reference.set_cell(row, col, state).unwrap();
            }
        }
        assert_eq!(next, reference);
    }

    #[test]
    fn step_is_pure() {
        let mut rng = StdRng::seed_from_u64(42);
        let board = Grid::random(20, 20, AliveProbability::default(), &mut rng);
        let original = board.clone();

        let composed = board.step().step().step();
        let iterated = (0..3).fold(board.clone(), |g, _| g.step());
        assert_eq!(composed, iterated);
        assert_eq!(board, original);
    }

    #[test]
    fn random_respects_probability_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        let none = AliveProbability::new(0.0).unwrap();
        let all = AliveProbability::new(1.0).unwrap();
        assert_eq!(Grid::random(8, 6, none, &mut rng), Grid::empty(8, 6));
        assert_eq!(Grid::random(8, 6, all, &mut rng).population(), 48);
    }

    #[test]
    fn random_is_reproducible_with_a_seeded_source() {
        let probability = AliveProbability::default();
        let a = Grid::random(30, 30, probability, &mut StdRng::seed_from_u64(99));
        let b = Grid::random(30, 30, probability, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
        assert!(a.population() > 0 && a.population() < 900);
    }

    #[test]
    fn set_cell_leaves_the_original_snapshot_alone() {
        let before = Grid::empty(3, 3);
        let after = before.set_cell(0, 2, Alive).unwrap();
        assert_eq!(before.get(0, 2), Ok(Dead));
        assert_eq!(after.get(0, 2), Ok(Alive));
        assert_eq!(after.population(), 1);
    }

    #[test]
    fn set_cell_out_of_bounds_is_an_error() {
        let board = Grid::empty(3, 3);
        assert!(matches!(board.set_cell(3, 0, Alive), Err(GridError::OutOfBounds { .. })));
        assert!(matches!(board.set_cell(0, 3, Alive), Err(GridError::OutOfBounds { .. })));
    }

    #[test]
    fn ragged_rows_are_invalid() {
        let rows = vec![vec![Dead, Dead], vec![Dead]];
        assert!(matches!(Grid::from_rows(rows), Err(GridError::InvalidDimensions(_))));
        assert!(matches!("**\n*".parse::<Grid>(), Err(GridError::InvalidDimensions(_))));
    }

    #[test]
    fn text_form_round_trips_through_display() {
        let board = grid(".*.\n*.*");
        assert_eq!(board.to_string(), ".*.\n*.*\n");
        assert_eq!(board.to_string().parse::<Grid>(), Ok(board));
    }

    #[test]
    fn unknown_marker_reports_its_line() {
        assert_eq!(
            "...\n.x.".parse::<Grid>(),
            Err(GridError::InvalidCell { marker: 'x', line: 2 })
        );
    }

    #[test]
    fn pattern_origin_near_usize_max_is_out_of_bounds() {
        for origin in [(0, usize::MAX), (usize::MAX, 0), (usize::MAX, usize::MAX)] {
            let result = Grid::with_pattern(10, 10, &patterns::GLIDER, origin);
            assert!(matches!(result, Err(GridError::OutOfBounds { rows: 10, columns: 10, .. })));
        }
    }

    #[test]
    fn pattern_outside_the_board_is_rejected() {
        let result = Grid::with_pattern(3, 3, &patterns::GLIDER, (1, 1));
        assert!(matches!(result, Err(GridError::OutOfBounds { .. })));
    }
}
