/// A named arrangement of live cells, as offsets from its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

impl Pattern {
    pub fn height(&self) -> usize {
        self.cells.iter().map(|&(row, _)| row + 1).max().unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.cells.iter().map(|&(_, col)| col + 1).max().unwrap_or(0)
    }

    /// Origin that puts the pattern in the middle of a `rows` x `columns` board,
    /// or `None` when it does not fit.
    pub fn centered_origin(&self, rows: usize, columns: usize) -> Option<(usize, usize)> {
        let row = rows.checked_sub(self.height())? / 2;
        let col = columns.checked_sub(self.width())? / 2;
        Some((row, col))
    }
}

pub const GLIDER: Pattern = Pattern {
    name: "Glider",
    cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
};

pub const BLINKER: Pattern = Pattern {
    name: "Blinker",
    cells: &[(0, 0), (0, 1), (0, 2)],
};

pub const TOAD: Pattern = Pattern {
    name: "Toad",
    cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
};

pub const BEACON: Pattern = Pattern {
    name: "Beacon",
    cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
};

pub const PATTERNS: &[Pattern] = &[GLIDER, BLINKER, TOAD, BEACON];

pub fn find(name: &str) -> Option<&'static Pattern> {
    PATTERNS.iter().find(|pattern| pattern.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn oscillators_return_after_two_generations() {
        for pattern in [BLINKER, TOAD, BEACON] {
            let origin = pattern.centered_origin(12, 12).unwrap();
            let board = Grid::with_pattern(12, 12, &pattern, origin).unwrap();
            assert_ne!(board.step(), board, "{}", pattern.name);
            assert_eq!(board.step().step(), board, "{}", pattern.name);
        }
    }

    #[test]
    fn centered_origin_needs_room() {
        assert_eq!(BLINKER.centered_origin(5, 5), Some((2, 1)));
        assert_eq!(BEACON.centered_origin(3, 10), None);
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(find("glider"), Some(&GLIDER));
        assert_eq!(find("spaceship"), None);
    }
}
