//! Board: the token grid, run detection, gravity and refill.
//!
//! Row 0 is the top row; gravity pulls towards `rows - 1`. Cells are stored
//! row-major in a flat vector.

use crate::source::TokenSource;
use crate::token::{Cell, TOKEN_KINDS, TokenKind};

/// Minimum run length that clears.
pub const RUN_LENGTH: usize = 3;

/// Redraws per cell before init falls back to the first allowed kind.
const INIT_MAX_DRAWS: usize = 64;

const NEIGHBOURS_4: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Grid coordinate: `row` counts down from the top, `col` right from the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True when `other` shares an edge with `self`.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    fn offset(self, dr: isize, dc: isize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }
}

/// A maximal 4-connected cluster of same-kind cells that sit on some run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroup {
    pub kind: TokenKind,
    pub cells: Vec<Pos>,
}

impl MatchGroup {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    /// cells[row * cols + col]
    cells: Vec<Cell>,
}

impl Board {
    /// All-empty board.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    /// Random layout with no run of three.
    ///
    /// Scans row-major; each cell is redrawn while it would complete a run with
    /// its two left or two upper neighbours. Only those two directions are
    /// checked, which is enough because every later cell re-checks its own.
    pub fn random<S: TokenSource + ?Sized>(rows: usize, cols: usize, source: &mut S) -> Self {
        let mut board = Self::empty(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                let pos = Pos::new(row, col);
                let mut kind = source.next_token();
                let mut draws = 1;
                while board.completes_run_behind(pos, kind) {
                    if draws >= INIT_MAX_DRAWS {
                        // At most two kinds are ever forbidden here.
                        kind = TokenKind::ALL
                            .into_iter()
                            .find(|k| !board.completes_run_behind(pos, *k))
                            .unwrap_or(kind);
                        break;
                    }
                    kind = source.next_token();
                    draws += 1;
                }
                board.set(pos, Cell::Token(kind));
            }
        }
        board
    }

    /// Build from row-major rows. `None` if the rows are ragged or empty.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Self {
            rows: height,
            cols: width,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    fn completes_run_behind(&self, pos: Pos, kind: TokenKind) -> bool {
        let cell = Cell::Token(kind);
        let Pos { row, col } = pos;
        let left = col >= 2
            && self.get(Pos::new(row, col - 1)) == Some(cell)
            && self.get(Pos::new(row, col - 2)) == Some(cell);
        let up = row >= 2
            && self.get(Pos::new(row - 1, col)) == Some(cell)
            && self.get(Pos::new(row - 2, col)) == Some(cell);
        left || up
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    #[inline]
    fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.cols + pos.col)
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Returns false (and does nothing) when `pos` is out of bounds.
    #[inline]
    pub fn set(&mut self, pos: Pos, cell: Cell) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// One row, left to right.
    pub fn row(&self, row: usize) -> Option<&[Cell]> {
        (row < self.rows).then(|| &self.cells[row * self.cols..(row + 1) * self.cols])
    }

    /// Owned row-major copy for renderers.
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        if self.cols == 0 {
            return Vec::new();
        }
        self.cells.chunks(self.cols).map(<[Cell]>::to_vec).collect()
    }

    /// Exchange two cells. No adjacency requirement: callers that need one
    /// check [`Pos::is_adjacent`] themselves. Returns false if either is out of bounds.
    pub fn swap(&mut self, a: Pos, b: Pos) -> bool {
        match (self.index(a), self.index(b)) {
            (Some(i), Some(j)) => {
                self.cells.swap(i, j);
                true
            }
            _ => false,
        }
    }

    pub fn has_empty(&self) -> bool {
        self.cells.iter().any(|c| c.is_empty())
    }

    /// Non-empty cells per kind, indexed by [`TokenKind::index`].
    pub fn token_counts(&self) -> [u32; TOKEN_KINDS] {
        let mut counts = [0u32; TOKEN_KINDS];
        for kind in self.cells.iter().filter_map(|c| c.token()) {
            counts[kind.index()] += 1;
        }
        counts
    }

    /// Mark every cell that lies on a horizontal or vertical run of three.
    fn run_mask(&self) -> Vec<bool> {
        let mut marked = vec![false; self.cells.len()];
        for row in 0..self.rows {
            for col in 0..self.cols.saturating_sub(RUN_LENGTH - 1) {
                self.mark_run(&mut marked, Pos::new(row, col), (0, 1));
            }
        }
        for col in 0..self.cols {
            for row in 0..self.rows.saturating_sub(RUN_LENGTH - 1) {
                self.mark_run(&mut marked, Pos::new(row, col), (1, 0));
            }
        }
        marked
    }

    fn mark_run(&self, marked: &mut [bool], start: Pos, (dr, dc): (usize, usize)) {
        let Some(Cell::Token(kind)) = self.get(start) else {
            return;
        };
        let run: Vec<Pos> = (0..RUN_LENGTH)
            .map(|i| Pos::new(start.row + i * dr, start.col + i * dc))
            .collect();
        if run.iter().all(|p| self.get(*p) == Some(Cell::Token(kind))) {
            for p in run {
                marked[p.row * self.cols + p.col] = true;
            }
        }
    }

    /// True if any run of three exists.
    pub fn has_run(&self) -> bool {
        self.run_mask().into_iter().any(|m| m)
    }

    /// Find all match groups: cells on a run, grouped by 4-connectivity
    /// between cells of the same kind. Group order follows a row-major scan
    /// of each group's first cell.
    pub fn find_matches(&self) -> Vec<MatchGroup> {
        let marked = self.run_mask();
        let mut visited = vec![false; self.cells.len()];
        let mut groups = Vec::new();

        for start in 0..self.cells.len() {
            if !marked[start] || visited[start] {
                continue;
            }
            let Cell::Token(kind) = self.cells[start] else {
                continue;
            };
            let mut cells = Vec::new();
            let mut stack = vec![Pos::new(start / self.cols, start % self.cols)];
            visited[start] = true;

            while let Some(pos) = stack.pop() {
                cells.push(pos);
                for (dr, dc) in NEIGHBOURS_4 {
                    let Some(next) = pos.offset(dr, dc) else {
                        continue;
                    };
                    let Some(i) = self.index(next) else {
                        continue;
                    };
                    if marked[i] && !visited[i] && self.cells[i] == Cell::Token(kind) {
                        visited[i] = true;
                        stack.push(next);
                    }
                }
            }
            groups.push(MatchGroup { kind, cells });
        }
        groups
    }

    /// Empty every cell of every group.
    pub fn clear_groups(&mut self, groups: &[MatchGroup]) {
        for pos in groups.iter().flat_map(|g| g.cells.iter()) {
            self.set(*pos, Cell::Empty);
        }
    }

    /// One gravity pass. Per column, bottom-up: a token above an empty cell
    /// moves down one row. A token moves at most once per pass, so columns
    /// with several gaps take several passes to settle.
    ///
    /// With `refill` (skyfall), a column whose top cell is empty after the
    /// pass gets a fresh token there. Returns whether any cell changed.
    pub fn gravity_pass(&mut self, mut refill: Option<&mut dyn TokenSource>) -> bool {
        let mut changed = false;
        for col in 0..self.cols {
            for row in (1..self.rows).rev() {
                let here = Pos::new(row, col);
                let above = Pos::new(row - 1, col);
                if let (Some(Cell::Empty), Some(Cell::Token(kind))) =
                    (self.get(here), self.get(above))
                {
                    self.set(here, Cell::Token(kind));
                    self.set(above, Cell::Empty);
                    changed = true;
                }
            }
            if let Some(source) = refill.as_deref_mut() {
                let top = Pos::new(0, col);
                if self.get(top) == Some(Cell::Empty) {
                    self.set(top, Cell::Token(source.next_token()));
                    changed = true;
                }
            }
        }
        changed
    }

    /// Fill every empty cell with a fresh token, column by column.
    /// Returns how many cells were filled.
    pub fn replenish<S: TokenSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let mut filled = 0;
        for col in 0..self.cols {
            for row in 0..self.rows {
                let pos = Pos::new(row, col);
                if self.get(pos) == Some(Cell::Empty) {
                    self.set(pos, Cell::Token(source.next_token()));
                    filled += 1;
                }
            }
        }
        filled
    }
}

/// Parse a board from one line per row: `R B G Y P H` for the six kinds
/// (red, blue, green, yellow, purple, heart) and `.` for empty. Whitespace
/// inside a line is ignored.
#[cfg(test)]
pub(crate) fn parse_board(text: &str) -> Board {
    let rows = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            line.chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| match c {
                    'R' => Cell::Token(TokenKind::Fire),
                    'B' => Cell::Token(TokenKind::Water),
                    'G' => Cell::Token(TokenKind::Wood),
                    'Y' => Cell::Token(TokenKind::Light),
                    'P' => Cell::Token(TokenKind::Dark),
                    'H' => Cell::Token(TokenKind::Heart),
                    '.' => Cell::Empty,
                    other => panic!("bad board char {other:?}"),
                })
                .collect()
        })
        .collect();
    Board::from_rows(rows).expect("rectangular board")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RandomTokens, ScriptedTokens};

    fn column(board: &Board, col: usize) -> Vec<Cell> {
        (0..board.rows())
            .map(|r| board.get(Pos::new(r, col)).unwrap())
            .collect()
    }

    #[test]
    fn test_random_board_has_no_runs() {
        for seed in 0..200 {
            let mut source = RandomTokens::seeded(seed);
            let board = Board::random(5, 6, &mut source);
            assert!(!board.has_empty());
            assert!(!board.has_run(), "seed {seed} produced a run");
        }
    }

    #[test]
    fn test_random_board_with_degenerate_source_still_has_no_runs() {
        // Every draw is Fire: the redraw loop has to give up and pick a fallback.
        let mut source = ScriptedTokens::new(vec![TokenKind::Fire]);
        let board = Board::random(8, 8, &mut source);
        assert!(!board.has_run());
    }

    #[test]
    fn test_get_set_out_of_bounds() {
        let mut board = Board::empty(2, 3);
        assert_eq!(board.get(Pos::new(2, 0)), None);
        assert_eq!(board.get(Pos::new(0, 3)), None);
        assert!(!board.set(Pos::new(5, 5), Cell::Token(TokenKind::Fire)));
        assert!(board.set(Pos::new(1, 2), Cell::Token(TokenKind::Fire)));
        assert_eq!(board.get(Pos::new(1, 2)), Some(Cell::Token(TokenKind::Fire)));
    }

    #[test]
    fn test_swap_is_unconstrained() {
        let mut board = parse_board(
            "
            R B G
            Y P H
            ",
        );
        assert!(board.swap(Pos::new(0, 0), Pos::new(1, 2)));
        assert_eq!(board.get(Pos::new(0, 0)), Some(Cell::Token(TokenKind::Heart)));
        assert_eq!(board.get(Pos::new(1, 2)), Some(Cell::Token(TokenKind::Fire)));
        assert!(!board.swap(Pos::new(0, 0), Pos::new(9, 9)));
    }

    #[test]
    fn test_find_matches_two_l_shapes_are_two_groups() {
        // Two separate L-shaped clusters of four. Only the three cells on the
        // run are matched; the foot of each L touches it but is not on a run.
        let board = parse_board(
            "
            R R R B G Y
            R H B Y G P
            B Y P H G G
            H B Y P B H
            Y P H B Y P
            ",
        );
        let groups = board.find_matches();
        assert_eq!(groups.len(), 2);
        let mut sizes: Vec<_> = groups.iter().map(|g| (g.kind, g.len())).collect();
        sizes.sort();
        assert_eq!(sizes, vec![(TokenKind::Fire, 3), (TokenKind::Wood, 3)]);
    }

    #[test]
    fn test_find_matches_l_of_two_runs_is_one_group() {
        let board = parse_board(
            "
            R R R
            R B G
            R G B
            ",
        );
        let groups = board.find_matches();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, TokenKind::Fire);
        assert_eq!(groups[0].len(), 5);
    }

    #[test]
    fn test_find_matches_cross_is_one_group() {
        let board = parse_board(
            "
            B R B
            R R R
            B R B
            ",
        );
        let groups = board.find_matches();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 5);
    }

    #[test]
    fn test_adjacent_runs_of_different_kinds_stay_separate() {
        let board = parse_board(
            "
            R R R
            B B B
            ",
        );
        let groups = board.find_matches();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_same_kind_neighbour_off_run_is_not_grouped() {
        // (1,0) is Fire and touches the run but is not itself on a run.
        let board = parse_board(
            "
            R R R
            R B G
            ",
        );
        let groups = board.find_matches();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
        assert!(!groups[0].cells.contains(&Pos::new(1, 0)));
    }

    #[test]
    fn test_empty_cells_never_match() {
        let board = parse_board(
            "
            . . .
            . . .
            . . .
            ",
        );
        assert!(board.find_matches().is_empty());
        assert!(!board.has_run());
    }

    #[test]
    fn test_gravity_pass_moves_one_step() {
        // Column top->bottom: [T, ., ., T, .]
        let mut board = parse_board(
            "
            R
            .
            .
            B
            .
            ",
        );
        let r = Cell::Token(TokenKind::Fire);
        let b = Cell::Token(TokenKind::Water);
        let e = Cell::Empty;

        assert!(board.gravity_pass(None));
        assert_eq!(column(&board, 0), vec![e, r, e, e, b]);

        assert!(board.gravity_pass(None));
        assert_eq!(column(&board, 0), vec![e, e, r, e, b]);

        assert!(board.gravity_pass(None));
        assert_eq!(column(&board, 0), vec![e, e, e, r, b]);

        assert!(!board.gravity_pass(None));
    }

    #[test]
    fn test_gravity_pass_with_skyfall_fills_top_each_pass() {
        let mut board = parse_board(
            "
            . R
            . B
            . G
            ",
        );
        let mut source = ScriptedTokens::new(vec![TokenKind::Heart]);
        assert!(board.gravity_pass(Some(&mut source)));
        assert_eq!(board.get(Pos::new(0, 0)), Some(Cell::Token(TokenKind::Heart)));
        assert_eq!(source.drawn(), 1);

        // Heart falls one row, a new one lands on top.
        assert!(board.gravity_pass(Some(&mut source)));
        assert_eq!(board.get(Pos::new(1, 0)), Some(Cell::Token(TokenKind::Heart)));
        assert_eq!(board.get(Pos::new(0, 0)), Some(Cell::Token(TokenKind::Heart)));
        assert_eq!(source.drawn(), 2);
    }

    #[test]
    fn test_replenish_fills_every_gap_in_place() {
        let mut board = parse_board(
            "
            . R .
            B . G
            ",
        );
        let mut source = ScriptedTokens::new(vec![TokenKind::Light]);
        assert_eq!(board.replenish(&mut source), 3);
        assert!(!board.has_empty());
        assert_eq!(board.get(Pos::new(0, 1)), Some(Cell::Token(TokenKind::Fire)));
        assert_eq!(board.get(Pos::new(1, 1)), Some(Cell::Token(TokenKind::Light)));
    }

    #[test]
    fn test_token_counts_skip_empty() {
        let board = parse_board(
            "
            R R .
            H . P
            ",
        );
        assert_eq!(board.token_counts(), [2, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Board::from_rows(vec![vec![Cell::Empty; 2], vec![Cell::Empty; 3]]).is_none());
        assert!(Board::from_rows(Vec::new()).is_none());
    }
}
