use crate::grid::{Cell, GridSize};
use std::collections::VecDeque;

/// The snake's body, head first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snek {
    body: VecDeque<Cell>,
}

impl Snek {
    /// A horizontal snake centred on `grid` with its head at the east end.
    pub fn new(grid: GridSize, length: u16) -> Self {
        let length = length.clamp(1, grid.width.saturating_sub(1).max(1));
        let mid_x = grid.width / 2;
        let mid_y = grid.height / 2;
        let head_x = mid_x + length / 2;

        let body = (0..length)
            .map(|i| Cell::new(head_x - i, mid_y))
            .collect();
        Snek { body }
    }

    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        Snek {
            body: cells.into_iter().collect(),
        }
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn tail(&self) -> Cell {
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.body.iter()
    }

    /// Move onto `new_head`. The tail stays put when `grow` is set.
    pub fn advance(&mut self, new_head: Cell, grow: bool) {
        self.body.push_front(new_head);
        if !grow {
            self.body.pop_back();
        }
    }
}
