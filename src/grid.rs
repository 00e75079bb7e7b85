//! Board geometry: cells, headings and the playable grid.

/// Smallest side length a grid is allowed to shrink to.
pub const MIN_GRID_SIDE: u16 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridSize {
    pub width: u16,
    pub height: u16,
}

impl GridSize {
    pub const fn new(width: u16, height: u16) -> Self {
        GridSize {
            width: if width < MIN_GRID_SIDE { MIN_GRID_SIDE } else { width },
            height: if height < MIN_GRID_SIDE { MIN_GRID_SIDE } else { height },
        }
    }

    /// The same size with both sides raised to [`MIN_GRID_SIDE`].
    pub const fn clamped(self) -> Self {
        GridSize::new(self.width, self.height)
    }

    /// How many whole cells of `cell` fit into a drawing surface of `surface`.
    pub fn fit(surface: (u16, u16), cell: (u16, u16)) -> Self {
        let (cell_w, cell_h) = (cell.0.max(1), cell.1.max(1));
        GridSize::new(surface.0 / cell_w, surface.1 / cell_h)
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    /// Every cell of the grid, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Cell { x, y }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    pub fn is_opposite(&self, other: Direction) -> bool {
        self.opposite() == other
    }

    pub fn delta(&self) -> Delta {
        (*self).into()
    }
}

/// A raw, unvalidated vector. Autopilot hints arrive in this shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delta {
    pub x: i32,
    pub y: i32,
}

impl Delta {
    pub fn new(x: i32, y: i32) -> Self {
        Delta { x, y }
    }

    /// Clamp each axis to -1, 0 or 1.
    pub fn signum(&self) -> Delta {
        Delta {
            x: self.x.signum(),
            y: self.y.signum(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl From<Direction> for Delta {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::North => Delta { x: 0, y: -1 },
            Direction::South => Delta { x: 0, y: 1 },
            Direction::East => Delta { x: 1, y: 0 },
            Direction::West => Delta { x: -1, y: 0 },
        }
    }
}

impl TryFrom<Delta> for Direction {
    type Error = Delta;

    /// Only the four unit vectors name a direction; zero and diagonals are
    /// handed back unchanged.
    fn try_from(delta: Delta) -> Result<Self, Self::Error> {
        match (delta.x, delta.y) {
            (0, -1) => Ok(Direction::North),
            (0, 1) => Ok(Direction::South),
            (1, 0) => Ok(Direction::East),
            (-1, 0) => Ok(Direction::West),
            _ => Err(delta),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: u16,
    pub y: u16,
}

impl Cell {
    pub fn new(x: u16, y: u16) -> Self {
        Cell { x, y }
    }

    /// The neighbouring cell in `dir`, or `None` if that is past a wall.
    pub fn step(&self, dir: Direction, grid: GridSize) -> Option<Cell> {
        let delta = dir.delta();
        let x = self.x as i32 + delta.x;
        let y = self.y as i32 + delta.y;
        grid.contains(x, y).then(|| Cell {
            x: x as u16,
            y: y as u16,
        })
    }
}
