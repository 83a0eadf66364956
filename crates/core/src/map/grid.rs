//! Rectangular grid geometry. A map of `W×H` cells is backed by a lattice of
//! `(W+1)×(H+1)` corners; cell `(x, y)` is bounded by corners `(x, y)`,
//! `(x+1, y)`, `(x, y+1)` and `(x+1, y+1)`. The same [Grid] container holds
//! both, the only difference is the dimensions.
//!
//! Coordinates grow east (x) and south (y), so `(0, 0)` is the north-west
//! corner of the map.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use strum::{EnumIter, IntoEnumIterator};
use thiserror::Error;

/// A position on a grid, either a cell or a corner depending on which grid
/// it indexes into.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[display(fmt = "({}, {})", x, y)]
pub struct GridPoint {
    pub x: u32,
    pub y: u32,
}

impl GridPoint {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Number of 4-directional steps between two points
    pub fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Move one step in a direction. Returns `None` if that would put us at a
    /// negative coordinate. The upper bound is the grid's problem.
    pub fn step(self, direction: Direction) -> Option<Self> {
        let x = match direction {
            Direction::East => self.x.checked_add(1)?,
            Direction::West => self.x.checked_sub(1)?,
            Direction::North | Direction::South => self.x,
        };
        let y = match direction {
            Direction::South => self.y.checked_add(1)?,
            Direction::North => self.y.checked_sub(1)?,
            Direction::East | Direction::West => self.y,
        };
        Some(Self { x, y })
    }

    /// Treating this point as a cell, get the position of one of its corners
    /// in the corner lattice.
    pub fn corner(self, corner: Corner) -> Self {
        let (dx, dy) = corner.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Treating this point as a cell, get all 4 of its corners, in
    /// [Corner::ALL] order.
    pub fn corners(self) -> [Self; 4] {
        Corner::ALL.map(|corner| self.corner(corner))
    }

    /// This point as floating-point coordinates
    pub fn as_f64(self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }

    /// Treating this point as a cell, get the coordinates of its center,
    /// measured in corner-lattice units.
    pub fn center(self) -> [f64; 2] {
        [self.x as f64 + 0.5, self.y as f64 + 0.5]
    }
}

/// One of the 4 cardinal directions. Iteration order is clockwise from north,
/// and everything that walks neighbors relies on that order being stable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// The 4 corners of a cell.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize,
)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Corner {
    /// All corners, in the order that cell corners are read: NW, NE, SW, SE.
    /// Anything that breaks ties by "first seen" uses this order.
    pub const ALL: [Self; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// Offset from a cell's position to this corner's position in the
    /// corner lattice
    pub fn offset(self) -> (u32, u32) {
        match self {
            Self::NorthWest => (0, 0),
            Self::NorthEast => (1, 0),
            Self::SouthWest => (0, 1),
            Self::SouthEast => (1, 1),
        }
    }

    /// The bit that represents this corner in a [CornerCode]. This mapping
    /// has to match the layout of the tile artwork, so it is fixed globally.
    pub fn code_bit(self) -> u8 {
        match self {
            Self::NorthEast => 0b0001,
            Self::SouthEast => 0b0010,
            Self::SouthWest => 0b0100,
            Self::NorthWest => 0b1000,
        }
    }
}

/// A 4-bit Wang corner code. Each bit says whether one corner of a cell is
/// "high" (see [Corner::code_bit] for the bit layout). The code is used
/// directly as an index into a 16-tile sheet.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[display(fmt = "{:04b}", _0)]
pub struct CornerCode(u8);

impl CornerCode {
    /// No corners are high
    pub const EMPTY: Self = Self(0);
    /// All corners are high
    pub const FULL: Self = Self(0b1111);

    /// Create a code from raw bits. Returns `None` if any bit above the low 4
    /// is set.
    pub fn new(bits: u8) -> Option<Self> {
        if bits <= Self::FULL.0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Build a code by asking, for each corner, whether it is high
    pub fn from_corners(mut is_high: impl FnMut(Corner) -> bool) -> Self {
        Self(
            Corner::ALL
                .iter()
                .filter(|corner| is_high(**corner))
                .fold(0, |bits, corner| bits | corner.code_bit()),
        )
    }

    /// Every possible code, from 0 to 15
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=Self::FULL.0).map(Self)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Index of this code's tile within a 16-tile sheet
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    pub fn contains(self, corner: Corner) -> bool {
        self.0 & corner.code_bit() != 0
    }
}

/// A dense, row-major, fixed-size 2D grid of values. Deserialization fails
/// if the number of values doesn't match the dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridData<T>")]
pub struct Grid<T> {
    width: u32,
    height: u32,
    values: Vec<T>,
}

/// Serialized form of a [Grid], before its size is checked
#[derive(Deserialize)]
struct GridData<T> {
    width: u32,
    height: u32,
    values: Vec<T>,
}

#[derive(Copy, Clone, Debug, PartialEq, Error)]
#[error("{width}x{height} grid has {len} values")]
pub struct GridSizeError {
    width: u32,
    height: u32,
    len: usize,
}

impl<T> TryFrom<GridData<T>> for Grid<T> {
    type Error = GridSizeError;

    fn try_from(data: GridData<T>) -> Result<Self, Self::Error> {
        if data.values.len() != data.width as usize * data.height as usize {
            return Err(GridSizeError {
                width: data.width,
                height: data.height,
                len: data.values.len(),
            });
        }
        Ok(Self {
            width: data.width,
            height: data.height,
            values: data.values,
        })
    }
}

impl<T> Grid<T> {
    /// Build a grid by computing a value for every point. Points are visited
    /// in row-major order, which matters if `f` has side effects.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(GridPoint) -> T,
    ) -> Self {
        let values = points_in(width, height).map(&mut f).collect();
        Self {
            width,
            height,
            values,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, point: GridPoint) -> bool {
        point.x < self.width && point.y < self.height
    }

    /// Is this point on the outer boundary of the grid?
    pub fn is_boundary(&self, point: GridPoint) -> bool {
        self.contains(point)
            && (point.x == 0
                || point.y == 0
                || point.x == self.width - 1
                || point.y == self.height - 1)
    }

    fn offset(&self, point: GridPoint) -> Option<usize> {
        if self.contains(point) {
            Some(point.y as usize * self.width as usize + point.x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, point: GridPoint) -> Option<&T> {
        self.offset(point).map(|i| &self.values[i])
    }

    pub fn get_mut(&mut self, point: GridPoint) -> Option<&mut T> {
        self.offset(point).map(move |i| &mut self.values[i])
    }

    /// All points in this grid, in row-major order. The iterator doesn't
    /// borrow the grid, so it can be used while mutating.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> {
        points_in(self.width, self.height)
    }

    /// All points with their values, in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (GridPoint, &T)> {
        self.points().zip(self.values.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    /// Get the in-bounds 4-directional neighbors of a point, in [Direction]
    /// order. Doesn't borrow the grid.
    pub fn neighbors(
        &self,
        point: GridPoint,
    ) -> impl Iterator<Item = GridPoint> {
        let (width, height) = (self.width, self.height);
        Direction::iter().filter_map(move |direction| {
            let next = point.step(direction)?;
            if next.x < width && next.y < height {
                Some(next)
            } else {
                None
            }
        })
    }

    /// Every horizontal and vertical edge between adjacent points, each
    /// yielded exactly once. Points are visited in row-major order, and for
    /// each point the east edge comes before the south edge.
    pub fn edges(&self) -> impl Iterator<Item = (GridPoint, GridPoint)> {
        let (width, height) = (self.width, self.height);
        self.points().flat_map(move |point| {
            let east = if point.x + 1 < width {
                Some((point, GridPoint::new(point.x + 1, point.y)))
            } else {
                None
            };
            let south = if point.y + 1 < height {
                Some((point, GridPoint::new(point.x, point.y + 1)))
            } else {
                None
            };
            east.into_iter().chain(south)
        })
    }

    /// Map every value into a new grid of the same dimensions
    pub fn map<U>(&self, mut f: impl FnMut(GridPoint, &T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            values: self.iter().map(|(point, value)| f(point, value)).collect(),
        }
    }
}

impl<T: Clone> Grid<T> {
    /// Create a grid where every point holds the same value
    pub fn filled(width: u32, height: u32, value: T) -> Self {
        Self {
            width,
            height,
            values: vec![value; width as usize * height as usize],
        }
    }
}

impl<T> Index<GridPoint> for Grid<T> {
    type Output = T;

    fn index(&self, point: GridPoint) -> &Self::Output {
        match self.get(point) {
            Some(value) => value,
            None => panic!(
                "{} is out of bounds for {}x{} grid",
                point, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<GridPoint> for Grid<T> {
    fn index_mut(&mut self, point: GridPoint) -> &mut Self::Output {
        let (width, height) = (self.width, self.height);
        match self.get_mut(point) {
            Some(value) => value,
            None => panic!(
                "{} is out of bounds for {}x{} grid",
                point, width, height
            ),
        }
    }
}

fn points_in(width: u32, height: u32) -> impl Iterator<Item = GridPoint> {
    (0..height).flat_map(move |y| (0..width).map(move |x| GridPoint::new(x, y)))
}
