// Copyright 2019 Karl Sundequist Blomdahl <karl.sundequist.blomdahl@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;

#[cfg(feature = "board19x19")]
pub const N: usize = 19;

#[cfg(not(feature = "board19x19"))]
pub const N: usize = 9;

/// Total number of board points.
pub const NUM_POINTS: usize = N * N;

/// Total number of distinct moves, board points plus the pass move. This is
/// the width of the policy head, `N*N + 1`.
pub const NUM_MOVES: usize = NUM_POINTS + 1;

/// A point on the board, stored as a packed row-major index in `[0, N*N)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point(u16);

impl Point {
    pub const MAX: usize = NUM_POINTS;

    pub fn new(x: usize, y: usize) -> Self {
        debug_assert!(x < N && y < N, "point ({}, {}) out of bounds", x, y);

        Point((y * N + x) as u16)
    }

    pub fn from_packed_index(index: usize) -> Self {
        debug_assert!(index < NUM_POINTS, "index {} out of bounds", index);

        Point(index as u16)
    }

    pub fn to_packed_index(self) -> usize {
        self.0 as usize
    }

    pub fn x(self) -> usize {
        (self.0 as usize) % N
    }

    pub fn y(self) -> usize {
        (self.0 as usize) / N
    }

    /// Returns the point offset by `(dx, dy)`, or `None` if it would fall
    /// outside of the board.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Point> {
        let x = self.x() as isize + dx;
        let y = self.y() as isize + dy;

        if x < 0 || x >= N as isize || y < 0 || y >= N as isize {
            None
        } else {
            Some(Point::new(x as usize, y as usize))
        }
    }

    /// The four orthogonal neighbours that lie on the board.
    pub fn neighbours(self) -> impl Iterator<Item = Point> {
        const DELTAS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        let this = self;

        DELTAS.iter().filter_map(move |&(dx, dy)| this.offset(dx, dy))
    }

    /// Iterates over every point on the board, in row-major order.
    pub fn all() -> impl Iterator<Item = Point> {
        (0..NUM_POINTS).map(Point::from_packed_index)
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", Coord::Point(*self))
    }
}

/// A move location: either a board point, a pass, a resignation, or an
/// invalid / unparsed coordinate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Coord {
    Point(Point),
    Pass,
    Resign,
    Invalid
}

impl Coord {
    pub fn point(self) -> Option<Point> {
        match self {
            Coord::Point(p) => Some(p),
            _ => None
        }
    }

    /// Maps a move onto its slot in the `[N*N + 1]` policy vector. `Pass`
    /// occupies the last slot; `Resign` and `Invalid` have no slot.
    pub fn to_policy_index(self) -> Option<usize> {
        match self {
            Coord::Point(p) => Some(p.to_packed_index()),
            Coord::Pass => Some(NUM_POINTS),
            Coord::Resign | Coord::Invalid => None
        }
    }

    pub fn from_policy_index(index: usize) -> Coord {
        if index == NUM_POINTS {
            Coord::Pass
        } else if index < NUM_POINTS {
            Coord::Point(Point::from_packed_index(index))
        } else {
            Coord::Invalid
        }
    }
}

const COLUMN_LETTERS: &str = "ABCDEFGHJKLMNOPQRST"; // skips `I`, as in GTP

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Coord::Pass => write!(f, "pass"),
            Coord::Resign => write!(f, "resign"),
            Coord::Invalid => write!(f, "invalid"),
            Coord::Point(p) => {
                let letter = COLUMN_LETTERS.as_bytes()[p.x()] as char;

                write!(f, "{}{}", letter, p.y() + 1)
            }
        }
    }
}

impl std::str::FromStr for Coord {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("pass") {
            return Ok(Coord::Pass);
        } else if s.eq_ignore_ascii_case("resign") {
            return Ok(Coord::Resign);
        }

        let mut chars = s.chars();
        let column = chars.next().ok_or(())?.to_ascii_uppercase();
        let row: String = chars.collect();
        let row: usize = row.parse().map_err(|_| ())?;

        let x = COLUMN_LETTERS.find(column).ok_or(())?;
        let y = row.checked_sub(1).ok_or(())?;

        if x >= N || y >= N {
            return Ok(Coord::Invalid);
        }

        Ok(Coord::Point(Point::new(x, y)))
    }
}
