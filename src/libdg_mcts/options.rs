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

use dg_go::point::Coord;
use dg_go::{Board, Color};

pub trait PolicyChecker {
    /// Returns true if `coord` should be considered a candidate move during
    /// search, i.e. whether the tree should allocate a prior slot to it.
    fn is_policy_candidate(&self, board: &Board, coord: Coord) -> bool;
}

pub trait SearchOptions: Sync + Send {
    fn policy_checker(&self, board: &Board, to_move: Color) -> Box<dyn PolicyChecker>;

    /// Whether the search should behave deterministically -- no root
    /// Dirichlet noise, no random symmetry, stable tie-breaks throughout.
    fn deterministic(&self) -> bool;
}

pub struct StandardPolicyChecker {
    to_move: Color
}

impl StandardPolicyChecker {
    fn new(to_move: Color) -> Self {
        Self { to_move }
    }
}

impl PolicyChecker for StandardPolicyChecker {
    fn is_policy_candidate(&self, board: &Board, coord: Coord) -> bool {
        coord == Coord::Pass || board.is_move_legal(self.to_move, coord)
    }
}

/// Self-play search: noise, random symmetry, and soft-pick are all under
/// the caller's control; this option set itself only needs to not force
/// determinism.
#[derive(Clone, Default)]
pub struct StandardSearch;

impl StandardSearch {
    pub fn new() -> Self {
        Self
    }
}

impl SearchOptions for StandardSearch {
    fn policy_checker(&self, _board: &Board, to_move: Color) -> Box<dyn PolicyChecker> {
        Box::new(StandardPolicyChecker::new(to_move))
    }

    fn deterministic(&self) -> bool {
        false
    }
}

/// GTP / analysis search: repeated calls with the same tree state must
/// return the same move, so noise and random symmetry are disabled by the
/// player when this option set is in effect.
#[derive(Clone, Default)]
pub struct StandardDeterministicSearch;

impl StandardDeterministicSearch {
    pub fn new() -> Self {
        Self
    }
}

impl SearchOptions for StandardDeterministicSearch {
    fn policy_checker(&self, _board: &Board, to_move: Color) -> Box<dyn PolicyChecker> {
        Box::new(StandardPolicyChecker::new(to_move))
    }

    fn deterministic(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_go::point::Point;

    #[test]
    fn pass_is_always_a_policy_candidate() {
        let board = Board::new(7.5);
        let checker = StandardSearch::new().policy_checker(&board, Color::Black);

        assert!(checker.is_policy_candidate(&board, Coord::Pass));
    }

    #[test]
    fn an_occupied_point_is_not_a_candidate() {
        let mut board = Board::new(7.5);
        board.place(Color::Black, Point::new(4, 4));
        let checker = StandardSearch::new().policy_checker(&board, Color::White);

        assert!(!checker.is_policy_candidate(&board, Coord::Point(Point::new(4, 4))));
    }
}
