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
//
// What a finished game is recorded as: either a resignation or a score,
// by whichever color won. `Board::result_string` already knows how to
// render the scored case ("B+3.5" / "W+7.5"); a resignation is rendered
// the same way GTP does it ("B+Resign").

use dg_go::{Board, Color};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GameResult {
    Resign { winner: Color },
    Scored { winner: Color, margin: f32 }
}

impl GameResult {
    /// Scores `board` under Tromp-Taylor rules and records the winner. Used
    /// when the game ends by two consecutive passes.
    pub fn from_score(board: &Board) -> Self {
        let score = board.calculate_score(board.komi());

        if score > 0.0 {
            GameResult::Scored { winner: Color::Black, margin: score }
        } else {
            GameResult::Scored { winner: Color::White, margin: -score }
        }
    }

    /// Records a resignation by `resigning_color`'s opponent winning.
    pub fn from_resignation(resigning_color: Color) -> Self {
        GameResult::Resign { winner: resigning_color.opposite() }
    }

    pub fn winner(self) -> Color {
        match self {
            GameResult::Resign { winner } | GameResult::Scored { winner, .. } => winner
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GameResult::Resign { winner } => write!(f, "{}+Resign", winner),
            GameResult::Scored { winner, margin } => write!(f, "{}+{:.1}", winner, margin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_passes_on_an_empty_board_is_white_plus_komi() {
        let mut board = Board::new(7.5);
        board.play(Color::Black, dg_go::point::Coord::Pass).unwrap();
        let board = board.play(Color::White, dg_go::point::Coord::Pass).unwrap();

        let result = GameResult::from_score(&board);
        assert_eq!(result.winner(), Color::White);
        assert_eq!(result.to_string(), "W+7.5");
    }

    #[test]
    fn resignation_credits_the_opponent() {
        let result = GameResult::from_resignation(Color::Black);

        assert_eq!(result.winner(), Color::White);
        assert_eq!(result.to_string(), "W+Resign");
    }
}
