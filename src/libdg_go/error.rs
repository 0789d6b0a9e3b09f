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

use crate::point::Coord;
use thiserror::Error;

/// Why a move was rejected by [`crate::board::Board::play`]. Corresponds to
/// the `IllegalMove` error kind of the engine-wide error design; `dg_mcts`
/// wraps this in its own `EngineError::IllegalMove` variant at the seam
/// where a caller-facing diagnostic is needed.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum IllegalMoveError {
    #[error("{0} is already occupied")]
    Occupied(Coord),

    #[error("{0} recreates the ko position")]
    Ko(Coord),

    #[error("{0} is suicide")]
    Suicide(Coord),

    #[error("{0} would repeat a previous whole-board position (superko)")]
    Superko(Coord)
}
