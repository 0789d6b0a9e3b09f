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

extern crate dg_utils;
#[macro_use] extern crate lazy_static;
extern crate rand;
extern crate thiserror;

pub mod board;
pub mod color;
pub mod error;
pub mod point;
pub mod zobrist;

pub mod utils {
    pub mod features;
    pub mod symmetry;
}

pub use self::board::Board;
pub use self::color::Color;
pub use self::error::IllegalMoveError;
pub use self::point::{Point, N};

/// Default komi used when a caller doesn't supply one. Area scoring under
/// Tromp-Taylor rules needs a sizeable compensation for White since passing
/// stones are never removed before counting; 7.5 is the standard value for
/// 9x9 boards and is also what the 19x19 build defaults to when unconfigured.
pub const DEFAULT_KOMI: f32 = 7.5;
