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
// Builds the fixed `[N, N, 17]` input tensor consumed by the model: planes
// 0..15 are the current-player / opponent stone masks for the current ply
// and seven prior plies, and plane 16 marks which color is to play.

use crate::board::Board;
use crate::color::Color;
use crate::point::{Point, NUM_POINTS};
use crate::utils::symmetry::Transform;
use dg_utils::types::f16;

/// Number of history plies encoded in addition to the current position.
pub const NUM_HISTORY_PLIES: usize = 7;

/// Two planes (mine, theirs) per ply, plus one color-to-play plane.
pub const NUM_FEATURE_PLANES: usize = 2 * (NUM_HISTORY_PLIES + 1) + 1;

/// Total number of `f32`/`f16` elements in one feature tensor.
pub const FEATURE_SIZE: usize = NUM_POINTS * NUM_FEATURE_PLANES;

/// Marker types selecting how planes are packed into the returned buffer.
/// `HWC` (height, width, channel) matches the layout the teacher's network
/// graph consumes; `CHW` is provided for the rare backend (TPU in the
/// original source) that wants channel-major tensors.
pub trait Layout {
    fn index(channel: usize, point: Point) -> usize;
}

pub struct HWC;

impl Layout for HWC {
    fn index(channel: usize, point: Point) -> usize {
        point.to_packed_index() * NUM_FEATURE_PLANES + channel
    }
}

pub struct CHW;

impl Layout for CHW {
    fn index(channel: usize, point: Point) -> usize {
        channel * NUM_POINTS + point.to_packed_index()
    }
}

/// A value a feature element can be materialized as. `f32` is used by tests
/// and in-process random models; `f16` is what's actually sent over the
/// wire to accelerator-backed models, matching the teacher's use of a
/// compact half-float type for its tensors.
pub trait FeatureValue: Copy {
    fn from_bit(bit: bool) -> Self;
}

impl FeatureValue for f32 {
    fn from_bit(bit: bool) -> Self {
        if bit { 1.0 } else { 0.0 }
    }
}

impl FeatureValue for f16 {
    fn from_bit(bit: bool) -> Self {
        f16::from(if bit { 1.0f32 } else { 0.0 })
    }
}

pub trait Features {
    /// Builds the `[N, N, 17]` feature tensor for `self` (the current
    /// position) from `to_move`'s perspective, applying `sym` to the board
    /// coordinates before packing.
    fn get_features<L: Layout, T: FeatureValue>(&self, to_move: Color, sym: Transform) -> Vec<T>;
}

impl Features for Board {
    fn get_features<L: Layout, T: FeatureValue>(&self, to_move: Color, sym: Transform) -> Vec<T> {
        let mut out = vec![T::from_bit(false); FEATURE_SIZE];
        let them = to_move.opposite();

        for ply in 0..=NUM_HISTORY_PLIES {
            let mine_channel = 2 * ply;
            let theirs_channel = 2 * ply + 1;

            if let Some(stones) = self.stones_at(ply) {
                for point in Point::all() {
                    let transformed = sym.apply(point);
                    let color = stones[point.to_packed_index()];

                    if color == to_move {
                        out[L::index(mine_channel, transformed)] = T::from_bit(true);
                    } else if color == them {
                        out[L::index(theirs_channel, transformed)] = T::from_bit(true);
                    }
                }
            }
            // else: beyond the retained history window, left zero-filled.
        }

        let to_play_channel = 2 * (NUM_HISTORY_PLIES + 1);
        let to_play_bit = to_move == Color::Black;

        for point in Point::all() {
            out[L::index(to_play_channel, point)] = T::from_bit(to_play_bit);
        }

        out
    }
}
