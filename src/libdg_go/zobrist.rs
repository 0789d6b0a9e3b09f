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
// Global, read-only-after-init Zobrist tables. Initialized once per process
// from a fixed seed so that hashes are reproducible across runs -- this
// matters for superko bookkeeping in tests, where we want the same sequence
// of moves to always produce the same hash.

use crate::point::NUM_POINTS;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ZOBRIST_SEED: u64 = 0x6a09_e667_f3bc_c908;

pub struct ZobristTable {
    /// `black[p]` / `white[p]` are independent random values so that a point
    /// changing color is not confusable with some XOR of two other points.
    black: Vec<u64>,
    white: Vec<u64>,

    /// Mixed into the hash whenever it is black's turn to move.
    pub black_to_play: u64,

    /// One value per distinct ko point, plus one for "no ko".
    ko: Vec<u64>
}

impl ZobristTable {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

        ZobristTable {
            black: (0..NUM_POINTS).map(|_| rng.gen()).collect(),
            white: (0..NUM_POINTS).map(|_| rng.gen()).collect(),
            black_to_play: rng.gen(),
            ko: (0..=NUM_POINTS).map(|_| rng.gen()).collect()
        }
    }

    pub fn black_at(&self, index: usize) -> u64 {
        self.black[index]
    }

    pub fn white_at(&self, index: usize) -> u64 {
        self.white[index]
    }

    /// `None` maps to the dedicated "no ko" term so that the absence of a
    /// ko point is itself part of the hash.
    pub fn ko_at(&self, index: Option<usize>) -> u64 {
        self.ko[index.unwrap_or(NUM_POINTS)]
    }
}

lazy_static! {
    pub static ref TABLE: ZobristTable = ZobristTable::new();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_values_are_distinct() {
        assert_ne!(TABLE.black_at(0), TABLE.white_at(0));
        assert_ne!(TABLE.black_at(0), TABLE.black_at(1));
        assert_ne!(TABLE.ko_at(None), TABLE.ko_at(Some(0)));
    }

    #[test]
    fn table_is_stable_across_construction() {
        let other = ZobristTable::new();

        assert_eq!(TABLE.black_at(5), other.black_at(5));
    }
}
