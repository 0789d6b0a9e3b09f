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
// A wall-clock budget for one move. The remaining-readouts estimate needed
// by `TimeStrategyResult::NotExpired` is derived from the observed readout
// rate so far this move, since there is no other way to relate elapsed time
// to `root.total_count` across wildly different hardware.

use super::{TimeStrategy, TimeStrategyResult};
use crate::tree::Node;
use std::time::{Duration, Instant};

pub struct ByoYomi {
    start: Instant,
    budget: Duration
}

impl ByoYomi {
    pub fn new(seconds: f32) -> Self {
        Self {
            start: Instant::now(),
            budget: Duration::from_secs_f32(seconds.max(0.0))
        }
    }

    /// Allocates this move's share of an overall `time_limit`, shrinking
    /// geometrically by `decay_factor` as the game progresses so that no
    /// single move can exhaust the remaining clock.
    pub fn for_move(time_limit: f32, move_number: usize, decay_factor: f32) -> Self {
        let seconds = time_limit * decay_factor.powi(move_number as i32);

        Self::new(seconds)
    }
}

impl TimeStrategy for ByoYomi {
    fn try_extend(&self, root: &Node) -> TimeStrategyResult {
        let elapsed = self.start.elapsed();

        if elapsed >= self.budget {
            return TimeStrategyResult::Expired;
        }

        let elapsed_secs = elapsed.as_secs_f32().max(1e-3);
        let rate = (root.total_count as f32) / elapsed_secs;
        let remaining_secs = (self.budget - elapsed).as_secs_f32();

        TimeStrategyResult::NotExpired((rate * remaining_secs) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_go::point::NUM_MOVES;

    #[test]
    fn a_zero_second_budget_expires_immediately() {
        let root = Node::new(dg_go::Board::new(7.5), 0.0, vec![0.0; NUM_MOVES]);
        let strategy = ByoYomi::new(0.0);

        assert!(matches!(strategy.try_extend(&root), TimeStrategyResult::Expired));
    }

    #[test]
    fn a_generous_budget_has_not_expired_yet() {
        let root = Node::new(dg_go::Board::new(7.5), 0.0, vec![0.0; NUM_MOVES]);
        let strategy = ByoYomi::new(60.0);

        assert!(matches!(strategy.try_extend(&root), TimeStrategyResult::NotExpired(_)));
    }

    #[test]
    fn later_moves_get_a_smaller_share_of_the_clock() {
        let early = ByoYomi::for_move(100.0, 0, 0.98);
        let late = ByoYomi::for_move(100.0, 200, 0.98);

        assert!(early.budget > late.budget);
    }
}
