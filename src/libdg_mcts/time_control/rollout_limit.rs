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
// The simplest time strategy: search exactly `num_readouts` times and stop,
// never extending. Used whenever `seconds_per_move` and `time_limit` are
// both unset.

use super::{TimeStrategy, TimeStrategyResult};
use crate::tree::Node;

pub struct RolloutLimit {
    num_readouts: usize
}

impl RolloutLimit {
    pub fn new(num_readouts: usize) -> Self {
        Self { num_readouts }
    }
}

impl TimeStrategy for RolloutLimit {
    fn try_extend(&self, root: &Node) -> TimeStrategyResult {
        let remaining = self.num_readouts.saturating_sub(root.total_count);

        if remaining > 0 {
            TimeStrategyResult::NotExpired(remaining)
        } else {
            TimeStrategyResult::Expired
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_go::point::NUM_MOVES;

    #[test]
    fn reports_remaining_readouts() {
        let mut root = Node::new(dg_go::Board::new(7.5), 0.0, vec![0.0; NUM_MOVES]);
        root.total_count = 10;

        let strategy = RolloutLimit::new(100);
        match strategy.try_extend(&root) {
            TimeStrategyResult::NotExpired(remaining) => assert_eq!(remaining, 90),
            _ => panic!("expected NotExpired")
        }
    }

    #[test]
    fn expires_once_the_budget_is_exhausted() {
        let mut root = Node::new(dg_go::Board::new(7.5), 0.0, vec![0.0; NUM_MOVES]);
        root.total_count = 100;

        let strategy = RolloutLimit::new(100);
        assert!(matches!(strategy.try_extend(&root), TimeStrategyResult::Expired));
    }
}
