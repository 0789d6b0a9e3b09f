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

mod byo_yomi;
mod rollout_limit;

pub use self::byo_yomi::ByoYomi;
pub use self::rollout_limit::RolloutLimit;

use crate::tree::Node;
use dg_go::point::NUM_MOVES;

pub enum TimeStrategyResult {
    NotExpired(usize),
    NotExtended,
    Expired,
    Extended
}

pub trait TimeStrategy: Sync + Send {
    /// Checks whether this time period has expired, and if not how many
    /// readouts remain in the current budget.
    fn try_extend(&self, root: &Node) -> TimeStrategyResult;
}

/// The minimum number of additional playouts necessary for the second most
/// visited child to overtake the most visited one.
fn min_promote_rollouts(root: &Node) -> usize {
    let mut top_1 = 0;
    let mut top_2 = 1;

    for a in 0..NUM_MOVES {
        if root.count[a] > root.count[top_1] {
            top_2 = top_1;
            top_1 = a;
        } else if a != top_1 && root.count[a] > root.count[top_2] {
            top_2 = a;
        }
    }

    let (count_1, count_2) = (root.count[top_1], root.count[top_2]);

    if count_1 > count_2 {
        (count_1 - count_2) as usize
    } else {
        0 // ignore the race condition
    }
}

/// Implements the `UNST-N` / `EARLY-C` time management scheme of Baier and
/// Winands, "Time Management for Monte-Carlo Tree Search in Go": extend the
/// search until the most visited child also has the highest win rate
/// (`NotExpired`), but cut it short if the runner-up cannot catch up to the
/// leader within the remaining budget.
pub fn is_done(root: &Node, strategy: &dyn TimeStrategy) -> bool {
    if root.total_count == 0 {
        false
    } else {
        match strategy.try_extend(root) {
            TimeStrategyResult::NotExpired(remaining) => min_promote_rollouts(root) > remaining,
            TimeStrategyResult::Extended => false,
            _ => true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_fresh_root_is_never_done() {
        let root = Node::new(dg_go::Board::new(7.5), 0.0, vec![0.0; NUM_MOVES]);
        let strategy = RolloutLimit::new(100);

        assert!(!is_done(&root, &strategy));
    }
}
