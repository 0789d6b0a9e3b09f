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
// The Monte Carlo search tree. A node owns its children exclusively -- there
// are no cross-links and no shared ownership -- so pruning a subtree is just
// dropping a `Box`. Concurrent access is the caller's responsibility: the
// player holds a single mutex over the whole tree for the duration of
// `select_leaf` / `add_virtual_loss` and of `incorporate_results` /
// `revert_virtual_loss`; only the network inference in between runs without
// the lock held (§5).

use crate::dirichlet;
use dg_go::point::NUM_MOVES;
use dg_go::{Board, Color};
use dg_utils::config;
use rand::Rng;

/// A path from the root to a leaf, as a sequence of child indices.
pub type Path = Vec<usize>;

/// What `select_leaf` found at the end of its descent.
pub enum SelectResult {
    /// The path ends at an edge with no child yet -- the caller must expand
    /// it, either via the network (non-terminal) or directly (two passes /
    /// max depth).
    Unexpanded(Path),

    /// The path ends at an edge whose child already exists and is terminal;
    /// its value is already known and can be backed up without a network
    /// round-trip.
    AlreadyTerminal(Path, f32)
}

pub struct Node {
    pub to_move: Color,

    /// The position this node represents, history and all -- `Board`
    /// already carries its own ply history, so no parent chain needs to be
    /// replayed to build features or to play a further move from here.
    pub board: Board,

    /// This position's own value estimate, from `to_move`'s perspective.
    /// Used as the basis for the "first play urgency" reduction applied to
    /// children that have not been visited yet.
    pub initial_value: f32,

    /// `P[a]`, the prior probability of each of the `NUM_MOVES` actions.
    /// Illegal actions carry `f32::NEG_INFINITY` and are never selected.
    pub prior: Vec<f32>,

    /// `N[a]`, the visit count of each action.
    pub count: Vec<i32>,

    /// `W[a]`, the summed backed-up value of each action.
    pub value: Vec<f32>,

    /// `VL[a]`, the virtual loss currently applied to each action.
    pub vloss: Vec<i32>,

    pub children: Vec<Option<Box<Node>>>,

    /// `true` for a terminal position (two passes, or a max-depth cutoff);
    /// such a node has no prior and is never selected past.
    pub game_over: bool,

    /// Set once root Dirichlet noise has been mixed in, so a second call
    /// from a confused caller is at least detectable.
    pub injected_noise: bool,

    /// `ΣN[a]` over all actions, the `ΣN` term of the PUCT formula.
    pub total_count: usize,

    /// `ΣVL[a]` over all actions; tracked separately so the virtual-loss
    /// conservation invariant (§8) can be checked directly.
    pub vtotal_count: usize
}

impl Node {
    /// Constructs a freshly expanded, non-terminal node: `value` is the
    /// network's value output and `prior` its (already legality-masked,
    /// normalized) policy output, both from `board.to_play()`'s perspective.
    pub fn new(board: Board, value: f32, prior: Vec<f32>) -> Self {
        debug_assert_eq!(prior.len(), NUM_MOVES);

        Self {
            to_move: board.to_play(),
            board,
            initial_value: value,
            prior,
            count: vec![0; NUM_MOVES],
            value: vec![0.0; NUM_MOVES],
            vloss: vec![0; NUM_MOVES],
            children: (0..NUM_MOVES).map(|_| None).collect(),
            game_over: false,
            injected_noise: false,
            total_count: 0,
            vtotal_count: 0
        }
    }

    /// Constructs a terminal node: `value` is the known end-of-game result
    /// (`±1`, from `board.to_play()`'s perspective), computed directly from
    /// the scoring function without a network evaluation.
    pub fn new_terminal(board: Board, value: f32) -> Self {
        Self {
            to_move: board.to_play(),
            board,
            initial_value: value,
            prior: vec![f32::NEG_INFINITY; NUM_MOVES],
            count: vec![0; NUM_MOVES],
            value: vec![0.0; NUM_MOVES],
            vloss: vec![0; NUM_MOVES],
            children: (0..NUM_MOVES).map(|_| None).collect(),
            game_over: true,
            injected_noise: false,
            total_count: 0,
            vtotal_count: 0
        }
    }

    /// Walks to the node just before the end of `path` and returns it along
    /// with the final action, so the caller can compute the leaf's board
    /// (`parent.board.play(parent.to_move, ...)`) before the leaf node
    /// itself exists.
    pub fn leaf_parent(&self, path: &[usize]) -> (&Node, usize) {
        if path.len() == 1 {
            (self, path[0])
        } else {
            self.children[path[0]]
                .as_ref()
                .expect("intermediate path node must exist")
                .leaf_parent(&path[1..])
        }
    }

    /// Forces an action out of consideration, as if its prior were illegal.
    /// Used by tests to exercise the "no legal moves" fallback.
    pub fn disqualify(&mut self, a: usize) {
        self.prior[a] = f32::NEG_INFINITY;
    }

    fn is_legal(&self, a: usize) -> bool {
        self.prior[a].is_finite()
    }

    fn fpu(&self) -> f32 {
        (self.initial_value - *config::VALUE_INIT_PENALTY * self.to_move.sign()).clamp(-1.0, 1.0)
    }

    fn q(&self, a: usize) -> f32 {
        let n = self.count[a] as f32;
        let vl = self.vloss[a] as f32;

        if n + vl > 0.0 {
            (self.value[a] - vl) / (n + vl).max(1.0)
        } else {
            self.fpu()
        }
    }

    /// Picks the action maximizing PUCT, ties broken toward the lowest
    /// index since ties are resolved by the first `>` comparison to win.
    fn select_action(&self) -> usize {
        let c_puct = *config::C_PUCT;
        let sqrt_total = (self.total_count as f32).max(1.0).sqrt();

        let mut best_a = 0;
        let mut best_u = f32::NEG_INFINITY;

        for a in 0..NUM_MOVES {
            if !self.is_legal(a) {
                continue;
            }

            let n = self.count[a] as f32;
            let vl = self.vloss[a] as f32;
            let u = self.q(a) + c_puct * self.prior[a] * sqrt_total / (1.0 + n + vl);

            if u > best_u {
                best_u = u;
                best_a = a;
            }
        }

        best_a
    }

    /// Descends from this node picking the PUCT-best action at each level,
    /// stopping at the first edge with no materialized child. Read-only:
    /// does not touch virtual loss, so that it may be called repeatedly
    /// while deciding how many leaves to gather for one batch.
    pub fn select_leaf(&self) -> SelectResult {
        let mut path = Vec::new();
        let mut node = self;

        loop {
            let a = node.select_action();
            path.push(a);

            match &node.children[a] {
                None => return SelectResult::Unexpanded(path),
                Some(child) if child.game_over => {
                    let value = child.initial_value;
                    return SelectResult::AlreadyTerminal(path, value);
                }
                Some(child) => node = child
            }
        }
    }

    /// Increments `VL` by one on every edge along `path`.
    pub fn add_virtual_loss(&mut self, path: &[usize]) {
        let a = path[0];
        self.vloss[a] += 1;
        self.vtotal_count += 1;

        if path.len() > 1 {
            self.children[a]
                .as_mut()
                .expect("virtual loss path must reference an existing child")
                .add_virtual_loss(&path[1..]);
        }
    }

    /// The exact inverse of `add_virtual_loss`.
    pub fn revert_virtual_loss(&mut self, path: &[usize]) {
        let a = path[0];
        self.vloss[a] -= 1;
        self.vtotal_count -= 1;

        if path.len() > 1 {
            self.children[a]
                .as_mut()
                .expect("virtual loss path must reference an existing child")
                .revert_virtual_loss(&path[1..]);
        }
    }

    fn materialize_leaf(&mut self, path: &[usize], leaf: Node) {
        let a = path[0];

        if path.len() == 1 {
            if self.children[a].is_none() {
                self.children[a] = Some(Box::new(leaf));
            }
        } else {
            self.children[a]
                .as_mut()
                .expect("intermediate path node must exist")
                .materialize_leaf(&path[1..], leaf);
        }
    }

    fn backup(&mut self, path: &[usize], value_here: f32) {
        let a = path[0];
        self.count[a] += 1;
        self.value[a] += value_here;
        self.total_count += 1;

        if path.len() > 1 {
            self.children[a]
                .as_mut()
                .expect("backup path must reference an existing child")
                .backup(&path[1..], -value_here);
        }
    }

    /// Installs the network's output as a new child at the end of `path`,
    /// then backs up `value` (from the new leaf's own `to_move` perspective)
    /// along the whole path with sign alternation.
    pub fn incorporate_results(&mut self, path: &Path, leaf_board: Board, policy: Vec<f32>, value: f32) {
        self.materialize_leaf(path, Node::new(leaf_board, value, policy));

        let root_value = if path.len() % 2 == 0 { value } else { -value };
        self.backup(path, root_value);
    }

    /// Backs up a known terminal result without installing a new child
    /// (the terminal node already exists, `materialize_leaf` is a no-op
    /// when the child is `Some`).
    pub fn incorporate_end_game_result(&mut self, path: &Path, leaf_board: Board, value: f32) {
        self.materialize_leaf(path, Node::new_terminal(leaf_board, value));

        let root_value = if path.len() % 2 == 0 { value } else { -value };
        self.backup(path, root_value);
    }

    /// Re-backs-up an `AlreadyTerminal` result: the child exists, so only
    /// the statistics update is needed.
    pub fn backup_known_terminal(&mut self, path: &Path, value: f32) {
        let root_value = if path.len() % 2 == 0 { value } else { -value };
        self.backup(path, root_value);
    }

    /// Mixes `(1 - fraction) * P + fraction * Dir(alpha)` into the prior of
    /// every legal action. Root-only; requires the node to already be
    /// expanded (i.e. constructed via `new`, not `new_terminal`).
    pub fn inject_dirichlet_noise(&mut self, alpha: f32, fraction: f32) {
        let legal: Vec<usize> = (0..NUM_MOVES).filter(|&a| self.is_legal(a)).collect();

        if legal.is_empty() {
            return;
        }

        let noise = dirichlet::sample(alpha, legal.len());

        for (i, &a) in legal.iter().enumerate() {
            self.prior[a] = (1.0 - fraction) * self.prior[a] + fraction * noise[i];
        }

        self.injected_noise = true;
    }

    /// Picks the final move: argmax over `child_N` (including Pass) when
    /// `temperature <= 0.0`, otherwise a temperature-weighted sample over
    /// board points only (§4.5 -- Pass is never sampled in this phase).
    /// Returns `(q_of_chosen_action, action_index)`.
    pub fn best(&self, temperature: f32) -> (f32, usize) {
        if temperature > 0.0 {
            self.soft_pick(temperature)
        } else {
            self.argmax_pick()
        }
    }

    fn argmax_pick(&self) -> (f32, usize) {
        let mut best_a = NUM_MOVES - 1; // defaults to Pass if nothing is legal
        let mut best_n = -1i64;
        let mut best_q = f32::NEG_INFINITY;

        for a in 0..NUM_MOVES {
            if !self.is_legal(a) {
                continue;
            }

            let n = self.count[a] as i64;

            if n > best_n {
                best_n = n;
                best_a = a;
                best_q = self.q(a);
            }
        }

        (best_q, best_a)
    }

    fn soft_pick(&self, temperature: f32) -> (f32, usize) {
        let num_points = NUM_MOVES - 1;
        let weights: Vec<f32> = (0..num_points)
            .map(|a| {
                if self.is_legal(a) {
                    (self.count[a] as f32).powf(1.0 / temperature)
                } else {
                    0.0
                }
            })
            .collect();
        let total: f32 = weights.iter().sum();

        if total <= 0.0 {
            return self.argmax_pick();
        }

        let mut r = rand::thread_rng().gen::<f32>() * total;

        for (a, &w) in weights.iter().enumerate() {
            if r < w {
                return (self.q(a), a);
            }
            r -= w;
        }

        (self.q(num_points - 1), num_points - 1)
    }

    /// Consumes `self`, returning the subtree rooted at the child for
    /// `action` with all of its siblings dropped. `None` if tree reuse is
    /// disabled or the child was never expanded, in which case the caller
    /// must start a fresh root.
    pub fn prune_to_child(self, action: usize) -> Option<Node> {
        let mut children = self.children;

        children[action].take().map(|boxed| *boxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_prior() -> Vec<f32> {
        vec![1.0 / (NUM_MOVES as f32); NUM_MOVES]
    }

    fn child_board(root: &Node, path: &[usize]) -> Board {
        let (parent, a) = root.leaf_parent(path);
        let coord = dg_go::point::Coord::from_policy_index(a);

        parent.board.play(parent.to_move, coord).expect("legal by construction")
    }

    #[test]
    fn select_leaf_on_a_fresh_node_returns_a_single_action_path() {
        let root = Node::new(Board::new(7.5), 0.0, uniform_prior());

        match root.select_leaf() {
            SelectResult::Unexpanded(path) => assert_eq!(path.len(), 1),
            SelectResult::AlreadyTerminal(..) => panic!("fresh node has no children")
        }
    }

    #[test]
    fn incorporate_results_updates_edge_statistics_with_sign_alternation() {
        let mut root = Node::new(Board::new(7.5), 0.0, uniform_prior());
        let path = match root.select_leaf() {
            SelectResult::Unexpanded(path) => path,
            _ => unreachable!()
        };
        let leaf_board = child_board(&root, &path);

        root.add_virtual_loss(&path);
        root.incorporate_results(&path, leaf_board, uniform_prior(), 0.6);
        root.revert_virtual_loss(&path);

        let a = path[0];
        assert_eq!(root.count[a], 1);
        // one edge separates root (Black) from the leaf (White): the value
        // backed up into root's own edge is negated.
        assert!((root.value[a] - (-0.6)).abs() < 1e-6);
        assert_eq!(root.vloss[a], 0);
        assert_eq!(root.vtotal_count, 0);
    }

    #[test]
    fn virtual_loss_is_visible_to_select_action_before_backup() {
        let root = Node::new(Board::new(7.5), 0.0, uniform_prior());
        let path = match root.select_leaf() {
            SelectResult::Unexpanded(path) => path,
            _ => unreachable!()
        };

        let mut root = root;
        root.add_virtual_loss(&path);
        assert_eq!(root.vloss[path[0]], 1);
        assert_eq!(root.vtotal_count, 1);

        root.revert_virtual_loss(&path);
        assert_eq!(root.vloss[path[0]], 0);
    }

    #[test]
    fn no_allowed_moves_falls_back_to_pass() {
        let mut root = Node::new(Board::new(7.5), 0.0, uniform_prior());

        for a in 0..NUM_MOVES {
            root.disqualify(a);
        }

        assert_eq!(root.best(0.0), (f32::NEG_INFINITY, NUM_MOVES - 1));
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        let mut root = Node::new(Board::new(7.5), 0.0, uniform_prior());
        root.count[5] = 10;
        root.count[7] = 10;

        let (_, a) = root.best(0.0);
        assert_eq!(a, 5);
    }

    #[test]
    fn dirichlet_noise_only_perturbs_legal_actions_and_preserves_illegal_mask() {
        let mut prior = vec![f32::NEG_INFINITY; NUM_MOVES];
        prior[0] = 0.5;
        prior[1] = 0.5;

        let mut root = Node::new(Board::new(7.5), 0.0, prior);
        root.inject_dirichlet_noise(0.03, 0.25);

        assert!(root.injected_noise);
        assert!(root.prior[0].is_finite());
        assert!(root.prior[1].is_finite());
        assert!(root.prior[2].is_infinite());
    }

    #[test]
    fn prune_to_child_keeps_only_the_chosen_subtree() {
        let mut root = Node::new(Board::new(7.5), 0.0, uniform_prior());
        let path = match root.select_leaf() {
            SelectResult::Unexpanded(path) => path,
            _ => unreachable!()
        };
        let a = path[0];
        let leaf_board = child_board(&root, &path);

        root.add_virtual_loss(&path);
        root.incorporate_results(&path, leaf_board, uniform_prior(), 0.0);
        root.revert_virtual_loss(&path);

        let child = root.prune_to_child(a).expect("child was expanded");
        assert_eq!(child.to_move, Color::White);
    }
}
