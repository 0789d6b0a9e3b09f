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
// Ties the tree, the cache, and a predictor together into one game's worth
// of search: expand the root, run `TreeSearch` until the time strategy says
// stop, then pick a move and play it.

use crate::cache::{self, InferenceCache};
use crate::error::EngineError;
use crate::game_result::GameResult;
use crate::options::SearchOptions;
use crate::predictor::Predictor;
use crate::time_control::{self, TimeStrategy};
use crate::tree::{Node, SelectResult};
use dg_go::point::{Coord, Point, NUM_MOVES, NUM_POINTS};
use dg_go::utils::features::{Features, HWC};
use dg_go::utils::symmetry::{self, Transform};
use dg_go::{Board, Color};
use dg_nn::{ModelInput, ModelOutput};
use dg_utils::config;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Evaluates `board` through `predictor`, going through `cache` first.
/// Returns the policy masked to legal moves and renormalized, and the value,
/// both from `board.to_play()`'s perspective in the board's own (untouched)
/// orientation -- the symmetry used for the actual network call, if any, is
/// applied and inverted internally.
fn evaluate(
    board: &Board,
    predictor: &dyn Predictor,
    cache: &InferenceCache,
    options: &dyn SearchOptions
) -> Result<(f32, Vec<f32>), EngineError> {
    let to_move = board.to_play();
    let sym = if *config::RANDOM_SYMMETRY && !options.deterministic() {
        *symmetry::ALL.choose(&mut rand::thread_rng()).expect("ALL is non-empty")
    } else {
        Transform::Identity
    };

    let features = board.get_features::<HWC, _>(to_move, sym);
    let fp = cache::fingerprint(predictor.name(), &features);

    let (raw_policy, value) = match cache.lookup(fp) {
        Some(hit) => hit,
        None => {
            let input = ModelInput::new(features);
            let mut outputs = predictor.run_many(vec![input])?;
            let ModelOutput { policy, value } = outputs.pop().expect("run_many returns one output per input");

            cache.insert(fp, policy.clone(), value);
            (policy, value)
        }
    };

    let policy = symmetry::apply_inverse_to_policy(sym, &raw_policy);
    let policy = mask_and_normalize(board, to_move, policy, options);

    Ok((value, policy))
}

/// Zeroes out every action the policy checker rejects and renormalizes what
/// remains, falling back to a uniform distribution over whatever survived if
/// the network assigned the entire mass to moves that are not candidates.
fn mask_and_normalize(board: &Board, to_move: Color, mut policy: Vec<f32>, options: &dyn SearchOptions) -> Vec<f32> {
    debug_assert_eq!(policy.len(), NUM_MOVES);

    let checker = options.policy_checker(board, to_move);
    let mut candidate = [false; NUM_MOVES];

    for point in Point::all() {
        let coord = Coord::Point(point);
        candidate[point.to_packed_index()] = checker.is_policy_candidate(board, coord);
    }
    candidate[NUM_POINTS] = checker.is_policy_candidate(board, Coord::Pass);

    for a in 0..NUM_MOVES {
        if !candidate[a] {
            policy[a] = f32::NEG_INFINITY;
        }
    }

    let total: f32 = (0..NUM_MOVES).filter(|&a| candidate[a]).map(|a| policy[a].max(0.0)).sum();

    if total > 0.0 {
        for a in 0..NUM_MOVES {
            if candidate[a] {
                policy[a] = policy[a].max(0.0) / total;
            }
        }
    } else {
        let n = candidate.iter().filter(|&&c| c).count().max(1) as f32;
        for a in 0..NUM_MOVES {
            policy[a] = if candidate[a] { 1.0 / n } else { f32::NEG_INFINITY };
        }
    }

    policy
}

/// Runs up to `batch_size` simultaneous descents of `tree` (locking it only
/// for the selection and backup halves of each), queries `predictor` for
/// whichever of them were not already terminal, and incorporates every
/// result. This is the `TreeSearch(batch_size)` operation (§4, §5): the lock
/// over `tree` is never held across the `evaluate` call.
pub fn tree_search(
    tree: &std::sync::Mutex<Node>,
    predictor: &dyn Predictor,
    cache: &InferenceCache,
    options: &dyn SearchOptions,
    batch_size: usize
) -> Result<(), EngineError> {
    let mut unexpanded = Vec::with_capacity(batch_size);

    {
        let mut root = tree.lock().expect("tree lock poisoned");

        for _ in 0..batch_size.max(1) {
            match root.select_leaf() {
                SelectResult::Unexpanded(path) => {
                    let (parent, a) = root.leaf_parent(&path);
                    let coord = Coord::from_policy_index(a);
                    let leaf_board = match parent.board.play(parent.to_move, coord) {
                        Ok(board) => board,
                        Err(e) => return Err(EngineError::from(e))
                    };

                    root.add_virtual_loss(&path);
                    unexpanded.push((path, leaf_board));
                }
                SelectResult::AlreadyTerminal(path, value) => {
                    root.backup_known_terminal(&path, value);
                }
            }
        }
    }

    for (path, leaf_board) in unexpanded {
        let result = if leaf_board.is_game_over() {
            let value = GameResult::from_score(&leaf_board).winner().sign() * leaf_board.to_play().sign();
            Ok((value, None))
        } else {
            evaluate(&leaf_board, predictor, cache, options).map(|(value, policy)| (value, Some(policy)))
        };

        let mut root = tree.lock().expect("tree lock poisoned");
        root.revert_virtual_loss(&path);

        match result {
            Ok((value, Some(policy))) => root.incorporate_results(&path, leaf_board, policy, value),
            Ok((value, None)) => root.incorporate_end_game_result(&path, leaf_board, value),
            Err(e) => return Err(e)
        }
    }

    Ok(())
}

/// One game's worth of search state: the current tree (or none, before the
/// very first expansion) and everything needed to grow it further.
pub struct Player {
    root: Option<Node>,
    board: Board,
    predictor: Arc<dyn Predictor>,
    cache: Arc<InferenceCache>,
    options: Box<dyn SearchOptions>,
    move_number: usize
}

impl Player {
    pub fn new(
        board: Board,
        predictor: Arc<dyn Predictor>,
        cache: Arc<InferenceCache>,
        options: Box<dyn SearchOptions>
    ) -> Self {
        Self { root: None, board, predictor, cache, options, move_number: 0 }
    }

    /// Expands the root if it has not been evaluated yet, and mixes in
    /// Dirichlet noise on top of it unless the search is deterministic.
    fn ensure_root(&mut self) -> Result<(), EngineError> {
        if self.root.is_none() {
            let (value, policy) = evaluate(&self.board, &*self.predictor, &self.cache, &*self.options)?;
            let mut root = Node::new(self.board.clone(), value, policy);

            if *config::INJECT_NOISE && !self.options.deterministic() {
                root.inject_dirichlet_noise(0.03, 0.25);
            }

            self.root = Some(root);
        }

        Ok(())
    }

    /// Grows the tree until `time_strategy` says the search is done, then
    /// picks a move via `Node::best` (soft-pick below the temperature cutoff,
    /// argmax above it, per §4.5) without playing it.
    pub fn suggest_move(&mut self, time_strategy: &dyn TimeStrategy) -> Result<(f32, Coord), EngineError> {
        self.ensure_root()?;

        let batch_size = *config::BATCH_SIZE;
        let temperature_cutoff = ((dg_go::point::N * dg_go::point::N) / 12) as usize;
        let temperature = if *config::SOFT_PICK && self.move_number < temperature_cutoff {
            *config::TEMPERATURE
        } else {
            0.0
        };

        loop {
            {
                let root = self.root.as_ref().expect("ensure_root just populated it");
                if time_control::is_done(root, time_strategy) {
                    break;
                }
            }

            let root = self.root.take().expect("ensure_root just populated it");
            let tree = std::sync::Mutex::new(root);
            tree_search(&tree, &*self.predictor, &self.cache, &*self.options, batch_size)?;
            self.root = Some(tree.into_inner().expect("lock not poisoned"));
        }

        let root = self.root.as_ref().expect("ensure_root just populated it");
        let (q, a) = root.best(temperature);

        if q < *config::RESIGN_THRESHOLD {
            debug!("resigning at move {} with q = {:.3}", self.move_number, q);
            Ok((q, Coord::Resign))
        } else {
            Ok((q, Coord::from_policy_index(a)))
        }
    }

    /// Plays `coord`, pruning the tree down to the corresponding child when
    /// tree reuse is enabled, and returns the finished game's result once
    /// two passes (or a resignation) end it.
    pub fn play_move(&mut self, coord: Coord) -> Result<Option<GameResult>, EngineError> {
        if let Coord::Resign = coord {
            let resigning = self.board.to_play();
            return Ok(Some(GameResult::from_resignation(resigning)));
        }

        let next_board = self.board.play(self.board.to_play(), coord)?;
        let a = coord.to_policy_index().unwrap_or(NUM_POINTS);

        self.root = if *config::TREE_REUSE {
            self.root.take().and_then(|root| root.prune_to_child(a))
        } else {
            None
        };
        self.board = next_board;
        self.move_number += 1;

        if self.board.is_game_over() {
            Ok(Some(GameResult::from_score(&self.board)))
        } else {
            Ok(None)
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }
}
