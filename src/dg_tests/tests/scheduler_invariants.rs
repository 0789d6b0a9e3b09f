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
// End-to-end scheduler scenario: six parallel games sharing one model with
// a buffer factor of two must see their leaf requests coalesced into
// exactly three batches of two, never six singletons.

use dg_go::point::NUM_MOVES;
use dg_go::Board;
use dg_mcts::options::StandardSearch;
use dg_mcts::scheduler::BatchingFactory;
use dg_mcts::tree::Node;
use dg_nn::{FeatureLayout, Model, ModelInput, ModelOutput, RandomModel};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

/// Wraps `RandomModel` to record the size of every batch `run_many` is
/// called with, and fixes the buffer count the scheduler reads as `B`.
struct CountingModel {
    inner: RandomModel,
    buffer_count: usize,
    batch_sizes: Mutex<Vec<usize>>
}

impl CountingModel {
    fn new(buffer_count: usize) -> Self {
        Self { inner: RandomModel::new(1), buffer_count, batch_sizes: Mutex::new(Vec::new()) }
    }
}

impl Model for CountingModel {
    fn name(&self) -> &str {
        "counting:1"
    }

    fn feature_layout(&self) -> FeatureLayout {
        FeatureLayout::Nhwc
    }

    fn buffer_count(&self) -> usize {
        self.buffer_count
    }

    fn run_many(&self, inputs: &[ModelInput]) -> Result<Vec<ModelOutput>, dg_nn::NnError> {
        self.batch_sizes.lock().expect("lock poisoned").push(inputs.len());
        self.inner.run_many(inputs)
    }
}

#[test]
fn six_games_with_buffer_factor_two_dispatch_in_three_batches_of_two() {
    let model = Arc::new(CountingModel::new(2));
    let factory = BatchingFactory::new();

    let facades: Vec<_> = (0..6).map(|_| factory.acquire(Arc::clone(&model) as Arc<dyn Model>)).collect();

    let barrier = Arc::new(Barrier::new(6));
    let handles: Vec<_> = facades
        .iter()
        .map(|facade| {
            let facade = Arc::clone(facade);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                facade.run_many(vec![ModelInput::new(vec![])]).expect("inference failed")
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("game thread panicked");
    }

    for facade in &facades {
        factory.release(facade);
    }

    let batch_sizes = model.batch_sizes.lock().expect("lock poisoned").clone();
    let total: usize = batch_sizes.iter().sum();

    assert_eq!(total, 6, "every request must eventually be served");
    assert_eq!(batch_sizes, vec![2, 2, 2], "six requests at buffer factor 2 must form exactly three pairs");
}

/// Every leaf `select_leaf` hands out is balanced by exactly one
/// `add_virtual_loss` / `revert_virtual_loss` pair over the course of a
/// `TreeSearch` batch, so the root's `vtotal_count` must be back at zero
/// once the batch has been fully backed up, win or lose.
#[test]
fn tree_search_leaves_no_virtual_loss_behind_after_a_batch() {
    let model: Arc<dyn Model> = Arc::new(RandomModel::new(7));
    let factory = BatchingFactory::new();
    let predictor = factory.acquire(Arc::clone(&model));
    let cache = dg_mcts::cache::InferenceCache::with_capacity_mb(1, NUM_MOVES);

    let board = Board::new(7.5);
    let uniform = vec![1.0 / (NUM_MOVES as f32); NUM_MOVES];
    let root = Node::new(board, 0.0, uniform);
    let tree = std::sync::Mutex::new(root);
    let options = StandardSearch::new();

    for _ in 0..4 {
        dg_mcts::player::tree_search(&tree, predictor.as_ref(), &cache, &options, 8).expect("search failed");
    }

    let root = tree.into_inner().expect("tree lock poisoned");
    assert_eq!(root.vtotal_count, 0, "virtual loss must be fully reverted between batches");

    factory.release(&predictor);
}
