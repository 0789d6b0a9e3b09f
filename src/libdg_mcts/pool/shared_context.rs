// Copyright 2021 Karl Sundequist Blomdahl <karl.sundequist.blomdahl@gmail.com>
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

use crate::cache::InferenceCache;
use crate::options::SearchOptions;
use crate::predictor::Predictor;
use crate::time_control::TimeStrategy;
use crate::tree;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::Mutex;

/// State shared by every worker thread in a `Pool`: the predictor and cache
/// they all submit requests through, and whether the pool is still alive.
pub struct SharedContext {
    pub predictor: Box<dyn Predictor + Sync>,
    pub cache: InferenceCache,
    pub is_running: AtomicBool,
    pub num_running: AtomicUsize
}

impl SharedContext {
    pub fn new(predictor: Box<dyn Predictor + Sync>, cache: InferenceCache) -> Self {
        Self { predictor, cache, is_running: AtomicBool::new(true), num_running: AtomicUsize::new(0) }
    }
}

/// One enqueued search: the tree being grown (behind its own mutex, per §5
/// -- only one worker touches a given tree's edges at a time, but different
/// searches are probed concurrently by different workers), its options and
/// time budget, and the channel a finished search reports its result on.
///
/// Unlike the pointer the original pool design passed around, the tree here
/// is reference-counted and mutex-guarded so a `Worker` can hold a handle to
/// it without violating the aliasing rules: only one worker's lock guard is
/// ever live for a given tree at a time, which is exactly the single-mutex
/// model the search semantics require.
pub struct SearchContext {
    pub id: usize,
    pub tree: Mutex<tree::Node>,
    pub options: Box<dyn SearchOptions + Sync>,
    pub time_strategy: Box<dyn TimeStrategy + Sync>,
    pub done: Sender<()>
}

impl SearchContext {
    pub fn new(
        id: usize,
        tree: tree::Node,
        options: Box<dyn SearchOptions + Sync>,
        time_strategy: Box<dyn TimeStrategy + Sync>,
        done: Sender<()>
    ) -> Self {
        Self { id, tree: Mutex::new(tree), options, time_strategy, done }
    }

    /// Whether this search's time budget has been exhausted. Takes the tree
    /// lock only for the duration of the check.
    pub fn is_done(&self) -> bool {
        let root = self.tree.lock().expect("tree lock poisoned");

        crate::time_control::is_done(&root, self.time_strategy.as_ref())
    }
}
