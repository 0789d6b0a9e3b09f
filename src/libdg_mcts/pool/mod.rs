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
//
// A small fixed pool of OS threads that multiplexes many simultaneous
// searches (self-play games, typically) through one shared predictor and
// cache, so that a handful of worker threads is enough to keep a batching
// backend fed regardless of how many games are in flight. `enqueue` is the
// `TreeSearch`-until-done operation (§4, §5): it blocks the caller until the
// search's own time strategy says it is finished, then hands the grown
// tree back.

mod shared_context;
mod worker;

use self::shared_context::{SearchContext, SharedContext};
use self::worker::Worker;
use crate::cache::InferenceCache;
use crate::options::SearchOptions;
use crate::predictor::Predictor;
use crate::time_control::TimeStrategy;
use crate::tree;
use crossbeam_channel;
use crossbeam_utils::Backoff;
use dg_utils::config;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, RwLock};
use std::thread::{self, JoinHandle};

#[derive(Clone)]
pub struct Pool {
    shared_context: Arc<SharedContext>,
    searches_count: Arc<AtomicUsize>,
    searches: Arc<RwLock<Vec<Arc<SearchContext>>>>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    capacity: usize
}

impl Pool {
    pub fn new(predictor: Box<dyn Predictor + Sync>, cache: InferenceCache) -> Self {
        Self::with_capacity(predictor, cache, *config::NUM_THREADS)
    }

    pub fn with_capacity(predictor: Box<dyn Predictor + Sync>, cache: InferenceCache, capacity: usize) -> Self {
        let out = Self {
            shared_context: Arc::new(SharedContext::new(predictor, cache)),
            searches_count: Arc::new(AtomicUsize::new(0)),
            searches: Arc::new(RwLock::new(Vec::with_capacity(8))),
            handles: Arc::new(Mutex::new(Vec::with_capacity(64))),
            capacity
        };

        out.ensure_threads();
        out
    }

    fn ensure_threads(&self) {
        let shared_context = self.shared_context.as_ref();
        let mut handles = self.handles.lock().expect("handles lock poisoned");

        while shared_context.is_running.load(Ordering::Acquire) && shared_context.num_running.load(Ordering::Acquire) < self.capacity {
            let has_started_leader = Arc::new(Barrier::new(2));
            let has_started = Arc::clone(&has_started_leader);
            let shared_context = Arc::clone(&self.shared_context);
            let searches = Arc::clone(&self.searches);

            handles.push(thread::spawn(move || Worker::new(shared_context, has_started).run(searches)));
            has_started_leader.wait();
        }
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.shared_context.predictor.as_ref()
    }

    pub fn cache(&self) -> &InferenceCache {
        &self.shared_context.cache
    }

    /// Enqueues `root` to be probed by the worker pool until `time_strategy`
    /// reports the search is done, then returns the grown tree. Blocks the
    /// calling thread for the whole search; the actual probing happens on
    /// whichever worker threads pick this search up.
    pub fn enqueue(
        &self,
        root: tree::Node,
        options: Box<dyn SearchOptions + Sync>,
        time_strategy: Box<dyn TimeStrategy + Sync>
    ) -> tree::Node {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let next_id = self.searches_count.fetch_add(1, Ordering::AcqRel);
        let search_context = Arc::new(SearchContext::new(next_id, root, options, time_strategy, tx));

        self.searches
            .write()
            .expect("searches lock poisoned")
            .push(Arc::clone(&search_context));
        self.ensure_threads();

        let _ = rx.recv();
        drop(rx);

        let backoff = Backoff::new();
        while Arc::strong_count(&search_context) > 1 {
            backoff.snooze();
        }

        Arc::try_unwrap(search_context)
            .unwrap_or_else(|_| unreachable!("strong count was just observed to be 1"))
            .tree
            .into_inner()
            .expect("tree lock poisoned")
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shared_context.is_running.store(false, Ordering::Release);

        for handle in self.handles.lock().expect("handles lock poisoned").drain(..) {
            handle.join().expect("worker thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::StandardSearch;
    use crate::time_control::RolloutLimit;
    use dg_go::point::NUM_MOVES;
    use dg_go::Board;
    use dg_nn::RandomModel;

    struct InlinePredictor {
        model: RandomModel
    }

    impl Predictor for InlinePredictor {
        fn name(&self) -> &str {
            self.model.name()
        }

        fn run_many(&self, inputs: Vec<dg_nn::ModelInput>) -> Result<Vec<dg_nn::ModelOutput>, crate::error::EngineError> {
            self.model
                .run_many(&inputs)
                .map_err(|e| crate::error::EngineError::InferenceBackendError(e.to_string()))
        }

        fn begin_game(&self) {}
        fn end_game(&self) {}
    }

    #[test]
    fn enqueue_returns_a_tree_that_has_been_probed_to_the_readout_limit() {
        let predictor: Box<dyn Predictor + Sync> = Box::new(InlinePredictor { model: RandomModel::new(1) });
        let cache = InferenceCache::with_capacity_mb(1, NUM_MOVES);
        let pool = Pool::with_capacity(predictor, cache, 2);

        let root = tree::Node::new(Board::new(7.5), 0.0, vec![1.0 / NUM_MOVES as f32; NUM_MOVES]);
        let grown = pool.enqueue(root, Box::new(StandardSearch::new()), Box::new(RolloutLimit::new(16)));

        assert!(grown.total_count >= 16);
    }
}
