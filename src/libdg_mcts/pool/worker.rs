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
// One OS thread driving whichever enqueued searches are not yet done,
// round-robin. Several workers may pick the same search on the same pass --
// that is the point, since it is what lets their leaf requests land in the
// same scheduler batch -- `tree_search` already serializes them correctly
// through the tree's own mutex.

use super::shared_context::{SearchContext, SharedContext};
use crate::player;
use crossbeam_utils::Backoff;
use dg_utils::config;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier, RwLock};

pub struct Worker {
    shared: Arc<SharedContext>
}

impl Worker {
    pub fn new(shared: Arc<SharedContext>, has_started: Arc<Barrier>) -> Self {
        shared.num_running.fetch_add(1, Ordering::AcqRel);
        has_started.wait();

        Self { shared }
    }

    pub fn run(self, searches: Arc<RwLock<Vec<Arc<SearchContext>>>>) {
        let backoff = Backoff::new();
        let mut cursor = 0usize;

        while self.shared.is_running.load(Ordering::Acquire) {
            let snapshot = searches.read().expect("searches lock poisoned").clone();

            if snapshot.is_empty() {
                backoff.snooze();
                continue;
            }

            cursor %= snapshot.len();
            let context = Arc::clone(&snapshot[cursor]);
            cursor += 1;

            if context.is_done() {
                self.retire(&searches, &context);
            } else {
                let _ = player::tree_search(
                    &context.tree,
                    self.shared.predictor.as_ref(),
                    &self.shared.cache,
                    context.options.as_ref(),
                    *config::BATCH_SIZE
                );
                backoff.reset();
            }
        }

        self.shared.num_running.fetch_sub(1, Ordering::AcqRel);
    }

    /// Removes `context` from the shared list and notifies its caller, but
    /// only the worker that actually wins the removal race sends -- two
    /// workers can both observe `is_done()` before either acts on it.
    fn retire(&self, searches: &RwLock<Vec<Arc<SearchContext>>>, context: &Arc<SearchContext>) {
        let mut guard = searches.write().expect("searches lock poisoned");

        if let Some(pos) = guard.iter().position(|c| Arc::ptr_eq(c, context)) {
            guard.remove(pos);
            drop(guard);
            let _ = context.done.send(());
        }
    }
}
