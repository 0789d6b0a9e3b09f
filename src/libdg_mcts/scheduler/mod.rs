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
// The batched-inference scheduler (§4.4): many concurrent search threads
// submit single-leaf requests against a `BatchingModel`; a dispatcher
// thread accumulates them into batches of up to the model's buffer count
// and hands each batch to the backing `Model` in one `run_many` call.

use crate::error::EngineError;
use crate::predictor::Predictor;
use crossbeam_channel::{self, Receiver, RecvTimeoutError, Sender};
use dg_nn::{Model, ModelInput, ModelOutput};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// How long the dispatcher waits for a batch to fill before flushing
/// whatever it has accumulated so far.
const DISPATCH_TIMEOUT: Duration = Duration::from_millis(1);

struct QueueItem {
    input: ModelInput,
    response: Sender<Result<ModelOutput, EngineError>>
}

/// One model identity's worth of batching state, shared by every game
/// currently using it.
pub struct BatchingModel {
    model: Arc<dyn Model>,
    queue_tx: Sender<QueueItem>,
    num_active: Arc<AtomicUsize>,
    has_started: Arc<AtomicBool>,
    dispatcher: Mutex<Option<thread::JoinHandle<()>>>
}

impl BatchingModel {
    fn new(model: Arc<dyn Model>) -> Arc<Self> {
        let (queue_tx, queue_rx) = crossbeam_channel::unbounded();
        let num_active = Arc::new(AtomicUsize::new(0));
        let has_started = Arc::new(AtomicBool::new(false));

        let dispatch_model = Arc::clone(&model);
        let dispatch_active = Arc::clone(&num_active);
        let dispatch_started = Arc::clone(&has_started);
        let handle = thread::spawn(move || dispatch_loop(dispatch_model, queue_rx, dispatch_active, dispatch_started));

        Arc::new(Self {
            model,
            queue_tx,
            num_active,
            has_started,
            dispatcher: Mutex::new(Some(handle))
        })
    }
}

fn dispatch_loop(model: Arc<dyn Model>, rx: Receiver<QueueItem>, num_active: Arc<AtomicUsize>, has_started: Arc<AtomicBool>) {
    let buffer_count = model.buffer_count().max(1);
    let mut pending: Vec<QueueItem> = Vec::with_capacity(buffer_count);

    loop {
        let active = num_active.load(Ordering::Acquire);

        // Before the first game has registered, an empty queue means "not
        // started yet", not "every game has left" -- only the latter is a
        // real shutdown signal.
        if has_started.load(Ordering::Acquire) && active == 0 && pending.is_empty() {
            match rx.try_recv() {
                Ok(item) => pending.push(item),
                Err(_) => break
            }
            continue;
        }

        let timed_out = match rx.recv_timeout(DISPATCH_TIMEOUT) {
            Ok(item) => {
                pending.push(item);
                false
            }
            Err(RecvTimeoutError::Timeout) => true,
            Err(RecvTimeoutError::Disconnected) => {
                if pending.is_empty() {
                    break;
                }
                true
            }
        };

        while pending.len() < buffer_count {
            match rx.try_recv() {
                Ok(item) => pending.push(item),
                Err(_) => break
            }
        }

        let threshold = buffer_count.min(active.max(1));

        if !pending.is_empty() && (pending.len() >= threshold || timed_out) {
            dispatch_batch(&model, &mut pending, buffer_count);
        }
    }
}

fn dispatch_batch(model: &Arc<dyn Model>, pending: &mut Vec<QueueItem>, buffer_count: usize) {
    let take = pending.len().min(buffer_count);
    let batch: Vec<QueueItem> = pending.drain(..take).collect();
    let inputs: Vec<ModelInput> = batch.iter().map(|item| item.input.clone()).collect();

    match model.run_many(&inputs) {
        Ok(outputs) => {
            for (item, output) in batch.into_iter().zip(outputs.into_iter()) {
                let _ = item.response.send(Ok(output));
            }
        }
        Err(e) => {
            let message = e.to_string();
            warn!("inference backend failed on a batch of {}: {}", take, message);

            for item in batch {
                let _ = item.response.send(Err(EngineError::InferenceBackendError(message.clone())));
            }
        }
    }
}

impl Predictor for BatchingModel {
    fn name(&self) -> &str {
        self.model.name()
    }

    fn run_many(&self, inputs: Vec<ModelInput>) -> Result<Vec<ModelOutput>, EngineError> {
        let mut receivers = Vec::with_capacity(inputs.len());

        for input in inputs {
            let (tx, rx) = crossbeam_channel::bounded(1);
            self.queue_tx
                .send(QueueItem { input, response: tx })
                .map_err(|_| EngineError::InferenceBackendError("dispatcher thread is gone".to_string()))?;
            receivers.push(rx);
        }

        receivers
            .into_iter()
            .map(|rx| match rx.recv() {
                Ok(result) => result,
                Err(_) => Err(EngineError::InferenceBackendError("dispatcher thread is gone".to_string()))
            })
            .collect()
    }

    fn begin_game(&self) {
        self.num_active.fetch_add(1, Ordering::AcqRel);
        self.has_started.store(true, Ordering::Release);
    }

    fn end_game(&self) {
        self.num_active.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Drop for BatchingModel {
    fn drop(&mut self) {
        if let Some(handle) = self.dispatcher.lock().expect("dispatcher lock poisoned").take() {
            let _ = handle.join();
        }
    }
}

/// Tracks one `BatchingModel` facade per distinct model identity, sharing it
/// across every game currently playing against that model.
pub struct BatchingFactory {
    models: Mutex<HashMap<String, Arc<BatchingModel>>>
}

impl BatchingFactory {
    pub fn new() -> Self {
        Self { models: Mutex::new(HashMap::new()) }
    }

    /// Returns the shared facade for `model`, creating it on first use, and
    /// registers one more active game against it.
    pub fn acquire(&self, model: Arc<dyn Model>) -> Arc<BatchingModel> {
        let mut models = self.models.lock().expect("factory lock poisoned");
        let facade = models
            .entry(model.name().to_string())
            .or_insert_with(|| BatchingModel::new(Arc::clone(&model)))
            .clone();

        facade.begin_game();
        facade
    }

    /// Releases one game's claim on `facade`. Once no game references a
    /// model, its entry is dropped, draining its queue and joining its
    /// dispatcher thread.
    pub fn release(&self, facade: &Arc<BatchingModel>) {
        facade.end_game();

        let mut models = self.models.lock().expect("factory lock poisoned");
        if facade.num_active.load(Ordering::Acquire) == 0 {
            models.remove(facade.model.name());
        }
    }
}

impl Default for BatchingFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_nn::RandomModel;

    #[test]
    fn run_many_returns_one_output_per_input_in_order() {
        let model: Arc<dyn Model> = Arc::new(RandomModel::new(1));
        let factory = BatchingFactory::new();
        let facade = factory.acquire(Arc::clone(&model));

        let inputs = vec![ModelInput::new(vec![]), ModelInput::new(vec![]), ModelInput::new(vec![])];
        let outputs = facade.run_many(inputs).unwrap();

        assert_eq!(outputs.len(), 3);

        factory.release(&facade);
    }

    #[test]
    fn releasing_the_last_game_drains_the_model_entry() {
        let model: Arc<dyn Model> = Arc::new(RandomModel::new(2));
        let factory = BatchingFactory::new();
        let facade = factory.acquire(Arc::clone(&model));

        factory.release(&facade);

        assert!(!factory.models.lock().unwrap().contains_key(model.name()));
    }

    #[test]
    fn a_freshly_acquired_model_serves_requests_despite_the_startup_window() {
        let model: Arc<dyn Model> = Arc::new(RandomModel::new(3));
        let factory = BatchingFactory::new();

        for _ in 0..50 {
            let facade = factory.acquire(Arc::clone(&model));
            let outputs = facade.run_many(vec![ModelInput::new(vec![])]).unwrap();

            assert_eq!(outputs.len(), 1);
            factory.release(&facade);
        }
    }
}
