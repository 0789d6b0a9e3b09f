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
// The boundary between a search worker and whatever batches its requests
// together with everyone else's. A worker never touches a `Model` or a
// `BatchingModel` directly -- only this trait -- so that tests can swap in
// a predictor that runs everything inline, with no batching at all.

use crate::error::EngineError;
use dg_nn::ModelInput;
use dg_nn::ModelOutput;

pub trait Predictor: Send + Sync {
    /// The identity folded into the inference cache fingerprint; forwards to
    /// the backing `Model`'s own name.
    fn name(&self) -> &str;

    /// Runs a batch of leaf requests to completion, in the order given.
    /// Requests from other callers of the same predictor may be interleaved
    /// into the same underlying model batch; this call only waits for its
    /// own.
    fn run_many(&self, inputs: Vec<ModelInput>) -> Result<Vec<ModelOutput>, EngineError>;

    /// Registers that one more game will be submitting requests through
    /// this predictor.
    fn begin_game(&self);

    /// The inverse of `begin_game`; once the last active game calls this,
    /// any undersized remaining batch is flushed and backing workers are
    /// released.
    fn end_game(&self);
}
