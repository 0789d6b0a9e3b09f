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
// The boundary between the search engine and a neural network backend. The
// engine knows nothing about TensorFlow, TensorRT, or any other concrete
// backend -- it only ever talks to something that implements `Model`.

use crate::error::NnError;
use dg_go::point::NUM_MOVES;
use dg_utils::types::f16;

/// How the `[N, N, 17]` feature planes are packed into `ModelInput::features`.
/// Most backends want channel-last (`Nhwc`); a few accelerator backends want
/// channel-first (`Nchw`) so that each plane is contiguous.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FeatureLayout {
    Nhwc,
    Nchw
}

impl FeatureLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureLayout::Nhwc => "nhwc",
            FeatureLayout::Nchw => "nchw"
        }
    }

    pub fn parse(s: &str) -> Option<FeatureLayout> {
        match s {
            "nhwc" => Some(FeatureLayout::Nhwc),
            "nchw" => Some(FeatureLayout::Nchw),
            _ => None
        }
    }
}

/// One leaf's worth of input: the packed feature planes for a single
/// position, encoded according to the model's declared `FeatureLayout`.
#[derive(Clone)]
pub struct ModelInput {
    pub features: Vec<f16>
}

impl ModelInput {
    pub fn new(features: Vec<f16>) -> Self {
        Self { features }
    }
}

/// One leaf's worth of output: a softmax over `N*N` board points followed by
/// the pass logit, and a scalar value in `[-1, 1]` from the current mover's
/// perspective.
#[derive(Clone, Debug)]
pub struct ModelOutput {
    pub policy: Vec<f32>,
    pub value: f32
}

impl ModelOutput {
    pub fn new(policy: Vec<f32>, value: f32) -> Self {
        debug_assert_eq!(policy.len(), NUM_MOVES);

        Self { policy, value }
    }
}

/// The capability the search engine requires of a neural network backend.
/// Implementations are required to be thread-safe: `run_many` may be called
/// concurrently from multiple scheduler dispatch threads, each against a
/// disjoint batch.
pub trait Model: Send + Sync {
    /// A short identifying name, folded into the inference cache fingerprint
    /// so that switching models never yields a stale hit.
    fn name(&self) -> &str;

    /// The feature packing this model expects its inputs encoded in.
    fn feature_layout(&self) -> FeatureLayout;

    /// The ideal number of in-flight requests for this model -- usually the
    /// device count times a small buffering factor. Schedulers use this as
    /// the batch-size hint `B`.
    fn buffer_count(&self) -> usize {
        1
    }

    /// Runs a forward pass over the entire batch in one go. A backend error
    /// is fatal for every request in the batch; there is no partial-failure
    /// mode since the model is stateless and a retry would not help.
    fn run_many(&self, inputs: &[ModelInput]) -> Result<Vec<ModelOutput>, NnError>;
}
