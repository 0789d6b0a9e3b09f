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

use dg_go::IllegalMoveError;

/// The engine-wide error kinds. `CacheMiss` is deliberately not a variant
/// here -- it is a normal control-flow value (`Option::None`), not a failure.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMoveError),

    #[error("inference backend failed: {0}")]
    InferenceBackendError(String),

    #[error("malformed model: {0}")]
    MalformedModel(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String)
}
