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

extern crate crossbeam_channel;
extern crate crossbeam_utils;
extern crate dg_go;
extern crate dg_nn;
extern crate dg_utils;
#[macro_use] extern crate log;
extern crate rand;
extern crate rand_distr;
extern crate thiserror;

pub mod cache;
pub mod dirichlet;
pub mod error;
pub mod game_result;
pub mod options;
pub mod player;
pub mod pool;
pub mod predictor;
pub mod scheduler;
pub mod time_control;
pub mod tree;

pub use self::error::EngineError;
pub use self::game_result::GameResult;
pub use self::player::Player;
pub use self::pool::Pool;
pub use self::predictor::Predictor;
