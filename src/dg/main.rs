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
// A minimal driver that plays one self-play game against whatever `Model`
// is wired up below and prints the result. There is no GTP server and no
// SGF output here -- those are protocol concerns for a layer above the
// engine, not the engine itself.

#[macro_use] extern crate log;

use dg_mcts::cache::InferenceCache;
use dg_mcts::options::StandardSearch;
use dg_mcts::player::Player;
use dg_mcts::scheduler::BatchingFactory;
use dg_mcts::time_control::RolloutLimit;
use dg_nn::{Model, RandomModel};
use dg_go::point::NUM_MOVES;
use dg_go::Board;
use dg_utils::config;
use std::sync::Arc;

fn main() {
    env_logger::init();

    let model: Arc<dyn Model> = Arc::new(RandomModel::new(*config::RANDOM_SEED));
    let factory = BatchingFactory::new();
    let predictor = factory.acquire(Arc::clone(&model));
    let cache = Arc::new(InferenceCache::with_capacity_mb(*config::CACHE_SIZE_MB, NUM_MOVES));

    let mut player = Player::new(Board::new(*config::KOMI), predictor.clone(), cache, Box::new(StandardSearch::new()));
    let strategy = RolloutLimit::new(*config::NUM_READOUTS);

    info!("starting a self-play game with {} readouts per move", *config::NUM_READOUTS);

    let result = loop {
        let (_, coord) = player.suggest_move(&strategy).expect("search failed");
        info!("{} plays {}", player.board().to_play(), coord);

        if let Some(result) = player.play_move(coord).expect("illegal move suggested by search") {
            break result;
        }
    };

    factory.release(&predictor);
    println!("{}", result);
}
