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
// Process-wide configuration, read once from the environment and cached in
// `lazy_static` globals. Every knob from the player-visible configuration
// table has a `DG_<NAME>` environment variable; anything unset falls back to
// the documented default.

use regex::Regex;
use std::env;
use std::str::FromStr;

fn env_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => value.trim().parse().unwrap_or(default),
        Err(_) => default
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    lazy_static! {
        static ref TRUTHY: Regex = Regex::new(r"^(?i:1|true|yes|on)$").unwrap();
    }

    match env::var(name) {
        Ok(value) => TRUTHY.is_match(value.trim()),
        Err(_) => default
    }
}

lazy_static! {
    /// Target batch size for the inference scheduler, `B` in §4.4.
    pub static ref BATCH_SIZE: usize = env_var("DG_BATCH_SIZE", 16);

    /// Number of worker threads in the search pool.
    pub static ref NUM_THREADS: usize = env_var("DG_NUM_THREADS", num_cpus());

    /// Temperature `τ` used for the early soft-pick move sampling phase.
    pub static ref TEMPERATURE: f32 = env_var("DG_TEMPERATURE", 1.02);

    /// MCTS visit budget per move, `num_readouts` in §6.
    pub static ref NUM_READOUTS: usize = env_var("DG_NUM_READOUTS", 1600);

    /// Batch width target per `TreeSearch` step, `virtual_losses` in §6.
    pub static ref VIRTUAL_LOSSES: usize = env_var("DG_VIRTUAL_LOSSES", 8);

    /// Un-visited child Q bias, `value_init_penalty` in §6.
    pub static ref VALUE_INIT_PENALTY: f32 = env_var("DG_VALUE_INIT_PENALTY", 2.0);

    /// Root Q threshold below which the player resigns.
    pub static ref RESIGN_THRESHOLD: f32 = env_var("DG_RESIGN_THRESHOLD", -0.9);

    /// Default komi, `7.5` per the area scoring rules.
    pub static ref KOMI: f32 = env_var("DG_KOMI", 7.5);

    /// Enables root Dirichlet noise injection during self-play.
    pub static ref INJECT_NOISE: bool = env_flag("DG_INJECT_NOISE", true);

    /// Enables temperature-weighted early move sampling.
    pub static ref SOFT_PICK: bool = env_flag("DG_SOFT_PICK", true);

    /// Applies a random dihedral symmetry to each inference request.
    pub static ref RANDOM_SYMMETRY: bool = env_flag("DG_RANDOM_SYMMETRY", true);

    /// Keeps the chosen child's subtree across moves instead of re-expanding.
    pub static ref TREE_REUSE: bool = env_flag("DG_TREE_REUSE", true);

    /// Seconds per move, `0.0` disables time-based search.
    pub static ref SECONDS_PER_MOVE: f32 = env_var("DG_SECONDS_PER_MOVE", 0.0);

    /// Overall time budget for a game in seconds, `0.0` disables it.
    pub static ref TIME_LIMIT: f32 = env_var("DG_TIME_LIMIT", 0.0);

    /// Per-move shrink factor applied to the remaining time budget.
    pub static ref DECAY_FACTOR: f32 = env_var("DG_DECAY_FACTOR", 0.98);

    /// Inference cache capacity in megabytes.
    pub static ref CACHE_SIZE_MB: usize = env_var("DG_CACHE_SIZE_MB", 1024);

    /// Deterministic random seed, `0` means time-based.
    pub static ref RANDOM_SEED: u64 = env_var("DG_RANDOM_SEED", 0);

    /// PUCT exploration constant. Pinned to a fixed value rather than the
    /// `log((total + c_base) / c_base)` schedule some reference ports use.
    pub static ref C_PUCT: f32 = env_var("DG_C_PUCT", 1.1);
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
