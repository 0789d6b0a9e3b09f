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
// A symmetric Dirichlet(alpha) sampler, built on the standard trick of
// normalizing `k` independent Gamma(alpha, 1) draws. `rand_distr` does not
// expose a `Dirichlet` directly for a runtime-determined `k` in the version
// this crate pins, so it is assembled here from `Gamma`.

use rand_distr::{Distribution, Gamma};

/// Draws one sample from `Dirichlet(alpha, ..., alpha)` over `k` categories.
pub fn sample(alpha: f32, k: usize) -> Vec<f32> {
    if k == 0 {
        return Vec::new();
    }

    let gamma = Gamma::new(alpha as f64, 1.0).expect("alpha must be positive");
    let mut rng = rand::thread_rng();

    let draws: Vec<f64> = (0..k).map(|_| gamma.sample(&mut rng)).collect();
    let total: f64 = draws.iter().sum();

    if total <= 0.0 {
        return vec![1.0 / (k as f32); k];
    }

    draws.iter().map(|&x| (x / total) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_sums_to_one() {
        let draws = sample(0.03, 362);
        let total: f32 = draws.iter().sum();

        assert!((total - 1.0).abs() < 1e-3, "sum = {}", total);
    }

    #[test]
    fn sample_of_zero_categories_is_empty() {
        assert!(sample(0.03, 0).is_empty());
    }
}
