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
// A deterministic pseudo-random stand-in for a real network, so that the
// engine can be exercised (and its tests written) without any trained
// weights. Mirrors the "random:<seed>" descriptor's behaviour: a softmax
// over normally-distributed policy logits, and a value resampled from a
// normal distribution until it falls inside `[-1, 1]`.

use crate::error::NnError;
use crate::model::{FeatureLayout, Model, ModelInput, ModelOutput};
use dg_go::point::NUM_MOVES;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::sync::Mutex;

const POLICY_STDDEV: f32 = 0.3;
const VALUE_STDDEV: f32 = 0.3;

pub struct RandomModel {
    name: String,
    rng: Mutex<SmallRng>
}

impl RandomModel {
    pub fn new(seed: u64) -> Self {
        Self {
            name: format!("random:{}", seed),
            rng: Mutex::new(SmallRng::seed_from_u64(seed))
        }
    }

    /// Parses the `"random:<seed>"` descriptor, per the model file format's
    /// testing escape hatch.
    pub fn from_descriptor(descriptor: &str) -> Result<Self, NnError> {
        let seed = descriptor
            .strip_prefix("random:")
            .ok_or_else(|| NnError::MalformedModel(format!("not a random descriptor: {}", descriptor)))?
            .parse::<u64>()
            .map_err(|_| NnError::MalformedModel(format!("invalid seed in descriptor: {}", descriptor)))?;

        Ok(Self::new(seed))
    }

    fn sample_one(&self, rng: &mut SmallRng) -> ModelOutput {
        let policy_dist = Normal::new(0.5f32, POLICY_STDDEV).expect("valid stddev");
        let value_dist = Normal::new(0.0f32, VALUE_STDDEV).expect("valid stddev");

        let mut policy: Vec<f32> = (0..NUM_MOVES).map(|_| policy_dist.sample(rng).exp()).collect();
        let sum: f32 = policy.iter().sum();

        for p in &mut policy {
            *p /= sum;
        }

        let mut value = value_dist.sample(rng);
        while !(-1.0..=1.0).contains(&value) {
            value = value_dist.sample(rng);
        }

        ModelOutput::new(policy, value)
    }
}

impl Model for RandomModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_layout(&self) -> FeatureLayout {
        FeatureLayout::Nhwc
    }

    fn run_many(&self, inputs: &[ModelInput]) -> Result<Vec<ModelOutput>, NnError> {
        let mut rng = self.rng.lock().expect("random model lock poisoned");

        Ok(inputs.iter().map(|_| self.sample_one(&mut rng)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_sums_to_one() {
        let model = RandomModel::new(42);
        let inputs = vec![ModelInput::new(vec![]); 4];
        let outputs = model.run_many(&inputs).unwrap();

        assert_eq!(outputs.len(), 4);

        for output in &outputs {
            let sum: f32 = output.policy.iter().sum();

            assert!((sum - 1.0).abs() < 1e-4, "sum = {}", sum);
            assert!(output.value >= -1.0 && output.value <= 1.0);
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let a = RandomModel::new(7);
        let b = RandomModel::new(7);
        let inputs = vec![ModelInput::new(vec![]); 2];

        let out_a = a.run_many(&inputs).unwrap();
        let out_b = b.run_many(&inputs).unwrap();

        for (x, y) in out_a.iter().zip(out_b.iter()) {
            assert_eq!(x.value, y.value);
            assert_eq!(x.policy, y.policy);
        }
    }

    #[test]
    fn parses_descriptor() {
        let model = RandomModel::from_descriptor("random:123").unwrap();

        assert_eq!(model.name(), "random:123");
        assert!(RandomModel::from_descriptor("tensorrt:foo").is_err());
    }
}
