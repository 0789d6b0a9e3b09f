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

use dg_go::point::{Point, NUM_MOVES};
use dg_go::utils::symmetry::{self, Transform};
use proptest::prelude::*;

fn arbitrary_transform() -> impl Strategy<Value = Transform> {
    prop::sample::select(symmetry::ALL.to_vec())
}

proptest! {
    #[test]
    fn every_transform_round_trips_through_its_own_inverse(t in arbitrary_transform()) {
        for point in Point::all() {
            let round_tripped = t.inverse().apply(t.apply(point));
            prop_assert_eq!(round_tripped, point);
        }
    }

    #[test]
    fn applying_a_transform_then_its_inverse_to_a_policy_is_the_identity(
        t in arbitrary_transform(),
        policy in prop::collection::vec(0.0f32..1.0, NUM_MOVES)
    ) {
        // `apply_inverse_to_policy` undoes the permutation a forward pass
        // under symmetry `t` applied to the board coordinates; chaining it
        // with its own inverse transform must reproduce the input exactly,
        // since both are pure index permutations (the pass slot is fixed).
        let once = symmetry::apply_inverse_to_policy(t, &policy);
        let twice = symmetry::apply_inverse_to_policy(t.inverse(), &once);

        prop_assert_eq!(twice, policy);
    }

    #[test]
    fn identity_transform_is_a_no_op_on_policies(policy in prop::collection::vec(0.0f32..1.0, NUM_MOVES)) {
        let out = symmetry::apply_inverse_to_policy(Transform::Identity, &policy);
        prop_assert_eq!(out, policy);
    }
}
