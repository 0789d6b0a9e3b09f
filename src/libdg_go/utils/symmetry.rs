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
// The eight elements of the dihedral group of the square, applied to the
// `[N, N, C]` feature planes and, inversely, to the policy head.

use crate::point::{Point, N, NUM_MOVES, NUM_POINTS};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Transform {
    Identity,
    Rot90,
    Rot180,
    Rot270,
    FlipHorizontal,
    FlipVertical,
    Transpose,
    Antitranspose
}

pub const ALL: [Transform; 8] = [
    Transform::Identity,
    Transform::Rot90,
    Transform::Rot180,
    Transform::Rot270,
    Transform::FlipHorizontal,
    Transform::FlipVertical,
    Transform::Transpose,
    Transform::Antitranspose
];

impl Transform {
    /// Applies this transform to a point's coordinates.
    pub fn apply(self, p: Point) -> Point {
        let (x, y) = (p.x(), p.y());
        let m = N - 1;

        let (nx, ny) = match self {
            Transform::Identity => (x, y),
            Transform::Rot90 => (y, m - x),
            Transform::Rot180 => (m - x, m - y),
            Transform::Rot270 => (m - y, x),
            Transform::FlipHorizontal => (m - x, y),
            Transform::FlipVertical => (x, m - y),
            Transform::Transpose => (y, x),
            Transform::Antitranspose => (m - y, m - x)
        };

        Point::new(nx, ny)
    }

    /// The transform that undoes `self`, so that
    /// `t.inverse().apply(t.apply(p)) == p` for every point `p`.
    pub fn inverse(self) -> Transform {
        match self {
            Transform::Rot90 => Transform::Rot270,
            Transform::Rot270 => Transform::Rot90,
            // every other element of this group is its own inverse.
            other => other
        }
    }
}

/// Returns `true` if applying `t` to every stone on `board` reproduces the
/// same position -- i.e. `t` is a symmetry of this particular board, not
/// just of the empty board. Used to prune policy candidates that the
/// network would evaluate identically under `t`.
pub fn is_symmetric(board: &crate::board::Board, t: Transform) -> bool {
    if t == Transform::Identity {
        return true;
    }

    Point::all().all(|p| board.at(p) == board.at(t.apply(p)))
}

/// Applies `t` to a `[N, N, C]` tensor stored in row-major (HWC) order,
/// writing the result into `dst`. `src` and `dst` must each have
/// `N * N * channels` elements.
pub fn apply_to_tensor(t: Transform, channels: usize, src: &[f32], dst: &mut [f32]) {
    debug_assert_eq!(src.len(), NUM_POINTS * channels);
    debug_assert_eq!(dst.len(), NUM_POINTS * channels);

    for p in Point::all() {
        let src_index = p.to_packed_index() * channels;
        let dst_index = t.apply(p).to_packed_index() * channels;

        dst[dst_index..dst_index + channels].copy_from_slice(&src[src_index..src_index + channels]);
    }
}

/// Applies the inverse of `t` to a policy vector of length `NUM_MOVES`
/// (`N*N` board points followed by the pass logit, which is invariant under
/// every symmetry). `policy` is the network's output in `t`-transformed
/// space; `apply_to_tensor` placed each original point `p` at `t(p)`, so
/// recovering the original-space policy means reading `policy[t(p)]` back
/// out at slot `p`.
pub fn apply_inverse_to_policy(t: Transform, policy: &[f32]) -> Vec<f32> {
    debug_assert_eq!(policy.len(), NUM_MOVES);

    let mut out = vec![0.0f32; NUM_MOVES];

    for p in Point::all() {
        out[p.to_packed_index()] = policy[t.apply(p).to_packed_index()];
    }

    out[NUM_POINTS] = policy[NUM_POINTS];
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_transform_is_a_bijection_on_points() {
        for &t in &ALL {
            let mut seen = vec![false; NUM_POINTS];

            for p in Point::all() {
                let mapped = t.apply(p).to_packed_index();
                assert!(!seen[mapped], "{:?} is not a bijection", t);
                seen[mapped] = true;
            }
        }
    }

    #[test]
    fn inverse_undoes_the_transform() {
        for &t in &ALL {
            for p in Point::all() {
                assert_eq!(t.inverse().apply(t.apply(p)), p, "{:?}", t);
            }
        }
    }

    #[test]
    fn policy_round_trips_through_symmetry_and_inverse() {
        let policy: Vec<f32> = (0..NUM_MOVES).map(|i| i as f32).collect();

        for &t in &ALL {
            // emulate ApplySymmetry on the policy the same way the tensor
            // helper does, then invert it, and expect to land back on the
            // original vector.
            let mut transformed = vec![0.0f32; NUM_MOVES];
            for p in Point::all() {
                transformed[t.apply(p).to_packed_index()] = policy[p.to_packed_index()];
            }
            transformed[NUM_POINTS] = policy[NUM_POINTS];

            let round_tripped = apply_inverse_to_policy(t, &transformed);

            for i in 0..NUM_MOVES {
                assert!((round_tripped[i] - policy[i]).abs() < 1e-6, "{:?} index {}", t, i);
            }
        }
    }
}
