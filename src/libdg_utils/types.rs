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

use std::fmt;

/// A minimal IEEE 754 binary16 ("half float") type, used to keep feature
/// tensors and model I/O compact without depending on the backend's own
/// tensor representation.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct f16 {
    bits: u16
}

impl f16 {
    pub fn from_bits(bits: u16) -> Self {
        Self { bits }
    }

    pub fn to_bits(self) -> u16 {
        self.bits
    }

    pub fn to_f32(self) -> f32 {
        let sign = (self.bits >> 15) & 0x1;
        let exponent = (self.bits >> 10) & 0x1f;
        let fraction = self.bits & 0x3ff;

        let f_bits: u32 = if exponent == 0 {
            if fraction == 0 {
                (sign as u32) << 31
            } else {
                // subnormal half -> normalize into a regular f32.
                let mut exponent = -1i32;
                let mut fraction = fraction as i32;

                loop {
                    fraction <<= 1;
                    exponent += 1;

                    if fraction & 0x400 != 0 {
                        break;
                    }
                }

                let fraction = (fraction & 0x3ff) as u32;
                let exponent = (127 - 15 - exponent) as u32;

                ((sign as u32) << 31) | (exponent << 23) | (fraction << 13)
            }
        } else if exponent == 0x1f {
            // infinity / nan
            ((sign as u32) << 31) | (0xff << 23) | ((fraction as u32) << 13)
        } else {
            let exponent = (exponent as u32) + (127 - 15);

            ((sign as u32) << 31) | (exponent << 23) | ((fraction as u32) << 13)
        };

        f32::from_bits(f_bits)
    }
}

impl From<f32> for f16 {
    fn from(value: f32) -> Self {
        let bits = value.to_bits();
        let sign = ((bits >> 31) & 0x1) as u16;
        let exponent = ((bits >> 23) & 0xff) as i32;
        let fraction = bits & 0x7f_ffff;

        let half_bits: u16 = if exponent == 0xff {
            // infinity / nan, preserve a quiet nan payload bit.
            let nan_bit = if fraction != 0 { 0x200 } else { 0 };
            (sign << 15) | (0x1f << 10) | nan_bit
        } else {
            let unbiased = exponent - 127;

            if unbiased > 15 {
                // overflow to infinity
                (sign << 15) | (0x1f << 10)
            } else if unbiased >= -14 {
                let half_exponent = (unbiased + 15) as u16;
                let half_fraction = (fraction >> 13) as u16;

                (sign << 15) | (half_exponent << 10) | half_fraction
            } else if unbiased >= -24 {
                // subnormal half
                let shift = (-unbiased - 14) as u32;
                let half_fraction = ((fraction | 0x80_0000) >> (13 + shift)) as u16;

                (sign << 15) | half_fraction
            } else {
                // underflow to zero
                sign << 15
            }
        };

        Self::from_bits(half_bits)
    }
}

impl From<f16> for f32 {
    fn from(value: f16) -> Self {
        value.to_f32()
    }
}

impl fmt::Debug for f16 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl fmt::Display for f16 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_common_values() {
        for &value in &[0.0f32, 1.0, -1.0, 0.5, 2.0, 3.14, -7.5, 100.0] {
            let half = f16::from(value);
            let back: f32 = half.into();

            assert!((back - value).abs() < 1e-2, "{} -> {} -> {}", value, half.to_bits(), back);
        }
    }

    #[test]
    fn preserves_zero_and_sign() {
        assert_eq!(f16::from(0.0f32).to_f32(), 0.0);
        assert_eq!(f16::from(-0.0f32).to_bits(), 0x8000);
    }
}
