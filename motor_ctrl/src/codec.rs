//! # Fixed-point codec
//!
//! The Damiao wire format carries physical quantities as unsigned fixed-point
//! fields of 12 or 16 bits, linearly mapped over a bounded physical range.
//! Out of range values saturate to the range edges rather than erroring,
//! matching the behaviour of the motor controller firmware.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use util::maths::clamp;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Encode a physical value into an unsigned fixed-point field of `bits` bits.
///
/// The value is clamped into `[min, max]`, then linearly mapped onto
/// `[0, 2^bits - 1]` and truncated. The result never exceeds `2^bits - 1`.
pub fn encode(value: f64, min: f64, max: f64, bits: u32) -> u32 {
    let clamped = clamp(&value, &min, &max);
    let span = max - min;
    let max_code = ((1u64 << bits) - 1) as f64;

    (((clamped - min) / span) * max_code) as u32
}

/// Decode an unsigned fixed-point field back into a physical value.
///
/// Inverse of [`encode`] up to quantisation: a round trip is accurate to one
/// quantisation step `(max - min) / (2^bits - 1)`.
pub fn decode(code: u32, min: f64, max: f64, bits: u32) -> f64 {
    let span = max - min;
    let max_code = ((1u64 << bits) - 1) as f64;

    min + (code as f64 / max_code) * span
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Round trips must land within one quantisation step of the input.
    #[test]
    fn test_round_trip_within_quant_step() {
        for &bits in &[12u32, 16u32] {
            let (min, max) = (-12.5f64, 12.5f64);
            let step = (max - min) / ((1u64 << bits) - 1) as f64;

            let mut x = min;
            while x <= max {
                let decoded = decode(encode(x, min, max, bits), min, max, bits);
                assert!(
                    (decoded - x).abs() <= step,
                    "round trip of {} (bits={}) off by {}",
                    x,
                    bits,
                    (decoded - x).abs()
                );
                x += 0.37;
            }
        }
    }

    /// Out of range inputs saturate to the same code as the range edges.
    #[test]
    fn test_saturation() {
        let (min, max) = (-30.0f64, 30.0f64);

        assert_eq!(encode(1e6, min, max, 12), encode(max, min, max, 12));
        assert_eq!(encode(-1e6, min, max, 12), encode(min, min, max, 12));
        assert_eq!(encode(max, min, max, 12), 4095);
        assert_eq!(encode(min, min, max, 12), 0);
    }

    /// 16 bit fields never overflow the field width.
    #[test]
    fn test_code_in_field() {
        for &x in &[-100.0, -12.5, 0.0, 3.2, 12.5, 100.0] {
            assert!(encode(x, -12.5, 12.5, 16) <= 0xFFFF);
        }
    }
}
