//! Lottery threshold calculation
//!
//! An authority holding weight share `θ` should win a slot with probability
//! `p = 1 - (1 - c)^θ`, where `c = c1 / c2` is the per-slot probability that
//! at least one authority wins. Lottery outputs are 128-bit, so the cutoff is
//! `floor(2^128 · p)`.
//!
//! `p` is evaluated in IEEE-754 double precision and then converted exactly:
//! the double is split into its integer mantissa `m` and exponent `e`
//! (`p = m · 2^e`), and `m` is shifted by `128 + e` bits. No rounding happens
//! after the `powf` call, so every implementation that agrees on the double
//! agrees on the threshold.

use super::entities::{max_threshold, Threshold};
use crate::error::{Result, SlotConsensusError};
use primitive_types::U256;

const MANTISSA_BITS: u32 = 52;
const EXPONENT_BIAS: i32 = 1075;

/// Split a finite, non-negative double into `(mantissa, exponent)` with
/// `value == mantissa · 2^exponent` exactly.
fn decompose(value: f64) -> (u64, i32) {
    let bits = value.to_bits();
    let exponent = ((bits >> MANTISSA_BITS) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << MANTISSA_BITS) - 1);
    if exponent == 0 {
        // subnormal
        (fraction, 1 - EXPONENT_BIAS)
    } else {
        (fraction | (1u64 << MANTISSA_BITS), exponent - EXPONENT_BIAS)
    }
}

/// `floor(2^128 · p)` for `p` in `[0, 1]`.
fn scale_to_threshold(p: f64) -> Threshold {
    if p <= 0.0 || !p.is_finite() {
        return U256::zero();
    }
    let (mantissa, exponent) = decompose(p);
    let shift = 128 + exponent;
    if shift >= 0 {
        U256::from(mantissa) << (shift as usize)
    } else if shift > -64 {
        U256::from(mantissa >> ((-shift) as u32))
    } else {
        U256::zero()
    }
}

/// Compute the lottery threshold for the authority at `authority_index`.
///
/// # Errors
///
/// - `InvalidProbabilityRatio` if `c2 == 0` or `c1 > c2`
/// - `InvalidAuthorityWeights` if the index is out of range or the total
///   weight is zero
pub fn calculate_threshold(
    c1: u64,
    c2: u64,
    authority_index: usize,
    weights: &[u64],
) -> Result<Threshold> {
    if c2 == 0 || c1 > c2 {
        return Err(SlotConsensusError::InvalidProbabilityRatio { c1, c2 });
    }

    let weight = *weights.get(authority_index).ok_or_else(|| {
        SlotConsensusError::InvalidAuthorityWeights(format!(
            "authority index {} out of range for {} authorities",
            authority_index,
            weights.len()
        ))
    })?;

    if c1 == c2 {
        return Ok(max_threshold());
    }

    let total: u128 = weights.iter().map(|w| *w as u128).sum();
    if total == 0 {
        return Err(SlotConsensusError::InvalidAuthorityWeights(
            "total authority weight is zero".into(),
        ));
    }

    let theta = weight as f64 / total as f64;
    let c = c1 as f64 / c2 as f64;
    let p = 1.0 - (1.0 - c).powf(theta);

    Ok(scale_to_threshold(p))
}
