//! Small numeric helpers shared by the filter stages.
//!
//! All functions are allocation-free and `no_std` (math via `libm`).

use libm::logf;

/// Convert linear gain to decibels.
///
/// # Example
/// ```rust
/// use cascada_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.01) - (-40.0)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Subnormal floats (~1e-38 to 1e-45) cause severe CPU performance
/// degradation on most architectures. This replaces values below 1e-20 with
/// zero, leaving margin before the IEEE 754 subnormal range begins.
///
/// Used on the recursive state of the allpass sections, where an impulse
/// response decays toward zero forever.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
