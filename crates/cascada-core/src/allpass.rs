//! First-order allpass sections for polyphase IIR halfbands.
//!
//! Each section implements
//!
//! ```text
//! H(z) = (a + z^-1) / (1 + a·z^-1)
//! y[n] = a·(x[n] - y[n-1]) + x[n-1]
//! ```
//!
//! which has unity magnitude at every frequency and a phase that depends on
//! `a`. Cascades of these sections form the two branches of an
//! [`IirHalfband`](crate::IirHalfband).
//!
//! Coefficients are kept out of the state so one coefficient table can drive
//! any number of channels.

use crate::math::flush_denormal;

/// State of one first-order allpass section.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AllpassSection {
    prev_input: f32,
    prev_output: f32,
}

impl AllpassSection {
    /// Processes one sample with coefficient `a`.
    ///
    /// Stable for `|a| < 1`.
    #[inline]
    pub fn process(&mut self, a: f32, input: f32) -> f32 {
        let output = flush_denormal(a * (input - self.prev_output) + self.prev_input);
        self.prev_input = input;
        self.prev_output = output;
        output
    }

    /// Clears the section state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// DC group delay of a section with coefficient `a`, in samples.
    ///
    /// `(1 - a) / (1 + a)`: one full sample for `a = 0`, none as `a → 1`.
    pub fn dc_group_delay(a: f32) -> f32 {
        (1.0 - a) / (1.0 + a)
    }
}

/// Runs `input` through a cascade of sections, one coefficient per section.
///
/// Only the first `coeffs.len()` sections are used.
#[inline]
pub fn process_cascade(sections: &mut [AllpassSection], coeffs: &[f32], input: f32) -> f32 {
    debug_assert!(sections.len() >= coeffs.len());
    sections
        .iter_mut()
        .zip(coeffs)
        .fold(input, |x, (section, &a)| section.process(a, x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_coefficient_is_unit_delay() {
        let mut section = AllpassSection::default();
        assert_eq!(section.process(0.0, 1.0), 0.0);
        assert_eq!(section.process(0.0, 0.5), 1.0);
        assert_eq!(section.process(0.0, 0.0), 0.5);
    }

    #[test]
    fn dc_passes_at_unity() {
        let mut section = AllpassSection::default();
        let mut out = 0.0;
        for _ in 0..500 {
            out = section.process(0.6, 1.0);
        }
        assert!((out - 1.0).abs() < 1e-5, "DC gain should be 1, got {out}");
    }

    #[test]
    fn energy_preserved() {
        // Allpass: total impulse-response energy equals input energy.
        let mut section = AllpassSection::default();
        let energy: f32 = (0..2000)
            .map(|i| {
                let y = section.process(0.4, if i == 0 { 1.0 } else { 0.0 });
                y * y
            })
            .sum();
        assert!((energy - 1.0).abs() < 1e-4, "energy {energy}");
    }

    #[test]
    fn cascade_uses_coefficient_count() {
        let mut sections = [AllpassSection::default(); 4];
        // Two zero-coefficient sections: two samples of delay.
        let coeffs = [0.0, 0.0];
        let out: Vec<f32> = [1.0, 0.0, 0.0, 0.0]
            .iter()
            .map(|&x| process_cascade(&mut sections, &coeffs, x))
            .collect();
        assert_eq!(out, vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(sections[2], AllpassSection::default());
    }

    #[test]
    fn clear_resets_state() {
        let mut section = AllpassSection::default();
        section.process(0.3, 1.0);
        section.clear();
        assert_eq!(section, AllpassSection::default());
    }

    #[test]
    fn group_delay_limits() {
        assert_eq!(AllpassSection::dc_group_delay(0.0), 1.0);
        assert!(AllpassSection::dc_group_delay(0.999) < 1e-3);
    }
}
