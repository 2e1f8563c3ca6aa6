//! 31-tap polyphase FIR halfband stage.
//!
//! A halfband lowpass has its cutoff at a quarter of the higher sample rate,
//! which forces every other tap to zero except the center tap (exactly 0.5).
//! Splitting the filter into its two polyphase branches leaves:
//!
//! - **even phase**: the 16 non-zero outer taps, a short symmetric FIR
//! - **odd phase**: the lone center tap, i.e. a pure delay scaled by 0.5
//!
//! so a 2x rate change costs 16 multiplies per low-rate sample instead of 31
//! per high-rate sample.
//!
//! ## Signal Path
//!
//! ```text
//! upsample:    x[n] ─┬─ even-phase FIR ──×2──→ y[2n]
//!                    └─ z^-7 ─────────────────→ y[2n+1]
//!
//! downsample:  x[2n]   ── even-phase FIR ──┐
//!                                          (+) ──→ y[n]
//!              x[2n+1] ── z^-8 ── ×0.5 ────┘
//! ```
//!
//! The odd branch of the decimator carries one extra low-rate sample of delay
//! relative to the interpolator; that is where the center tap lands once the
//! input is split into even/odd streams.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::buffer::{Channels, ChannelsMut};

/// Number of taps in the halfband prototype.
pub const FIR_TAPS: usize = 31;

/// Index of the center tap in [`FIR_PROTOTYPE`].
pub const FIR_CENTER_TAP: usize = FIR_TAPS / 2;

/// Number of non-zero even-phase taps (`⌊taps/2⌋ + 1`).
const EVEN_TAPS: usize = FIR_TAPS / 2 + 1;

// Halfband layout: the center tap sits on an odd index.
const _: () = assert!(FIR_TAPS == 31 && FIR_TAPS % 4 == 3);

/// Low-rate delay of the center tap on the interpolation path.
const UP_CENTER_DELAY: usize = FIR_CENTER_TAP / 2;

/// Low-rate delay of the odd input stream on the decimation path.
const DOWN_ODD_DELAY: usize = UP_CENTER_DELAY + 1;

/// 31-tap halfband lowpass prototype.
///
/// Design: windowed sinc, Kaiser window (beta 4.6), even-phase taps
/// renormalized to sum to exactly 0.5 for unity DC gain.
/// Cutoff: 0.25 fs (of the higher rate). Passband (0-0.2 fs) ripple: < 0.03 dB.
/// Stopband (0.3-0.5 fs) attenuation: ~51 dB.
///
/// Odd indices are structural zeros apart from the 0.5 center tap.
#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
pub static FIR_PROTOTYPE: [f32; FIR_TAPS] = [
    -1.1120791686e-03, 0.0,  3.6171187244e-03, 0.0,
    -8.2109342414e-03, 0.0,  1.5923565475e-02, 0.0,
    -2.8573850091e-02, 0.0,  5.0542111025e-02, 0.0,
    -9.7808410559e-02, 0.0,  3.1562247884e-01, 0.5,
     3.1562247884e-01, 0.0, -9.7808410559e-02, 0.0,
     5.0542111025e-02, 0.0, -2.8573850091e-02, 0.0,
     1.5923565475e-02, 0.0, -8.2109342414e-03, 0.0,
     3.6171187244e-03, 0.0, -1.1120791686e-03,
];

/// Circular sample history with a contiguous read window.
///
/// Every sample is written twice, `EVEN_TAPS` apart, so the most recent
/// `EVEN_TAPS` samples are always readable as one slice (oldest first)
/// without wrapping.
#[derive(Debug, Default)]
struct History {
    buf: [f32; 2 * EVEN_TAPS],
    pos: usize,
}

impl History {
    #[inline]
    fn push(&mut self, sample: f32) {
        self.buf[self.pos] = sample;
        self.buf[self.pos + EVEN_TAPS] = sample;
        self.pos = (self.pos + 1) % EVEN_TAPS;
    }

    /// Last `EVEN_TAPS` samples, oldest first.
    #[inline]
    fn window(&self) -> &[f32] {
        &self.buf[self.pos..self.pos + EVEN_TAPS]
    }

    /// Sample pushed `delay` pushes ago (0 = newest).
    #[inline]
    fn delayed(&self, delay: usize) -> f32 {
        self.window()[EVEN_TAPS - 1 - delay]
    }
}

#[inline]
fn even_phase(taps: &[f32; EVEN_TAPS], window: &[f32]) -> f32 {
    taps.iter().zip(window).map(|(t, x)| t * x).sum()
}

/// Per-channel FIR stage state.
#[derive(Debug, Default)]
struct FirChannel {
    up: History,
    down_even: History,
    down_odd: History,
}

impl FirChannel {
    fn upsample(&mut self, taps: &[f32; EVEN_TAPS], input: &[f32], output: &mut [f32]) {
        for (&x, y) in input.iter().zip(output.chunks_exact_mut(2)) {
            self.up.push(x);
            let even = even_phase(taps, self.up.window());
            let odd = 0.5 * self.up.delayed(UP_CENTER_DELAY);
            // ×2 restores the level lost to zero-stuffing
            y[0] = 2.0 * even;
            y[1] = 2.0 * odd;
        }
    }

    fn downsample(&mut self, taps: &[f32; EVEN_TAPS], input: &[f32], output: &mut [f32]) {
        for (x, y) in input.chunks_exact(2).zip(output.iter_mut()) {
            self.down_even.push(x[0]);
            self.down_odd.push(x[1]);
            let even = even_phase(taps, self.down_even.window());
            let odd = 0.5 * self.down_odd.delayed(DOWN_ODD_DELAY);
            *y = even + odd;
        }
    }
}

/// Extracts the even-indexed (non-zero outer) taps of a halfband prototype.
fn even_phase_taps(prototype: &[f32; FIR_TAPS]) -> [f32; EVEN_TAPS] {
    core::array::from_fn(|k| prototype[2 * k])
}

/// 2x up/downsampling stage built on the 31-tap halfband [`FIR_PROTOTYPE`].
///
/// Linear phase: the group delay is exactly 15 samples at the higher rate in
/// each direction, so a full up/down round trip delays by 30 high-rate
/// samples.
///
/// # Example
///
/// ```rust
/// use cascada_core::FirHalfband;
///
/// let mut stage = FirHalfband::new();
/// stage.prepare(1);
///
/// let input = [[1.0_f32; 4]];
/// let mut output = [[0.0_f32; 8]];
/// stage.upsample(&input, &mut output, 4);
/// ```
#[derive(Debug)]
pub struct FirHalfband {
    taps: [f32; EVEN_TAPS],
    channels: Vec<FirChannel>,
}

impl Default for FirHalfband {
    fn default() -> Self {
        Self::new()
    }
}

impl FirHalfband {
    /// Creates an unprepared stage with the even-phase taps of [`FIR_PROTOTYPE`].
    pub fn new() -> Self {
        Self {
            taps: even_phase_taps(&FIR_PROTOTYPE),
            channels: Vec::new(),
        }
    }

    /// Allocates zeroed per-channel histories.
    pub fn prepare(&mut self, num_channels: usize) {
        debug_assert_eq!(
            FIR_PROTOTYPE[FIR_CENTER_TAP], 0.5,
            "halfband center tap must be 0.5"
        );
        self.channels.clear();
        self.channels.resize_with(num_channels, FirChannel::default);
    }

    /// Clears all channel histories.
    pub fn reset(&mut self) {
        self.channels.fill_with(FirChannel::default);
    }

    /// Number of prepared channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Round-trip (up + down) group delay in samples at the higher rate.
    pub fn latency(&self) -> f32 {
        (2 * FIR_CENTER_TAP) as f32
    }

    /// Interpolates `num_samples` input samples into `2 × num_samples` outputs per channel.
    pub fn upsample<I, O>(&mut self, input: &I, output: &mut O, num_samples: usize)
    where
        I: Channels + ?Sized,
        O: ChannelsMut + ?Sized,
    {
        debug_assert!(input.num_channels() >= self.channels.len());
        debug_assert!(output.num_channels() >= self.channels.len());
        for (ch, state) in self.channels.iter_mut().enumerate() {
            let x = &input.channel(ch)[..num_samples];
            let y = &mut output.channel_mut(ch)[..2 * num_samples];
            state.upsample(&self.taps, x, y);
        }
    }

    /// Decimates `2 × num_samples` input samples into `num_samples` outputs per channel.
    pub fn downsample<I, O>(&mut self, input: &I, output: &mut O, num_samples: usize)
    where
        I: Channels + ?Sized,
        O: ChannelsMut + ?Sized,
    {
        debug_assert!(input.num_channels() >= self.channels.len());
        debug_assert!(output.num_channels() >= self.channels.len());
        for (ch, state) in self.channels.iter_mut().enumerate() {
            let x = &input.channel(ch)[..2 * num_samples];
            let y = &mut output.channel_mut(ch)[..num_samples];
            state.downsample(&self.taps, x, y);
        }
    }
}
