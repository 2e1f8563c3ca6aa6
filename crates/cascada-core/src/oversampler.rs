//! Cascaded halfband oversampling.
//!
//! An [`Oversampler`] chains `log2(factor)` [`HalfbandStage`]s. Upsampling runs
//! the chain front to back, each stage doubling the sample count; downsampling
//! runs it back to front, each stage halving it.
//!
//! ```text
//! upsample:    x (n) → stage 0 → (2n) → stage 1 → (4n) → … → stage k-1 → (2^k·n)
//! downsample:  (2^k·n) → stage k-1 → … → stage 1 → (2n) → stage 0 → y (n)
//! ```
//!
//! Intermediate rates live in two ping-pong [`ChannelBuffer`]s sized at
//! preparation, so neither direction allocates.
//!
//! ## Latency
//!
//! Stage `k` runs at `2^(k+1)` times the base rate, so its round-trip group
//! delay contributes `stage_latency / 2^(k+1)` base-rate samples. With the FIR
//! design that gives 15, 22.5, 26.25 and 28.125 samples at 2x, 4x, 8x and 16x.
//!
//! The IIR stages are not linear phase, so their impulse response does not
//! peak at the group delay. [`Oversampler::latency_samples`] therefore reports
//! the measured offset of the round-trip impulse-response peak, taken once
//! when the cascade is built.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::buffer::{ChannelBuffer, Channels, ChannelsMut, copy_channels};
use crate::error::ConfigError;
use crate::stage::{HalfbandStage, StageDesign};

/// Oversampling ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum OversampleFactor {
    /// No oversampling (bypass).
    #[default]
    X1,
    /// 2x, one stage.
    X2,
    /// 4x, two stages.
    X4,
    /// 8x, three stages.
    X8,
    /// 16x, four stages.
    X16,
}

impl OversampleFactor {
    /// All supported factors, in ascending order.
    pub const SUPPORTED: [OversampleFactor; 5] =
        [Self::X1, Self::X2, Self::X4, Self::X8, Self::X16];

    /// Highest supported ratio.
    pub const MAX_RATIO: usize = 16;

    /// Lenient conversion: `None` for anything but 1, 2, 4, 8 or 16.
    pub const fn from_usize(ratio: usize) -> Option<Self> {
        match ratio {
            1 => Some(Self::X1),
            2 => Some(Self::X2),
            4 => Some(Self::X4),
            8 => Some(Self::X8),
            16 => Some(Self::X16),
            _ => None,
        }
    }

    /// Rate multiplier.
    pub const fn ratio(self) -> usize {
        1 << self.num_stages()
    }

    /// Number of 2x stages (`log2(ratio)`).
    pub const fn num_stages(self) -> usize {
        match self {
            Self::X1 => 0,
            Self::X2 => 1,
            Self::X4 => 2,
            Self::X8 => 3,
            Self::X16 => 4,
        }
    }
}

impl TryFrom<usize> for OversampleFactor {
    type Error = ConfigError;

    fn try_from(ratio: usize) -> Result<Self, Self::Error> {
        Self::from_usize(ratio).ok_or(ConfigError::UnsupportedFactor(ratio))
    }
}

impl From<OversampleFactor> for usize {
    fn from(factor: OversampleFactor) -> Self {
        factor.ratio()
    }
}

impl core::fmt::Display for OversampleFactor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}x", self.ratio())
    }
}

/// Fixed-factor cascade of halfband stages.
///
/// # Example
///
/// ```rust
/// use cascada_core::{OversampleFactor, Oversampler, StageDesign};
///
/// let mut os = Oversampler::new(OversampleFactor::X4, StageDesign::Fir);
/// os.prepare(1, 64);
///
/// let input = [[0.5_f32; 64]];
/// let mut high = [[0.0_f32; 256]];
/// let mut output = [[0.0_f32; 64]];
/// os.upsample(&input, &mut high, 64);
/// os.downsample(&high, &mut output, 64);
///
/// assert_eq!(os.latency(), 22.5);
/// assert_eq!(os.latency_samples(), 23);
/// ```
#[derive(Debug)]
pub struct Oversampler {
    factor: OversampleFactor,
    design: StageDesign,
    stages: Vec<HalfbandStage>,
    front: ChannelBuffer,
    back: ChannelBuffer,
    num_channels: usize,
    max_block_size: usize,
    peak_latency: usize,
}

/// Base-rate samples run through a cascade to locate its impulse peak.
const PEAK_SEARCH_LEN: usize = 64;

impl Oversampler {
    /// Builds the stage cascade. Call [`prepare()`](Self::prepare) before processing.
    pub fn new(factor: OversampleFactor, design: StageDesign) -> Self {
        let mut os = Self::unprepared(factor, design);
        os.peak_latency = Self::impulse_peak(factor, design);
        os
    }

    fn unprepared(factor: OversampleFactor, design: StageDesign) -> Self {
        Self {
            factor,
            design,
            stages: (0..factor.num_stages()).map(|_| design.build()).collect(),
            front: ChannelBuffer::default(),
            back: ChannelBuffer::default(),
            num_channels: 0,
            max_block_size: 0,
            peak_latency: 0,
        }
    }

    /// Offset of the largest sample of the round-trip impulse response.
    ///
    /// Ties resolve to the later offset.
    fn impulse_peak(factor: OversampleFactor, design: StageDesign) -> usize {
        if factor == OversampleFactor::X1 {
            return 0;
        }
        let mut cascade = Self::unprepared(factor, design);
        cascade.allocate(1, PEAK_SEARCH_LEN);

        let mut impulse = [[0.0_f32; PEAK_SEARCH_LEN]];
        impulse[0][0] = 1.0;
        let mut high = [vec![0.0_f32; PEAK_SEARCH_LEN * factor.ratio()]];
        let mut response = [[0.0_f32; PEAK_SEARCH_LEN]];
        cascade.upsample(&impulse, &mut high, PEAK_SEARCH_LEN);
        cascade.downsample(&high, &mut response, PEAK_SEARCH_LEN);

        response[0]
            .iter()
            .enumerate()
            .max_by(|a, b| libm::fabsf(*a.1).total_cmp(&libm::fabsf(*b.1)))
            .map_or(0, |(i, _)| i)
    }

    /// Allocates stage state and intermediate buffers.
    ///
    /// Intermediate buffers hold `max_block_size × ratio / 2` samples per
    /// channel, the largest rate any inner stage boundary reaches.
    pub fn prepare(&mut self, num_channels: usize, max_block_size: usize) {
        self.allocate(num_channels, max_block_size);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "oversampler_prepare: {} {}, {num_channels} ch, block {max_block_size}, latency {}/{}",
            self.factor,
            self.design,
            self.latency(),
            self.peak_latency
        );
    }

    fn allocate(&mut self, num_channels: usize, max_block_size: usize) {
        for stage in &mut self.stages {
            stage.prepare(num_channels);
        }
        let intermediate = if self.stages.len() > 1 {
            max_block_size * self.factor.ratio() / 2
        } else {
            0
        };
        self.front.resize(num_channels, intermediate);
        self.back.resize(num_channels, intermediate);
        self.num_channels = num_channels;
        self.max_block_size = max_block_size;
    }

    /// Zeroes all stage state and intermediate buffers.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        self.front.clear();
        self.back.clear();
    }

    /// Oversampling factor.
    pub fn factor(&self) -> OversampleFactor {
        self.factor
    }

    /// Stage design shared by every stage.
    pub fn design(&self) -> StageDesign {
        self.design
    }

    /// Number of prepared channels.
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Maximum base-rate block size given to [`prepare()`](Self::prepare).
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// The stages, lowest rate first.
    pub fn stages(&self) -> &[HalfbandStage] {
        &self.stages
    }

    /// Round-trip DC group delay in base-rate samples (may be fractional).
    pub fn latency(&self) -> f32 {
        self.stages
            .iter()
            .enumerate()
            .map(|(k, stage)| stage.latency() / (2usize << k) as f32)
            .sum()
    }

    /// Round-trip latency in whole base-rate samples: the offset at which an
    /// impulse comes back out strongest.
    ///
    /// Equals [`latency()`](Self::latency) rounded for the FIR design. IIR
    /// cascades peak up to a sample later than their group delay.
    pub fn latency_samples(&self) -> usize {
        self.peak_latency
    }

    /// Upsamples `num_samples` base-rate samples into `ratio × num_samples`
    /// samples per channel.
    pub fn upsample<I, O>(&mut self, input: &I, output: &mut O, num_samples: usize)
    where
        I: Channels + ?Sized,
        O: ChannelsMut + ?Sized,
    {
        debug_assert!(num_samples <= self.max_block_size, "block exceeds prepared size");
        match self.stages.as_mut_slice() {
            [] => copy_channels(input, output, self.num_channels, num_samples),
            [only] => only.upsample(input, output, num_samples),
            [first, middle @ .., last] => {
                let mut n = num_samples;
                first.upsample(input, &mut self.front, n);
                for stage in middle {
                    n *= 2;
                    stage.upsample(&self.front, &mut self.back, n);
                    core::mem::swap(&mut self.front, &mut self.back);
                }
                last.upsample(&self.front, output, 2 * n);
            }
        }
    }

    /// Downsamples `ratio × num_samples` samples into `num_samples` base-rate
    /// samples per channel.
    pub fn downsample<I, O>(&mut self, input: &I, output: &mut O, num_samples: usize)
    where
        I: Channels + ?Sized,
        O: ChannelsMut + ?Sized,
    {
        debug_assert!(num_samples <= self.max_block_size, "block exceeds prepared size");
        match self.stages.as_mut_slice() {
            [] => copy_channels(input, output, self.num_channels, num_samples),
            [only] => only.downsample(input, output, num_samples),
            [first, middle @ .., last] => {
                // Output count of the highest-rate stage.
                let mut n = num_samples << (middle.len() + 1);
                last.downsample(input, &mut self.front, n);
                for stage in middle.iter_mut().rev() {
                    n /= 2;
                    stage.downsample(&self.front, &mut self.back, n);
                    core::mem::swap(&mut self.front, &mut self.back);
                }
                first.downsample(&self.front, output, num_samples);
            }
        }
    }
}
