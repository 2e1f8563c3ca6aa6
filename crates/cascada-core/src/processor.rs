//! Runtime factor dispatch around a processing callback.
//!
//! [`OversampledProcessor`] owns one prepared [`Oversampler`] per supported
//! factor (2, 4, 8, 16) and a single scratch buffer sized for 16x. Each call
//! to [`process_block()`](OversampledProcessor::process_block) picks the
//! cascade for the requested factor:
//!
//! ```text
//! input ─→ upsample ─→ scratch (factor × n) ─→ callback (in place) ─→ downsample ─→ output
//! ```
//!
//! Factor 1 and any unsupported factor bypass the cascades: the callback runs
//! on the output at the base rate and no oversampler state is touched.
//!
//! Switching factors between blocks is allowed; each cascade keeps its own
//! state, so returning to a factor resumes where that cascade left off.

use crate::buffer::{Block, ChannelBuffer, Channels, ChannelsMut, copy_channels};
use crate::config::ProcessorConfig;
use crate::error::ConfigError;
use crate::oversampler::{OversampleFactor, Oversampler};
use crate::stage::StageDesign;

/// Factors that own a cascade, lowest first.
const CASCADE_FACTORS: [OversampleFactor; 4] = [
    OversampleFactor::X2,
    OversampleFactor::X4,
    OversampleFactor::X8,
    OversampleFactor::X16,
];

/// Multi-factor oversampling engine.
///
/// # Example
///
/// ```rust
/// use cascada_core::{OversampledProcessor, StageDesign};
///
/// let mut processor = OversampledProcessor::new(StageDesign::Fir);
/// processor.prepare(2, 128);
///
/// let input = [[0.25_f32; 128], [0.5; 128]];
/// let mut output = [[0.0_f32; 128]; 2];
///
/// // Soft clip at 4x the base rate.
/// processor.process_block(4, &input, &mut output, 128, |block| {
///     block.for_each_sample(|s| *s = libm::tanhf(*s * 3.0));
/// });
///
/// assert_eq!(processor.latency_samples(4), 23);
/// assert_eq!(processor.latency_samples(1), 0);
/// ```
#[derive(Debug)]
pub struct OversampledProcessor {
    design: StageDesign,
    oversamplers: [Oversampler; 4],
    scratch: ChannelBuffer,
    num_channels: usize,
    max_block_size: usize,
}

impl Default for OversampledProcessor {
    fn default() -> Self {
        Self::new(StageDesign::default())
    }
}

impl OversampledProcessor {
    /// Builds every cascade with `design`. Call [`prepare()`](Self::prepare)
    /// before processing.
    pub fn new(design: StageDesign) -> Self {
        Self {
            design,
            oversamplers: core::array::from_fn(|i| Oversampler::new(CASCADE_FACTORS[i], design)),
            scratch: ChannelBuffer::default(),
            num_channels: 0,
            max_block_size: 0,
        }
    }

    /// Validates `config`, then builds and prepares a processor from it.
    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut processor = Self::new(config.design);
        processor.prepare(config.channels, config.max_block_size);
        Ok(processor)
    }

    /// Prepares every cascade and sizes the scratch buffer for 16x.
    ///
    /// This is the only call that allocates. All state is zeroed.
    pub fn prepare(&mut self, num_channels: usize, max_block_size: usize) {
        for oversampler in &mut self.oversamplers {
            oversampler.prepare(num_channels, max_block_size);
        }
        self.scratch
            .resize(num_channels, max_block_size * OversampleFactor::MAX_RATIO);
        self.num_channels = num_channels;
        self.max_block_size = max_block_size;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "processor_prepare: {}, {num_channels} ch, block {max_block_size}",
            self.design
        );
    }

    /// Zeroes every cascade and the scratch buffer.
    pub fn reset(&mut self) {
        for oversampler in &mut self.oversamplers {
            oversampler.reset();
        }
        self.scratch.clear();

        #[cfg(feature = "tracing")]
        tracing::debug!("processor_reset");
    }

    /// Halfband design of every cascade.
    pub fn design(&self) -> StageDesign {
        self.design
    }

    /// Number of prepared channels.
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Largest base-rate block accepted by [`process_block()`](Self::process_block).
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Cascade used for `factor`, or `None` for bypassed factors.
    pub fn oversampler(&self, factor: usize) -> Option<&Oversampler> {
        cascade_index(factor).map(|i| &self.oversamplers[i])
    }

    /// Round-trip latency of `factor` in base-rate samples (may be fractional).
    ///
    /// Zero for factor 1 and unsupported factors.
    pub fn latency(&self, factor: usize) -> f32 {
        self.oversampler(factor).map_or(0.0, Oversampler::latency)
    }

    /// Round-trip latency of `factor` in whole base-rate samples, measured at
    /// the peak of the cascade's impulse response.
    ///
    /// Zero for factor 1 and unsupported factors.
    pub fn latency_samples(&self, factor: usize) -> usize {
        self.oversampler(factor).map_or(0, Oversampler::latency_samples)
    }

    /// Processes one block through `process` at `factor` times the base rate.
    ///
    /// `process` receives a [`Block`] of exactly `factor × num_samples`
    /// samples per channel and transforms it in place. For factor 1 or an
    /// unsupported factor, the input is copied to `output` and `process` runs
    /// on it at the base rate.
    ///
    /// `num_samples` must not exceed the prepared maximum block size. In
    /// bypass, `input` and `output` must have the same number of channels.
    pub fn process_block<I, O, F>(
        &mut self,
        factor: usize,
        input: &I,
        output: &mut O,
        num_samples: usize,
        mut process: F,
    ) where
        I: Channels + ?Sized,
        O: ChannelsMut + ?Sized,
        F: FnMut(&mut Block<'_>),
    {
        debug_assert!(
            num_samples <= self.max_block_size,
            "block of {num_samples} exceeds prepared maximum {}",
            self.max_block_size
        );

        let Some(index) = cascade_index(factor) else {
            #[cfg(feature = "tracing")]
            if factor != 1 {
                tracing::trace!("process_block: unsupported factor {factor}, bypassing");
            }
            debug_assert_eq!(
                input.num_channels(),
                output.num_channels(),
                "bypass needs matching input and output channels"
            );
            let num_channels = output.num_channels();
            copy_channels(input, output, num_channels, num_samples);
            let mut output = output;
            process(&mut Block::new(&mut output, num_samples));
            return;
        };

        let oversampler = &mut self.oversamplers[index];
        let high_rate = num_samples * oversampler.factor().ratio();
        oversampler.upsample(input, &mut self.scratch, num_samples);
        process(&mut Block::new(&mut self.scratch, high_rate));
        oversampler.downsample(&self.scratch, output, num_samples);
    }
}

/// Slot in `CASCADE_FACTORS` for a raw factor; `None` means bypass.
fn cascade_index(factor: usize) -> Option<usize> {
    match OversampleFactor::from_usize(factor)? {
        OversampleFactor::X1 => None,
        f => Some(f.num_stages() - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iir::IirOrder;

    #[test]
    fn cascade_slots() {
        assert_eq!(cascade_index(1), None);
        assert_eq!(cascade_index(3), None);
        assert_eq!(cascade_index(32), None);
        for (i, factor) in CASCADE_FACTORS.iter().enumerate() {
            assert_eq!(cascade_index(factor.ratio()), Some(i));
        }
    }

    #[test]
    fn callback_sees_elevated_length() {
        let mut processor = OversampledProcessor::new(StageDesign::Fir);
        processor.prepare(2, 32);
        let input = [[0.0_f32; 32]; 2];
        let mut output = [[0.0_f32; 32]; 2];

        for factor in [1, 2, 4, 8, 16, 5] {
            let mut seen = None;
            processor.process_block(factor, &input, &mut output, 20, |block| {
                seen = Some((block.len(), block.num_channels()));
            });
            let ratio = OversampleFactor::from_usize(factor).map_or(1, OversampleFactor::ratio);
            assert_eq!(seen, Some((20 * ratio, 2)), "factor {factor}");
        }
    }

    #[test]
    fn latency_zero_for_bypass() {
        let processor = OversampledProcessor::new(StageDesign::Fir);
        assert_eq!(processor.latency_samples(1), 0);
        assert_eq!(processor.latency_samples(7), 0);
        assert_eq!(processor.latency(0), 0.0);
        assert_eq!(processor.latency_samples(2), 15);
        assert_eq!(processor.latency(16), 28.125);
    }

    #[test]
    fn bypass_fills_every_output_channel() {
        let mut processor = OversampledProcessor::new(StageDesign::Fir);
        processor.prepare(2, 4);
        let input = [[1.0_f32, 2.0, 3.0, 4.0], [-1.0, -2.0, -3.0, -4.0]];
        let mut output = [[9.0_f32; 4]; 2];
        processor.process_block(1, &input, &mut output, 4, |block| {
            for ch in 0..block.num_channels() {
                assert_ne!(block.channel(ch)[0], 9.0, "channel {ch} left stale");
            }
        });
        assert_eq!(output, input);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "bypass needs matching input and output channels")]
    fn bypass_rejects_extra_output_channels() {
        let mut processor = OversampledProcessor::new(StageDesign::Fir);
        processor.prepare(2, 4);
        let input = [[0.5_f32; 4]];
        let mut output = [[0.0_f32; 4]; 2];
        processor.process_block(1, &input, &mut output, 4, |_| {});
    }

    #[test]
    fn from_config_prepares() {
        let config = ProcessorConfig::new(3, 64).with_design(StageDesign::Iir {
            order: IirOrder::Two,
        });
        let processor = OversampledProcessor::from_config(&config).unwrap();
        assert_eq!(processor.num_channels(), 3);
        assert_eq!(processor.max_block_size(), 64);
        assert_eq!(processor.design(), config.design);
        for factor in [2, 4, 8, 16] {
            let os = processor.oversampler(factor).unwrap();
            assert_eq!(os.num_channels(), 3);
            assert_eq!(os.design(), config.design);
        }

        assert_eq!(
            OversampledProcessor::from_config(&ProcessorConfig::new(0, 64)).unwrap_err(),
            ConfigError::NoChannels
        );
    }

    #[test]
    fn gain_callback_applies_at_dc() {
        let mut processor = OversampledProcessor::new(StageDesign::Fir);
        processor.prepare(1, 64);
        let input = [[1.0_f32; 64]];
        let mut output = [[0.0_f32; 64]];
        for _ in 0..4 {
            processor.process_block(8, &input, &mut output, 64, |block| {
                block.for_each_sample(|s| *s *= 0.5);
            });
        }
        for &s in &output[0] {
            assert!((s - 0.5).abs() < 1e-3, "expected 0.5, got {s}");
        }
    }
}
