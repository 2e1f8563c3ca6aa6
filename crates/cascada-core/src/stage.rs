//! Halfband stage selection.
//!
//! [`StageDesign`] picks the filter family once per processor; every 2x stage
//! of every oversampler is then built from it as a [`HalfbandStage`]. The set
//! of designs is closed, so stages dispatch with a `match` rather than a
//! trait object.

use crate::buffer::{Channels, ChannelsMut};
use crate::error::ConfigError;
use crate::fir::FirHalfband;
use crate::iir::{IirHalfband, IirOrder};

/// Halfband filter family used by every 2x stage.
///
/// Serialized as an internally tagged table:
///
/// ```toml
/// kind = "iir"
/// order = 6
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "lowercase")
)]
pub enum StageDesign {
    /// Linear-phase 31-tap FIR halfband.
    #[default]
    Fir,
    /// Polyphase allpass IIR halfband of the given order.
    Iir {
        /// Total allpass coefficient count.
        order: IirOrder,
    },
}

impl StageDesign {
    /// IIR design from a raw order, rejecting unsupported values.
    pub fn iir(order: usize) -> Result<Self, ConfigError> {
        Ok(Self::Iir {
            order: IirOrder::try_from(order)?,
        })
    }

    /// Builds one unprepared stage of this design.
    pub fn build(self) -> HalfbandStage {
        match self {
            Self::Fir => HalfbandStage::Fir(FirHalfband::new()),
            Self::Iir { order } => HalfbandStage::Iir(IirHalfband::new(order)),
        }
    }
}

impl core::fmt::Display for StageDesign {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fir => f.write_str("FIR halfband"),
            Self::Iir { order } => write!(f, "IIR halfband ({order})"),
        }
    }
}

/// One 2x up/downsampling stage of either design.
#[derive(Debug)]
pub enum HalfbandStage {
    /// FIR stage.
    Fir(FirHalfband),
    /// IIR stage.
    Iir(IirHalfband),
}

impl HalfbandStage {
    /// Design this stage was built from.
    pub fn design(&self) -> StageDesign {
        match self {
            Self::Fir(_) => StageDesign::Fir,
            Self::Iir(s) => StageDesign::Iir { order: s.order() },
        }
    }

    /// Allocates per-channel state.
    pub fn prepare(&mut self, num_channels: usize) {
        match self {
            Self::Fir(s) => s.prepare(num_channels),
            Self::Iir(s) => s.prepare(num_channels),
        }
    }

    /// Clears all filter state.
    pub fn reset(&mut self) {
        match self {
            Self::Fir(s) => s.reset(),
            Self::Iir(s) => s.reset(),
        }
    }

    /// Number of prepared channels.
    pub fn num_channels(&self) -> usize {
        match self {
            Self::Fir(s) => s.num_channels(),
            Self::Iir(s) => s.num_channels(),
        }
    }

    /// Round-trip latency in samples at this stage's higher rate.
    pub fn latency(&self) -> f32 {
        match self {
            Self::Fir(s) => s.latency(),
            Self::Iir(s) => s.latency(),
        }
    }

    /// Interpolates `num_samples` into `2 × num_samples` per channel.
    #[inline]
    pub fn upsample<I, O>(&mut self, input: &I, output: &mut O, num_samples: usize)
    where
        I: Channels + ?Sized,
        O: ChannelsMut + ?Sized,
    {
        match self {
            Self::Fir(s) => s.upsample(input, output, num_samples),
            Self::Iir(s) => s.upsample(input, output, num_samples),
        }
    }

    /// Decimates `2 × num_samples` into `num_samples` per channel.
    #[inline]
    pub fn downsample<I, O>(&mut self, input: &I, output: &mut O, num_samples: usize)
    where
        I: Channels + ?Sized,
        O: ChannelsMut + ?Sized,
    {
        match self {
            Self::Fir(s) => s.downsample(input, output, num_samples),
            Self::Iir(s) => s.downsample(input, output, num_samples),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_matches_design() {
        let designs = [
            StageDesign::Fir,
            StageDesign::Iir {
                order: IirOrder::Two,
            },
            StageDesign::Iir {
                order: IirOrder::Eight,
            },
        ];
        for design in designs {
            assert_eq!(design.build().design(), design);
        }
    }

    #[test]
    fn iir_constructor_validates() {
        assert_eq!(
            StageDesign::iir(6),
            Ok(StageDesign::Iir {
                order: IirOrder::Six
            })
        );
        assert!(StageDesign::iir(3).is_err());
    }

    #[test]
    fn dispatch_reaches_inner_stage() {
        let mut stage = StageDesign::Fir.build();
        stage.prepare(3);
        assert_eq!(stage.num_channels(), 3);
        assert_eq!(stage.latency(), 30.0);

        let mut stage = StageDesign::default().build();
        let input = [[1.0_f32; 4]];
        let mut output = [[0.0_f32; 8]];
        stage.prepare(1);
        stage.upsample(&input, &mut output, 4);
        assert!(output[0].iter().any(|&s| s != 0.0));
    }
}
