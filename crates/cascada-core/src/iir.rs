//! Polyphase IIR halfband stage built from allpass branches.
//!
//! The classic two-path construction:
//!
//! ```text
//! H(z) = ½ · [ A(z²) + z^-1 · B(z²) ]
//! ```
//!
//! where `A` and `B` are cascades of first-order
//! [`AllpassSection`](crate::AllpassSection)s. In polyphase form both branches
//! run at the lower rate:
//!
//! ```text
//! upsample:    x[n] ─┬─ A ──→ y[2n]
//!                    └─ B ──→ y[2n+1]
//!
//! downsample:  x[2n]   ── A ─────────┐
//!                                   (+) ── ×0.5 ──→ y[n]
//!              x[2n+1] ── B ── z^-1 ─┘
//! ```
//!
//! Far cheaper than the FIR stage for the same stopband, at the cost of a
//! non-linear phase response.
//!
//! ## Coefficients
//!
//! Tabulated per [`IirOrder`], where the order is the total number of allpass
//! coefficients (split evenly between the two branches). Designed as elliptic
//! halfbands via the Jacobi-theta method (as used by musicdsp's polyphase
//! filters and HIIR):
//!
//! | Order | Transition band | Stopband |
//! |-------|-----------------|----------|
//! | 2     | 0.20-0.30 fs    | ~36 dB   |
//! | 4     | 0.225-0.275 fs  | ~54 dB   |
//! | 6     | 0.225-0.275 fs  | ~80 dB   |
//! | 8     | 0.225-0.275 fs  | ~107 dB  |
//!
//! (fs = the higher sample rate.)

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::allpass::{AllpassSection, process_cascade};
use crate::buffer::{Channels, ChannelsMut};
use crate::error::ConfigError;

/// Most allpass sections in one branch (order 8).
const MAX_SECTIONS: usize = 4;

/// Order of an IIR halfband stage.
///
/// Only the tabulated orders exist; anything else is rejected by
/// [`IirOrder::try_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "usize", into = "usize")
)]
pub enum IirOrder {
    /// One section per branch.
    Two,
    /// Two sections per branch.
    #[default]
    Four,
    /// Three sections per branch.
    Six,
    /// Four sections per branch.
    Eight,
}

impl IirOrder {
    /// All supported orders, lowest first.
    pub const ALL: [IirOrder; 4] = [Self::Two, Self::Four, Self::Six, Self::Eight];

    /// Total number of allpass coefficients.
    pub const fn order(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Four => 4,
            Self::Six => 6,
            Self::Eight => 8,
        }
    }

    /// Number of allpass sections in each branch.
    pub const fn sections_per_branch(self) -> usize {
        self.order() / 2
    }

    /// Branch coefficient tables `(A, B)`.
    pub fn coefficients(self) -> (&'static [f32], &'static [f32]) {
        let c = match self {
            Self::Two => &ORDER_2,
            Self::Four => &ORDER_4,
            Self::Six => &ORDER_6,
            Self::Eight => &ORDER_8,
        };
        (c.a, c.b)
    }
}

impl TryFrom<usize> for IirOrder {
    type Error = ConfigError;

    fn try_from(order: usize) -> Result<Self, Self::Error> {
        match order {
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            6 => Ok(Self::Six),
            8 => Ok(Self::Eight),
            other => Err(ConfigError::UnsupportedIirOrder(other)),
        }
    }
}

impl From<IirOrder> for usize {
    fn from(order: IirOrder) -> Self {
        order.order()
    }
}

impl core::fmt::Display for IirOrder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "order {}", self.order())
    }
}

struct BranchCoefficients {
    a: &'static [f32],
    b: &'static [f32],
}

#[allow(clippy::excessive_precision)]
static ORDER_2: BranchCoefficients = BranchCoefficients {
    a: &[0.2364710210],
    b: &[0.7145421497],
};

#[allow(clippy::excessive_precision)]
static ORDER_4: BranchCoefficients = BranchCoefficients {
    a: &[0.1207321175, 0.6632020224],
    b: &[0.3903621872, 0.8907868327],
};

#[allow(clippy::excessive_precision)]
static ORDER_6: BranchCoefficients = BranchCoefficients {
    a: &[0.0602973910, 0.4125907204, 0.7727156537],
    b: &[0.2159714446, 0.6043586265, 0.9238861387],
};

#[allow(clippy::excessive_precision)]
static ORDER_8: BranchCoefficients = BranchCoefficients {
    a: &[0.0358327884, 0.2720401434, 0.5720571972, 0.8271247620],
    b: &[0.1340901419, 0.4243248713, 0.7062921421, 0.9415030942],
};

/// Per-channel IIR stage state: separate branch states for each direction.
#[derive(Debug, Default)]
struct IirChannel {
    up_a: [AllpassSection; MAX_SECTIONS],
    up_b: [AllpassSection; MAX_SECTIONS],
    down_a: [AllpassSection; MAX_SECTIONS],
    down_b: [AllpassSection; MAX_SECTIONS],
    /// Previous B-branch output on the decimation path.
    down_b_prev: f32,
}

impl IirChannel {
    fn upsample(&mut self, a: &[f32], b: &[f32], input: &[f32], output: &mut [f32]) {
        for (&x, y) in input.iter().zip(output.chunks_exact_mut(2)) {
            y[0] = process_cascade(&mut self.up_a, a, x);
            y[1] = process_cascade(&mut self.up_b, b, x);
        }
    }

    fn downsample(&mut self, a: &[f32], b: &[f32], input: &[f32], output: &mut [f32]) {
        for (x, y) in input.chunks_exact(2).zip(output.iter_mut()) {
            let even = process_cascade(&mut self.down_a, a, x[0]);
            let odd = process_cascade(&mut self.down_b, b, x[1]);
            *y = 0.5 * (even + self.down_b_prev);
            self.down_b_prev = odd;
        }
    }
}

/// 2x up/downsampling stage using a polyphase allpass IIR halfband.
///
/// # Example
///
/// ```rust
/// use cascada_core::{IirHalfband, IirOrder};
///
/// let mut stage = IirHalfband::new(IirOrder::Six);
/// stage.prepare(2);
///
/// let input = [[0.5_f32; 16], [0.25; 16]];
/// let mut up = [[0.0_f32; 32]; 2];
/// stage.upsample(&input, &mut up, 16);
/// ```
#[derive(Debug)]
pub struct IirHalfband {
    order: IirOrder,
    a: &'static [f32],
    b: &'static [f32],
    channels: Vec<IirChannel>,
}

impl IirHalfband {
    /// Creates an unprepared stage of the given order.
    pub fn new(order: IirOrder) -> Self {
        let (a, b) = order.coefficients();
        Self {
            order,
            a,
            b,
            channels: Vec::new(),
        }
    }

    /// Allocates zeroed per-channel branch states.
    pub fn prepare(&mut self, num_channels: usize) {
        self.channels.clear();
        self.channels.resize_with(num_channels, IirChannel::default);
    }

    /// Clears all branch states.
    pub fn reset(&mut self) {
        self.channels.fill_with(IirChannel::default);
    }

    /// Number of prepared channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Filter order.
    pub fn order(&self) -> IirOrder {
        self.order
    }

    /// Round-trip (up + down) DC group delay in samples at the higher rate.
    ///
    /// Each branch section contributes twice its low-rate group delay, and the
    /// B branch adds one high-rate sample of offset.
    pub fn latency(&self) -> f32 {
        let branch = |coeffs: &[f32]| -> f32 {
            coeffs
                .iter()
                .map(|&c| 2.0 * AllpassSection::dc_group_delay(c))
                .sum()
        };
        branch(self.a) + branch(self.b) + 1.0
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
            state.upsample(self.a, self.b, x, y);
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
            state.downsample(self.a, self.b, x, y);
        }
    }
}
