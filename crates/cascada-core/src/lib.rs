//! Cascada Core - polyphase halfband oversampling
//!
//! This crate runs a caller-supplied processing routine at 2x, 4x, 8x or 16x
//! the base sample rate, with zero allocation after preparation.
//!
//! # Core Abstractions
//!
//! ## Halfband Stages
//!
//! Each 2x rate change is one halfband stage:
//!
//! - [`FirHalfband`] - Linear-phase 31-tap polyphase FIR
//! - [`IirHalfband`] - Two-path polyphase allpass IIR, order 2/4/6/8 ([`IirOrder`])
//! - [`HalfbandStage`] - Closed enum over both, selected by [`StageDesign`]
//!
//! ## Cascades
//!
//! - [`Oversampler`] - `log2(factor)` stages chained for one [`OversampleFactor`],
//!   with fractional latency bookkeeping
//! - [`OversampledProcessor`] - One cascade per factor, runtime factor dispatch,
//!   upsample → callback → downsample
//!
//! ## Buffers
//!
//! - [`Channels`] / [`ChannelsMut`] - Deinterleaved per-channel access
//! - [`ChannelBuffer`] - Fixed-capacity multichannel storage
//! - [`Block`] - In-place view handed to the processing callback
//!
//! ## Configuration
//!
//! - [`ProcessorConfig`] - Channel count, block size and design (serde-enabled)
//! - [`ConfigError`] - Everything that can fail, all at configuration time
//!
//! # no_std Support
//!
//! Disable the default features to build without `std` (requires `alloc`):
//!
//! ```toml
//! [dependencies]
//! cascada-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use cascada_core::{OversampledProcessor, ProcessorConfig, StageDesign};
//!
//! let config = ProcessorConfig::new(1, 64).with_design(StageDesign::iir(6)?);
//! let mut processor = OversampledProcessor::from_config(&config)?;
//!
//! let input = [[0.5_f32; 64]];
//! let mut output = [[0.0_f32; 64]];
//!
//! // Hard clip at 8x, then compensate for the reported latency downstream.
//! processor.process_block(8, &input, &mut output, 64, |block| {
//!     block.for_each_sample(|s| *s = s.clamp(-0.3, 0.3));
//! });
//! let delay = processor.latency_samples(8);
//! # assert!(delay > 0);
//! # Ok::<(), cascada_core::ConfigError>(())
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: all storage is sized by `prepare()`
//! - **Closed dispatch**: stage designs are an enum, not trait objects
//! - **Errors only at configuration**: the audio path has no error channel

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod buffer;
pub mod config;
pub mod error;
pub mod fir;
pub mod iir;
pub mod math;
pub mod oversampler;
pub mod processor;
pub mod stage;

// Re-export main types at crate root
pub use allpass::{AllpassSection, process_cascade};
pub use buffer::{Block, ChannelBuffer, Channels, ChannelsMut};
pub use config::ProcessorConfig;
pub use error::ConfigError;
pub use fir::{FIR_CENTER_TAP, FIR_PROTOTYPE, FIR_TAPS, FirHalfband};
pub use iir::{IirHalfband, IirOrder};
pub use math::{flush_denormal, linear_to_db};
pub use oversampler::{OversampleFactor, Oversampler};
pub use processor::OversampledProcessor;
pub use stage::{HalfbandStage, StageDesign};
