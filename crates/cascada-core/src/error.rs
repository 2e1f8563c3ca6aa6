//! Error types for oversampler configuration.
//!
//! Only configuration can fail. Once a processor is prepared, the audio path
//! (`upsample`, `downsample`, `process_block`) has no error channel: block-size
//! and channel-count violations are debug assertions.

use thiserror::Error;

/// Errors that can occur while configuring an oversampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// IIR halfband order outside the tabulated set.
    #[error("unsupported IIR halfband order {0} (expected 2, 4, 6 or 8)")]
    UnsupportedIirOrder(usize),

    /// Oversampling factor that is not a power of two up to 16.
    #[error("unsupported oversampling factor {0} (expected 1, 2, 4, 8 or 16)")]
    UnsupportedFactor(usize),

    /// A configuration with zero channels.
    #[error("channel count must be at least 1")]
    NoChannels,

    /// A configuration with a zero maximum block size.
    #[error("maximum block size must be at least 1")]
    ZeroBlockSize,
}
