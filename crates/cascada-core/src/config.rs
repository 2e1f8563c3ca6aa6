//! Processor configuration.

use crate::error::ConfigError;
use crate::stage::StageDesign;

/// Everything an [`OversampledProcessor`](crate::OversampledProcessor) needs
/// to be prepared.
///
/// With the `serde` feature this reads from any serde format; missing fields
/// take their [`Default`] values.
///
/// ```toml
/// channels = 2
/// max_block_size = 256
///
/// [design]
/// kind = "iir"
/// order = 4
/// ```
///
/// # Example
///
/// ```rust
/// use cascada_core::{IirOrder, ProcessorConfig, StageDesign};
///
/// let config = ProcessorConfig::new(2, 256)
///     .with_design(StageDesign::Iir { order: IirOrder::Four });
///
/// assert!(config.validate().is_ok());
/// assert!(ProcessorConfig::new(0, 256).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ProcessorConfig {
    /// Number of deinterleaved channels.
    pub channels: usize,
    /// Largest base-rate block passed to `process_block`.
    pub max_block_size: usize,
    /// Halfband design used by every stage.
    pub design: StageDesign,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            max_block_size: 512,
            design: StageDesign::Fir,
        }
    }
}

impl ProcessorConfig {
    /// Creates a FIR configuration.
    pub fn new(channels: usize, max_block_size: usize) -> Self {
        Self {
            channels,
            max_block_size,
            design: StageDesign::Fir,
        }
    }

    /// Sets the halfband design.
    pub fn with_design(mut self, design: StageDesign) -> Self {
        self.design = design;
        self
    }

    /// Checks that channel count and block size are non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels == 0 {
            return Err(ConfigError::NoChannels);
        }
        if self.max_block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iir::IirOrder;

    #[test]
    fn validate_rejects_empty() {
        assert_eq!(
            ProcessorConfig::new(0, 64).validate(),
            Err(ConfigError::NoChannels)
        );
        assert_eq!(
            ProcessorConfig::new(1, 0).validate(),
            Err(ConfigError::ZeroBlockSize)
        );
        assert_eq!(ProcessorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn builder_sets_design() {
        let design = StageDesign::Iir {
            order: IirOrder::Eight,
        };
        let config = ProcessorConfig::new(1, 32).with_design(design);
        assert_eq!(config.design, design);
        assert_eq!(config.channels, 1);
    }
}
