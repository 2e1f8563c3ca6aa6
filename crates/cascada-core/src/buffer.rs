//! Deinterleaved multichannel audio access.
//!
//! The oversampler only needs per-channel read and write access to the
//! caller's audio, so that contract is expressed as two small traits:
//!
//! - [`Channels`] - per-channel read slices
//! - [`ChannelsMut`] - per-channel write slices
//!
//! Both are implemented for the usual containers (`[&[f32]]`, `[Vec<f32>]`,
//! arrays, `Vec`s) and for [`ChannelBuffer`], the fixed-capacity storage the
//! oversampler uses for its own intermediate and scratch buffers.
//!
//! [`Block`] is the view handed to the processing callback. The callback runs
//! in place, so one `Block` stands in for both the read and write side.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Read access to deinterleaved channels.
pub trait Channels {
    /// Number of channels.
    fn num_channels(&self) -> usize;

    /// Samples of channel `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= num_channels()`.
    fn channel(&self, index: usize) -> &[f32];
}

/// Write access to deinterleaved channels.
pub trait ChannelsMut: Channels {
    /// Mutable samples of channel `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= num_channels()`.
    fn channel_mut(&mut self, index: usize) -> &mut [f32];
}

impl<T: AsRef<[f32]>> Channels for [T] {
    #[inline]
    fn num_channels(&self) -> usize {
        self.len()
    }

    #[inline]
    fn channel(&self, index: usize) -> &[f32] {
        self[index].as_ref()
    }
}

impl<T: AsRef<[f32]> + AsMut<[f32]>> ChannelsMut for [T] {
    #[inline]
    fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        self[index].as_mut()
    }
}

impl<T: AsRef<[f32]>, const N: usize> Channels for [T; N] {
    #[inline]
    fn num_channels(&self) -> usize {
        N
    }

    #[inline]
    fn channel(&self, index: usize) -> &[f32] {
        <[T] as Channels>::channel(self.as_slice(), index)
    }
}

impl<T: AsRef<[f32]> + AsMut<[f32]>, const N: usize> ChannelsMut for [T; N] {
    #[inline]
    fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        <[T] as ChannelsMut>::channel_mut(self.as_mut_slice(), index)
    }
}

impl<T: AsRef<[f32]>> Channels for Vec<T> {
    #[inline]
    fn num_channels(&self) -> usize {
        self.len()
    }

    #[inline]
    fn channel(&self, index: usize) -> &[f32] {
        <[T] as Channels>::channel(self.as_slice(), index)
    }
}

impl<T: AsRef<[f32]> + AsMut<[f32]>> ChannelsMut for Vec<T> {
    #[inline]
    fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        <[T] as ChannelsMut>::channel_mut(self.as_mut_slice(), index)
    }
}

impl<C: Channels + ?Sized> Channels for &C {
    #[inline]
    fn num_channels(&self) -> usize {
        (**self).num_channels()
    }

    #[inline]
    fn channel(&self, index: usize) -> &[f32] {
        (**self).channel(index)
    }
}

impl<C: Channels + ?Sized> Channels for &mut C {
    #[inline]
    fn num_channels(&self) -> usize {
        (**self).num_channels()
    }

    #[inline]
    fn channel(&self, index: usize) -> &[f32] {
        (**self).channel(index)
    }
}

impl<C: ChannelsMut + ?Sized> ChannelsMut for &mut C {
    #[inline]
    fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        (**self).channel_mut(index)
    }
}

/// Fixed-capacity deinterleaved multichannel buffer.
///
/// All channels live in one contiguous allocation, `capacity` samples apart.
/// Storage is only (re)allocated by [`new()`](Self::new) and
/// [`resize()`](Self::resize); everything else is allocation-free.
#[derive(Debug, Default)]
pub struct ChannelBuffer {
    data: Vec<f32>,
    num_channels: usize,
    capacity: usize,
}

impl ChannelBuffer {
    /// Creates a zeroed buffer with `num_channels` channels of `capacity` samples.
    pub fn new(num_channels: usize, capacity: usize) -> Self {
        Self {
            data: vec![0.0; num_channels * capacity],
            num_channels,
            capacity,
        }
    }

    /// Resizes the buffer, zeroing every sample.
    pub fn resize(&mut self, num_channels: usize, capacity: usize) {
        self.data.clear();
        self.data.resize(num_channels * capacity, 0.0);
        self.num_channels = num_channels;
        self.capacity = capacity;
    }

    /// Fills every channel with zeros.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Returns the number of samples per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Channels for ChannelBuffer {
    #[inline]
    fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    fn channel(&self, index: usize) -> &[f32] {
        debug_assert!(index < self.num_channels, "channel {index} out of range");
        let start = index * self.capacity;
        &self.data[start..start + self.capacity]
    }
}

impl ChannelsMut for ChannelBuffer {
    #[inline]
    fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        debug_assert!(index < self.num_channels, "channel {index} out of range");
        let start = index * self.capacity;
        &mut self.data[start..start + self.capacity]
    }
}

/// Copies the first `num_samples` of the first `num_channels` channels.
pub(crate) fn copy_channels<I, O>(
    input: &I,
    output: &mut O,
    num_channels: usize,
    num_samples: usize,
) where
    I: Channels + ?Sized,
    O: ChannelsMut + ?Sized,
{
    for ch in 0..num_channels {
        output.channel_mut(ch)[..num_samples].copy_from_slice(&input.channel(ch)[..num_samples]);
    }
}

/// In-place view of one block of audio, as seen by a processing callback.
///
/// Every channel is truncated to [`len()`](Self::len) samples. At an
/// elevated rate, `len()` is `factor × num_samples`.
pub struct Block<'a> {
    channels: &'a mut dyn ChannelsMut,
    len: usize,
}

impl<'a> Block<'a> {
    /// Wraps the first `len` samples of each channel.
    pub fn new(channels: &'a mut dyn ChannelsMut, len: usize) -> Self {
        debug_assert!(
            (0..channels.num_channels()).all(|ch| channels.channel(ch).len() >= len),
            "block of {len} samples exceeds channel storage"
        );
        Self { channels, len }
    }

    /// Number of samples per channel.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the block holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.num_channels()
    }

    /// Samples of channel `index`.
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels.channel(index)[..self.len]
    }

    /// Mutable samples of channel `index`.
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        let len = self.len;
        &mut self.channels.channel_mut(index)[..len]
    }

    /// Applies `f` to every sample of every channel.
    pub fn for_each_sample(&mut self, mut f: impl FnMut(&mut f32)) {
        for ch in 0..self.num_channels() {
            self.channel_mut(ch).iter_mut().for_each(&mut f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_buffer_layout() {
        let mut buf = ChannelBuffer::new(2, 4);
        assert_eq!(buf.num_channels(), 2);
        assert_eq!(buf.capacity(), 4);

        buf.channel_mut(1).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buf.channel(0), &[0.0; 4]);
        assert_eq!(buf.channel(1), &[1.0, 2.0, 3.0, 4.0]);

        buf.clear();
        assert_eq!(buf.channel(1), &[0.0; 4]);
    }

    #[test]
    fn resize_zeroes() {
        let mut buf = ChannelBuffer::new(1, 2);
        buf.channel_mut(0).fill(5.0);
        buf.resize(3, 8);
        assert_eq!(buf.num_channels(), 3);
        for ch in 0..3 {
            assert_eq!(buf.channel(ch), &[0.0; 8]);
        }
    }

    #[test]
    fn slice_containers() {
        let left = [1.0_f32, 2.0];
        let right = [3.0_f32, 4.0];
        let input: [&[f32]; 2] = [&left, &right];
        assert_eq!(input.num_channels(), 2);
        assert_eq!(input.channel(1), &[3.0, 4.0]);

        let mut output = vec![vec![0.0_f32; 2]; 2];
        output.channel_mut(0).copy_from_slice(input.channel(0));
        assert_eq!(output[0], vec![1.0, 2.0]);
    }

    #[test]
    fn block_truncates_and_maps() {
        let mut buf = ChannelBuffer::new(2, 8);
        buf.channel_mut(0).fill(1.0);
        buf.channel_mut(1).fill(2.0);

        let mut block = Block::new(&mut buf, 3);
        assert_eq!(block.len(), 3);
        assert_eq!(block.num_channels(), 2);
        block.for_each_sample(|s| *s *= 10.0);
        assert_eq!(block.channel(1), &[20.0; 3]);

        assert_eq!(&buf.channel(0)[..4], &[10.0, 10.0, 10.0, 1.0]);
    }
}
