use std::time::Duration;

use crate::error::{Error, Result};

/// Planar multi-channel buffer of normalized `f32` samples at a fixed sample rate.
///
/// Every channel holds exactly [`frame_count`](Self::frame_count) samples, there
/// is at least one channel and the sample rate is non-zero. Values are expected
/// to lie in `[-1.0, 1.0]`; the WAV encoder clamps anything outside that range.
#[derive(Clone, Debug, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    /// Build a buffer from per-channel sample vectors.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidBuffer("sample rate must be greater than zero"));
        }
        let Some(first) = channels.first() else {
            return Err(Error::InvalidBuffer("at least one channel is required"));
        };
        let frames = first.len();
        if channels.iter().any(|channel| channel.len() != frames) {
            return Err(Error::InvalidBuffer("channels differ in length"));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Allocate a zero-filled buffer.
    pub fn silent(channel_count: usize, frame_count: usize, sample_rate: u32) -> Result<Self> {
        if channel_count == 0 {
            return Err(Error::InvalidBuffer("at least one channel is required"));
        }
        Self::new(sample_rate, vec![vec![0.0; frame_count]; channel_count])
    }

    /// Build a buffer from frame-interleaved samples.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(channel_count: usize, sample_rate: u32, samples: &[f32]) -> Result<Self> {
        if channel_count == 0 {
            return Err(Error::InvalidBuffer("at least one channel is required"));
        }
        let frames = samples.len() / channel_count;
        let mut channels: Vec<Vec<f32>> = (0..channel_count)
            .map(|_| Vec::with_capacity(frames))
            .collect();
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Samples of one channel, or `None` when `index` is out of range.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Playing time of the buffer.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / f64::from(self.sample_rate))
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_shapes() {
        assert!(matches!(
            PcmBuffer::new(0, vec![vec![0.0]]),
            Err(Error::InvalidBuffer(_))
        ));
        assert!(matches!(
            PcmBuffer::new(44_100, Vec::new()),
            Err(Error::InvalidBuffer(_))
        ));
        assert!(matches!(
            PcmBuffer::new(44_100, vec![vec![0.0; 3], vec![0.0; 2]]),
            Err(Error::InvalidBuffer(_))
        ));
        assert!(matches!(
            PcmBuffer::silent(0, 10, 44_100),
            Err(Error::InvalidBuffer(_))
        ));
    }

    #[test]
    fn deinterleaves_frames() {
        let buffer =
            PcmBuffer::from_interleaved(2, 8_000, &[0.1, -0.1, 0.2, -0.2, 0.3]).unwrap();
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.1, 0.2]);
        assert_eq!(buffer.channel(1).unwrap(), &[-0.1, -0.2]);
        assert!(buffer.channel(2).is_none());
    }

    #[test]
    fn empty_buffer_is_allowed() {
        let buffer = PcmBuffer::silent(1, 0, 48_000).unwrap();
        assert_eq!(buffer.frame_count(), 0);
        assert_eq!(buffer.duration(), Duration::ZERO);
    }

    #[test]
    fn reports_duration() {
        let buffer = PcmBuffer::silent(2, 22_050, 44_100).unwrap();
        assert_eq!(buffer.duration(), Duration::from_millis(500));
    }
}
