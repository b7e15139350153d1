use std::fmt;
use std::time::Duration;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::pcm::PcmBuffer;
use crate::progress::{NoProgress, ProgressReporter, Stage, StageProgress};

/// Shortest accepted segment length in seconds.
pub const MIN_SEGMENT_SECS: f64 = 0.1;
/// Longest accepted segment length in seconds.
pub const MAX_SEGMENT_SECS: f64 = 2.0;

/// Segment length validated to lie in `[0.1, 2.0]` seconds.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct SegmentLength(f64);

impl SegmentLength {
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        if !(MIN_SEGMENT_SECS..=MAX_SEGMENT_SECS).contains(&secs) {
            return Err(Error::InvalidDuration(secs));
        }
        Ok(Self(secs))
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0
    }

    /// Frames per segment at `sample_rate`, rounded down.
    pub fn frames_at(self, sample_rate: u32) -> usize {
        (self.0 * f64::from(sample_rate)).floor() as usize
    }
}

impl TryFrom<Duration> for SegmentLength {
    type Error = Error;

    fn try_from(duration: Duration) -> Result<Self> {
        Self::from_secs_f64(duration.as_secs_f64())
    }
}

impl fmt::Display for SegmentLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// One fixed-length slice of a recording.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    index: usize,
    length: SegmentLength,
    buffer: PcmBuffer,
}

impl Segment {
    pub fn new(index: usize, length: SegmentLength, buffer: PcmBuffer) -> Self {
        Self {
            index,
            length,
            buffer,
        }
    }

    /// 0-based position of the segment in the original recording.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn length(&self) -> SegmentLength {
        self.length
    }

    pub fn buffer(&self) -> &PcmBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> PcmBuffer {
        self.buffer
    }

    /// Human readable label, numbered from 1.
    pub fn label(&self) -> String {
        format!("Segment {} ({})", self.index + 1, self.length)
    }
}

impl AsRef<Segment> for Segment {
    fn as_ref(&self) -> &Segment {
        self
    }
}

/// Layout of a segmentation run, computed without touching any samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentPlan {
    pub segment_frames: usize,
    pub segment_count: usize,
    /// Trailing frames that do not fill a whole segment and are dropped.
    pub discarded_frames: usize,
}

/// Work out how a recording of `frame_count` frames splits into segments.
pub fn plan(frame_count: usize, sample_rate: u32, length: SegmentLength) -> Result<SegmentPlan> {
    let segment_frames = length.frames_at(sample_rate);
    let insufficient = Error::InsufficientDuration {
        frames: frame_count,
        segment_frames,
    };
    if segment_frames == 0 {
        return Err(insufficient);
    }

    let segment_count = frame_count / segment_frames;
    if segment_count == 0 {
        return Err(insufficient);
    }

    Ok(SegmentPlan {
        segment_frames,
        segment_count,
        discarded_frames: frame_count - segment_count * segment_frames,
    })
}

/// Split `source` into consecutive segments of `seconds` each.
pub fn segment(source: &PcmBuffer, seconds: f64) -> Result<Vec<Segment>> {
    let length = SegmentLength::from_secs_f64(seconds)?;
    segment_with_progress(source, length, &mut NoProgress)
}

/// Split `source` into consecutive segments, reporting one unit per segment.
///
/// Frames past the last whole segment are discarded.
pub fn segment_with_progress<P>(
    source: &PcmBuffer,
    length: SegmentLength,
    reporter: &mut P,
) -> Result<Vec<Segment>>
where
    P: ProgressReporter + ?Sized,
{
    let SegmentPlan {
        segment_frames,
        segment_count,
        discarded_frames,
    } = plan(source.frame_count(), source.sample_rate(), length)?;
    debug!(
        "splitting {} frames into {segment_count} segments of {segment_frames} frames",
        source.frame_count()
    );
    if discarded_frames > 0 {
        warn!("discarding {discarded_frames} trailing frames that do not fill a segment");
    }

    let mut progress = StageProgress::start(reporter, Stage::Segmenting, segment_count);
    let mut segments = Vec::with_capacity(segment_count);
    for index in 0..segment_count {
        let start = index * segment_frames;
        let end = start + segment_frames;
        let channels = source
            .channels()
            .iter()
            .map(|channel| channel[start..end].to_vec())
            .collect();
        let buffer = PcmBuffer::new(source.sample_rate(), channels)?;
        segments.push(Segment::new(index, length, buffer));
        progress.advance();
    }
    progress.finish();

    Ok(segments)
}
