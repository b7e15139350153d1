//! Random reordering of segments, for live playback or a single exported mix.

use std::collections::VecDeque;
use std::sync::Arc;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};
use crate::pcm::PcmBuffer;
use crate::progress::{NoProgress, ProgressReporter, Stage, StageProgress};
use crate::segment::Segment;

/// Channel count of every mix produced by [`concat`].
pub const MIX_CHANNELS: usize = 2;

/// Queue of segments consumed front to back during playback.
#[derive(Clone, Debug, Default)]
pub struct Playlist {
    queue: VecDeque<Arc<Segment>>,
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Remove and return the next segment to play.
    pub fn pop_front(&mut self) -> Option<Arc<Segment>> {
        self.queue.pop_front()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Segment>> {
        self.queue.iter()
    }
}

/// Uniformly random permutation of `0..len` (Fisher-Yates).
pub fn permutation<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order
}

/// Build a playlist holding every segment once, in uniformly random order.
pub fn shuffle<R: Rng + ?Sized>(segments: &[Arc<Segment>], rng: &mut R) -> Result<Playlist> {
    if segments.is_empty() {
        return Err(Error::EmptyInput);
    }

    let queue = permutation(segments.len(), rng)
        .into_iter()
        .map(|index| Arc::clone(&segments[index]))
        .collect();
    Ok(Playlist { queue })
}

/// Concatenate all segments, in a freshly drawn random order, into one stereo buffer.
pub fn mix<S, R>(segments: &[S], rng: &mut R) -> Result<PcmBuffer>
where
    S: AsRef<Segment>,
    R: Rng + ?Sized,
{
    mix_with_progress(segments, rng, &mut NoProgress)
}

pub fn mix_with_progress<S, R, P>(segments: &[S], rng: &mut R, reporter: &mut P) -> Result<PcmBuffer>
where
    S: AsRef<Segment>,
    R: Rng + ?Sized,
    P: ProgressReporter + ?Sized,
{
    if segments.is_empty() {
        return Err(Error::EmptyInput);
    }
    let order = permutation(segments.len(), rng);
    concat(segments, &order, reporter)
}

/// Concatenate `segments` back to back in the given `order` into a stereo buffer.
///
/// `order` must list every segment index exactly once. Mono segments are
/// copied to both output channels and stereo segments map one to one. With
/// more than two channels, channel `c` feeds output `c % 2` and each output
/// takes the mean of the channels that feed it.
pub fn concat<S, P>(segments: &[S], order: &[usize], reporter: &mut P) -> Result<PcmBuffer>
where
    S: AsRef<Segment>,
    P: ProgressReporter + ?Sized,
{
    let first = segments.first().ok_or(Error::EmptyInput)?;
    if !is_permutation(order, segments.len()) {
        return Err(Error::InvalidOrder);
    }

    let sample_rate = first.as_ref().buffer().sample_rate();
    let mut total_frames = 0usize;
    for segment in segments {
        let buffer = segment.as_ref().buffer();
        if buffer.sample_rate() != sample_rate {
            return Err(Error::InconsistentFormat {
                expected: sample_rate,
                found: buffer.sample_rate(),
            });
        }
        total_frames = total_frames
            .checked_add(buffer.frame_count())
            .ok_or(Error::InvalidBuffer("mix length overflows"))?;
    }
    debug!(
        "mixing {} segments into {total_frames} stereo frames at {sample_rate} Hz",
        segments.len()
    );

    let mut output = PcmBuffer::silent(MIX_CHANNELS, total_frames, sample_rate)?;
    let mut progress = StageProgress::start(reporter, Stage::Mixing, order.len());
    let mut offset = 0;
    for &index in order {
        let buffer = segments[index].as_ref().buffer();
        write_stereo(output.channels_mut(), offset, buffer);
        offset += buffer.frame_count();
        progress.advance();
    }
    progress.finish();

    Ok(output)
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    order
        .iter()
        .all(|&index| index < len && !std::mem::replace(&mut seen[index], true))
}

fn write_stereo(output: &mut [Vec<f32>], offset: usize, source: &PcmBuffer) {
    let frames = source.frame_count();
    let (left, right) = output.split_at_mut(1);
    let targets = [
        &mut left[0][offset..offset + frames],
        &mut right[0][offset..offset + frames],
    ];

    match source.channels() {
        [mono] => {
            for target in targets {
                target.copy_from_slice(mono);
            }
        }
        [l, r] => {
            let [left, right] = targets;
            left.copy_from_slice(l);
            right.copy_from_slice(r);
        }
        many => {
            for (side, target) in targets.into_iter().enumerate() {
                let feeding: Vec<&Vec<f32>> = many.iter().skip(side).step_by(2).collect();
                let scale = 1.0 / feeding.len() as f32;
                for (frame, sample) in target.iter_mut().enumerate() {
                    *sample = feeding.iter().map(|channel| channel[frame]).sum::<f32>() * scale;
                }
            }
        }
    }
}
