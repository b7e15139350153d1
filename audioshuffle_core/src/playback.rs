//! Sequencing of shuffled segment playback.
//!
//! The scheduler never touches an audio device. It hands one segment at a time
//! to a [`PlaybackSink`] together with a [`Cue`], and waits for the sink's
//! owner to report completion of that cue through
//! [`Scheduler::segment_finished`]. Completions for any other cue are stale
//! and ignored.

use std::sync::Arc;

use log::debug;
use rand::Rng;

use crate::error::{Error, Result, SinkError};
use crate::mix::{shuffle, Playlist};
use crate::segment::Segment;

/// Identifies one hand-off of a segment to the sink.
///
/// Every call to [`PlaybackSink::play`] receives a fresh cue, so a completion
/// reported for a halted segment never matches the one playing now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cue(u64);

/// External collaborator that actually produces sound.
pub trait PlaybackSink {
    /// Start playing `segment` immediately.
    ///
    /// When playback ends the caller must pass `cue` back to
    /// [`Scheduler::segment_finished`].
    fn play(&mut self, segment: &Segment, cue: Cue) -> std::result::Result<(), SinkError>;

    /// Cut the in-flight segment off without waiting for it to end.
    fn halt(&mut self);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    /// The current segment may still be sounding, but nothing else is dequeued.
    Paused,
}

/// State machine driving segment-by-segment shuffled playback.
#[derive(Debug, Default)]
pub struct Scheduler {
    state: PlaybackState,
    playlist: Playlist,
    current: Option<(Cue, Arc<Segment>)>,
    next_cue: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Segment handed to the sink and not yet finished or halted.
    pub fn current(&self) -> Option<&Arc<Segment>> {
        self.current.as_ref().map(|(_, segment)| segment)
    }

    /// Cue of the segment currently handed to the sink.
    pub fn current_cue(&self) -> Option<Cue> {
        self.current.as_ref().map(|(cue, _)| *cue)
    }

    /// Segments still queued behind the current one.
    pub fn remaining(&self) -> usize {
        self.playlist.len()
    }

    /// Begin playing a fresh shuffle of `segments`.
    ///
    /// Anything already playing is halted first; an earlier playlist is never
    /// resumed.
    pub fn start<R, K>(&mut self, segments: &[Arc<Segment>], rng: &mut R, sink: &mut K) -> Result<()>
    where
        R: Rng + ?Sized,
        K: PlaybackSink + ?Sized,
    {
        let playlist = shuffle(segments, rng)?;
        if self.current.take().is_some() {
            sink.halt();
        }
        debug!("starting playback of {} shuffled segments", playlist.len());
        self.playlist = playlist;
        self.state = PlaybackState::Playing;
        self.advance(sink)
    }

    /// Pause if playing, otherwise start a new shuffle.
    pub fn toggle<R, K>(&mut self, segments: &[Arc<Segment>], rng: &mut R, sink: &mut K) -> Result<()>
    where
        R: Rng + ?Sized,
        K: PlaybackSink + ?Sized,
    {
        if self.state == PlaybackState::Playing {
            self.pause();
            Ok(())
        } else {
            self.start(segments, rng, sink)
        }
    }

    /// Stop advancing after the current segment.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            debug!("pausing with {} segments left", self.playlist.len());
            self.state = PlaybackState::Paused;
        }
    }

    /// Drop the playlist and silence the sink at once.
    pub fn stop<K: PlaybackSink + ?Sized>(&mut self, sink: &mut K) {
        self.playlist.clear();
        if self.current.take().is_some() {
            sink.halt();
        }
        if self.state != PlaybackState::Idle {
            debug!("playback stopped");
        }
        self.state = PlaybackState::Idle;
    }

    /// Notification that the segment played under `cue` reached its end.
    ///
    /// Does nothing unless `cue` belongs to the segment currently playing.
    pub fn segment_finished<K>(&mut self, cue: Cue, sink: &mut K) -> Result<()>
    where
        K: PlaybackSink + ?Sized,
    {
        if self.current_cue() != Some(cue) {
            debug!("ignoring stale completion for {cue:?}");
            return Ok(());
        }
        self.current = None;
        match self.state {
            PlaybackState::Playing => self.advance(sink),
            PlaybackState::Paused => {
                self.state = PlaybackState::Idle;
                Ok(())
            }
            PlaybackState::Idle => Ok(()),
        }
    }

    fn advance<K: PlaybackSink + ?Sized>(&mut self, sink: &mut K) -> Result<()> {
        let Some(segment) = self.playlist.pop_front() else {
            debug!("playlist exhausted");
            self.state = PlaybackState::Idle;
            return Ok(());
        };

        let cue = Cue(self.next_cue);
        self.next_cue = self.next_cue.wrapping_add(1);
        if let Err(err) = sink.play(&segment, cue) {
            self.playlist.clear();
            self.state = PlaybackState::Idle;
            return Err(Error::Playback(err));
        }
        self.current = Some((cue, segment));
        Ok(())
    }
}
