use std::sync::Arc;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::mix::mix_with_progress;
use crate::pcm::PcmBuffer;
use crate::playback::{Cue, PlaybackSink, PlaybackState, Scheduler};
use crate::progress::{NoProgress, ProgressReporter};
use crate::segment::{segment_with_progress, Segment, SegmentLength};
use crate::source::decode_source;
use crate::wav;

/// Everything one user works on: the recording, its segments and the live playlist.
///
/// Loading a new recording discards the old segments and stops playback.
/// Every segmentation run replaces the segment collection as a whole.
pub struct Session<S, R = StdRng> {
    sink: S,
    rng: R,
    recording: Option<PcmBuffer>,
    segments: Vec<Arc<Segment>>,
    scheduler: Scheduler,
}

impl<S: PlaybackSink> Session<S, StdRng> {
    /// Session with an entropy-seeded random source.
    pub fn new(sink: S) -> Self {
        Self::with_rng(sink, StdRng::from_os_rng())
    }
}

impl<S: PlaybackSink, R: Rng> Session<S, R> {
    pub fn with_rng(sink: S, rng: R) -> Self {
        Self {
            sink,
            rng,
            recording: None,
            segments: Vec::new(),
            scheduler: Scheduler::new(),
        }
    }

    /// Replace the current recording.
    pub fn load_recording(&mut self, recording: PcmBuffer) {
        self.scheduler.stop(&mut self.sink);
        self.segments.clear();
        info!(
            "loaded recording: {} frames x {} channels at {} Hz",
            recording.frame_count(),
            recording.channel_count(),
            recording.sample_rate()
        );
        self.recording = Some(recording);
    }

    /// Decode raw recorder output and make it the current recording.
    pub fn load_source(&mut self, bytes: Vec<u8>, extension: Option<&str>) -> Result<()> {
        let recording = decode_source(bytes, extension)?;
        self.load_recording(recording);
        Ok(())
    }

    pub fn recording(&self) -> Option<&PcmBuffer> {
        self.recording.as_ref()
    }

    /// Split the recording into segments of `seconds` each.
    pub fn split(&mut self, seconds: f64) -> Result<&[Arc<Segment>]> {
        let length = SegmentLength::from_secs_f64(seconds)?;
        self.split_with_progress(length, &mut NoProgress)
    }

    /// Split the recording, reporting progress per segment.
    ///
    /// On failure the previous segment collection is left untouched.
    pub fn split_with_progress<P>(
        &mut self,
        length: SegmentLength,
        reporter: &mut P,
    ) -> Result<&[Arc<Segment>]>
    where
        P: ProgressReporter + ?Sized,
    {
        let recording = self.recording.as_ref().ok_or(Error::NoRecording)?;
        let segments = segment_with_progress(recording, length, reporter)?;

        self.scheduler.stop(&mut self.sink);
        self.segments = segments.into_iter().map(Arc::new).collect();
        info!("split recording into {} segments of {length}", self.segments.len());
        Ok(&self.segments)
    }

    /// Current segment collection in recording order.
    pub fn segments(&self) -> &[Arc<Segment>] {
        &self.segments
    }

    /// WAV encoding of every segment, in recording order.
    pub fn segment_previews(&self) -> Result<Vec<Vec<u8>>> {
        self.segments
            .iter()
            .map(|segment| wav::encode(segment.buffer()))
            .collect()
    }

    /// Shuffle all segments into one stereo WAV file.
    pub fn export_mix(&mut self) -> Result<Vec<u8>> {
        self.export_mix_with_progress(&mut NoProgress)
    }

    pub fn export_mix_with_progress<P>(&mut self, reporter: &mut P) -> Result<Vec<u8>>
    where
        P: ProgressReporter + ?Sized,
    {
        let mixed = mix_with_progress(&self.segments, &mut self.rng, reporter)?;
        wav::encode(&mixed)
    }

    /// Start a fresh shuffled playback of every segment.
    pub fn play(&mut self) -> Result<()> {
        self.scheduler
            .start(&self.segments, &mut self.rng, &mut self.sink)
    }

    /// Pause when playing, otherwise start a new shuffle.
    pub fn toggle_playback(&mut self) -> Result<()> {
        self.scheduler
            .toggle(&self.segments, &mut self.rng, &mut self.sink)
    }

    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    pub fn stop(&mut self) {
        self.scheduler.stop(&mut self.sink);
    }

    /// Forward the sink's "finished" notification for `cue` to the scheduler.
    pub fn segment_finished(&mut self, cue: Cue) -> Result<()> {
        self.scheduler.segment_finished(cue, &mut self.sink)
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
