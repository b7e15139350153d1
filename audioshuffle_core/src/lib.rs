//! Sample-accurate slicing of a recording into short segments, and reassembly
//! of those segments in random order as live playback or one exported WAV.
//!
//! The pieces compose as: [`source`] decodes the raw recording into a
//! [`PcmBuffer`], [`segment()`] slices it, [`mix()`] or the playback
//! [`Scheduler`] reorders the slices, and [`wav`] turns buffers into bytes.
//! [`Session`] ties them together for interactive use and [`run`] does the
//! whole job over files.

pub mod error;
pub mod export;
pub mod mix;
pub mod pcm;
pub mod playback;
pub mod progress;
pub mod segment;
pub mod session;
pub mod source;
pub mod wav;

pub use error::{DecodeError, Error, Result, SinkError};
pub use export::{
    export_file_name, plan, run, run_with_progress, Config, ConfigBuilder, Plan, RunSummary,
};
pub use mix::{concat, mix, mix_with_progress, shuffle, Playlist};
pub use pcm::PcmBuffer;
pub use playback::{Cue, PlaybackSink, PlaybackState, Scheduler};
pub use progress::{NoProgress, ProgressEvent, ProgressReporter, Stage};
pub use segment::{segment, segment_with_progress, Segment, SegmentLength, SegmentPlan};
pub use session::Session;
