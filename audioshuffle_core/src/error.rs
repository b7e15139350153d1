use std::path::PathBuf;

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

/// Boxed error reported by a [`crate::PlaybackSink`] implementation.
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while decoding, segmenting, mixing or exporting audio.
#[derive(Debug, Error)]
pub enum Error {
    /// The input bytes are not a WAV container this crate can read.
    #[error("failed to decode WAV data: {0}")]
    Decode(#[from] DecodeError),

    /// The buffer is too large to be described by the 32-bit WAV size fields.
    #[error("buffer of {frames} frames x {channels} channels does not fit in a WAV container")]
    Encode { frames: usize, channels: usize },

    /// Error returned when the segment length lies outside the accepted range.
    #[error("segment length must be between 0.1 and 2.0 seconds, got {0}")]
    InvalidDuration(f64),

    /// Error returned when the recording is shorter than a single segment.
    #[error("recording of {frames} frames is shorter than one segment of {segment_frames} frames")]
    InsufficientDuration { frames: usize, segment_frames: usize },

    /// Error returned when segments with different sample rates are mixed together.
    #[error("segments disagree on sample rate: expected {expected} Hz, found {found} Hz")]
    InconsistentFormat { expected: u32, found: u32 },

    /// Error returned when there is nothing to shuffle, mix or play.
    #[error("no segments to shuffle, mix or play")]
    EmptyInput,

    /// A PCM buffer would violate its shape invariants.
    #[error("invalid PCM buffer: {0}")]
    InvalidBuffer(&'static str),

    /// A mix order is not a permutation of the segment indices.
    #[error("mix order is not a permutation of the segments")]
    InvalidOrder,

    /// The session has no recording loaded.
    #[error("no recording has been loaded")]
    NoRecording,

    /// The playback collaborator refused to play a segment.
    #[error("playback failed: {0}")]
    Playback(#[source] SinkError),

    /// Error returned when the raw source is not in a container we can probe.
    #[error("unsupported audio format")]
    UnsupportedFormat,

    /// Error returned when the decoder track lacks a sample rate.
    #[error("input stream does not advertise a sample rate")]
    MissingSampleRate,

    /// Error returned when the container does not expose any default track.
    #[error("input stream does not provide a default track")]
    MissingDefaultTrack,

    /// Wrapper around errors produced by the Symphonia decoding library.
    #[error(transparent)]
    Symphonia(SymphoniaError),

    /// Wrapper around IO errors encountered while reading or writing files.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error returned when the output directory disappeared after configuration.
    #[error("output directory does not exist: {0}")]
    MissingOutputDirectory(PathBuf),

    /// Error returned when a target file exists and overwriting is disabled.
    #[error("refusing to overwrite existing file: {0}")]
    OutputExists(PathBuf),

    /// Error returned when two outputs of the same run share a path.
    #[error("mix and segment would both be written to {0}")]
    OutputConflict(PathBuf),

    /// Error returned when the mix name is not a bare file name.
    #[error("mix name must be a plain file name, got '{0}'")]
    InvalidMixName(String),

    /// Error produced when a file name cannot be derived from the input path.
    #[error("failed to derive a base name for the input file")]
    InvalidInputName,
}

impl From<SymphoniaError> for Error {
    fn from(err: SymphoniaError) -> Self {
        match err {
            SymphoniaError::Unsupported(_) => Error::UnsupportedFormat,
            SymphoniaError::IoError(io) => Error::Io(io),
            other => Error::Symphonia(other),
        }
    }
}

/// Reasons a byte buffer is rejected by [`crate::wav::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The first four bytes are not `RIFF`.
    #[error("missing RIFF header")]
    MissingRiff,

    /// The RIFF form type is not `WAVE`.
    #[error("missing WAVE form type")]
    MissingWave,

    /// The chunk list ended before a `fmt ` chunk.
    #[error("missing fmt chunk")]
    MissingFormat,

    /// A `fmt ` chunk was found but no `data` chunk follows it.
    #[error("missing data chunk")]
    MissingData,

    /// The samples start before the format is known.
    #[error("data chunk appears before the fmt chunk")]
    DataBeforeFormat,

    /// The `fmt ` chunk is shorter than the 16 bytes of a PCM header.
    #[error("fmt chunk is {0} bytes, expected at least 16")]
    FormatTooShort(u32),

    /// The format tag is not linear PCM.
    #[error("unsupported format tag {0:#06x}, only PCM is supported")]
    UnsupportedFormatTag(u16),

    /// The samples are not 16 bits wide.
    #[error("unsupported bit depth {0}, only 16-bit PCM is supported")]
    UnsupportedBitDepth(u16),

    /// The header declares no channels.
    #[error("WAV header declares zero channels")]
    ZeroChannels,

    /// The header declares a sample rate of zero.
    #[error("WAV header declares a zero sample rate")]
    ZeroSampleRate,

    /// A chunk claims more bytes than remain in the input.
    #[error("chunk '{chunk}' declares {declared} bytes but only {available} are available")]
    Truncated {
        chunk: String,
        declared: usize,
        available: usize,
    },
}
