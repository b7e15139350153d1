//! Turning the raw recording into a [`PcmBuffer`].
//!
//! 16-bit PCM WAV goes through [`crate::wav`]. Everything else, including WAV
//! files with other sample encodings, is probed and decoded with Symphonia.

use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::error::{DecodeError, Error, Result};
use crate::pcm::PcmBuffer;
use crate::wav;

/// Read and decode the recording stored at `path`.
pub fn read_source(path: &Path) -> Result<PcmBuffer> {
    let bytes = fs::read(path)?;
    let extension = path.extension().and_then(|ext| ext.to_str());
    decode_source(bytes, extension)
}

/// Decode a recording held in memory.
///
/// `extension` is only a hint for container probing.
pub fn decode_source(bytes: Vec<u8>, extension: Option<&str>) -> Result<PcmBuffer> {
    if bytes.starts_with(b"RIFF") {
        match wav::decode(&bytes) {
            Err(Error::Decode(
                DecodeError::UnsupportedFormatTag(_) | DecodeError::UnsupportedBitDepth(_),
            )) => debug!("WAV encoding is not 16-bit PCM, falling back to symphonia"),
            other => return other,
        }
    }
    decode_container(bytes, extension)
}

fn decode_container(bytes: Vec<u8>, extension: Option<&str>) -> Result<PcmBuffer> {
    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| match err {
            // Running out of bytes while probing means no known marker was found.
            SymphoniaError::IoError(io) if io.kind() == ErrorKind::UnexpectedEof => {
                Error::UnsupportedFormat
            }
            other => Error::from(other),
        })?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or(Error::MissingDefaultTrack)?;
    if track.codec_params.codec == CODEC_TYPE_NULL {
        return Err(Error::UnsupportedFormat);
    }
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(Error::MissingSampleRate)?;
    let mut channel_count = track.codec_params.channels.map(|channels| channels.count());
    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut interleaved = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channel_count = Some(spec.channels.count());
                let mut samples = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                samples.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(samples.samples());
            }
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!("skipping undecodable packet: {reason}");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let channel_count = channel_count.ok_or(Error::UnsupportedFormat)?;
    debug!(
        "decoded {} samples over {channel_count} channels at {sample_rate} Hz",
        interleaved.len()
    );
    PcmBuffer::from_interleaved(channel_count, sample_rate, &interleaved)
}
