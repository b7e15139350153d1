//! Canonical 16-bit linear PCM WAV reading and writing.
//!
//! The writer always emits the 44-byte `RIFF`/`WAVE`/`fmt `/`data` layout. The
//! reader accepts the same layout plus the variations found in the wild:
//! extended `fmt ` chunks and unrelated chunks such as `LIST` between the
//! header and the samples.

use log::debug;

use crate::error::{DecodeError, Error, Result};
use crate::pcm::PcmBuffer;

/// Size of the canonical header written by [`encode`].
pub const HEADER_LEN: usize = 44;

const PCM_FORMAT_TAG: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;
const FMT_CHUNK_LEN: u32 = 16;

/// Format information read from a WAV header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavSpec {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Whole frames covered by the declared `data` chunk size.
    pub frame_count: usize,
}

/// Size fields of the canonical header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct HeaderSizes {
    channels: u16,
    block_align: u16,
    byte_rate: u32,
    data_len: u32,
    riff_len: u32,
}

/// Header size fields for `frames` x `channels` samples, or `None` when any of
/// them overflows its field.
fn header_sizes(frames: usize, channels: usize, sample_rate: u32) -> Option<HeaderSizes> {
    let channels = u16::try_from(channels).ok()?;
    let block_align = channels.checked_mul(BYTES_PER_SAMPLE)?;
    let byte_rate = sample_rate.checked_mul(u32::from(block_align))?;
    let data_len = u32::try_from(frames)
        .ok()?
        .checked_mul(u32::from(block_align))?;
    let riff_len = data_len.checked_add(36)?;

    Some(HeaderSizes {
        channels,
        block_align,
        byte_rate,
        data_len,
        riff_len,
    })
}

/// Serialize `buffer` as a 16-bit PCM WAV file.
pub fn encode(buffer: &PcmBuffer) -> Result<Vec<u8>> {
    let frames = buffer.frame_count();
    let channels = buffer.channel_count();
    let HeaderSizes {
        channels: channel_field,
        block_align,
        byte_rate,
        data_len,
        riff_len,
    } = header_sizes(frames, channels, buffer.sample_rate())
        .ok_or(Error::Encode { frames, channels })?;

    let mut out = Vec::with_capacity(HEADER_LEN + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_len.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    out.extend_from_slice(&channel_field.to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate().to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for frame in 0..frames {
        for channel in buffer.channels() {
            out.extend_from_slice(&quantize(channel[frame]).to_le_bytes());
        }
    }

    debug!(
        "encoded {frames} frames x {channels} channels at {} Hz into {} bytes",
        buffer.sample_rate(),
        out.len()
    );
    Ok(out)
}

/// Parse a 16-bit PCM WAV file into a [`PcmBuffer`].
pub fn decode(bytes: &[u8]) -> Result<PcmBuffer> {
    let (spec, data) = locate(bytes)?;
    let channel_count = usize::from(spec.channels);
    let block_align = channel_count * usize::from(BYTES_PER_SAMPLE);

    let mut channels: Vec<Vec<f32>> = (0..channel_count)
        .map(|_| Vec::with_capacity(spec.frame_count))
        .collect();
    for frame in data.chunks_exact(block_align) {
        for (channel, sample) in channels.iter_mut().zip(frame.chunks_exact(2)) {
            channel.push(dequantize(i16::from_le_bytes([sample[0], sample[1]])));
        }
    }

    debug!(
        "decoded {} frames x {} channels at {} Hz",
        spec.frame_count, spec.channels, spec.sample_rate
    );
    PcmBuffer::new(spec.sample_rate, channels)
}

/// Read the format and length of a WAV file without converting its samples.
pub fn read_spec(bytes: &[u8]) -> Result<WavSpec> {
    let (spec, _) = locate(bytes)?;
    Ok(spec)
}

/// Map a normalized sample onto the full signed 16-bit range.
///
/// Negative values scale by 32768 and non-negative values by 32767, truncating
/// toward zero, so -1.0 and 1.0 land exactly on `i16::MIN` and `i16::MAX`.
pub fn quantize(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32_768.0) as i16
    } else {
        (clamped * 32_767.0) as i16
    }
}

/// Inverse of [`quantize`].
pub fn dequantize(sample: i16) -> f32 {
    if sample < 0 {
        f32::from(sample) / 32_768.0
    } else {
        f32::from(sample) / 32_767.0
    }
}

fn locate(bytes: &[u8]) -> Result<(WavSpec, &[u8]), DecodeError> {
    if bytes.get(0..4) != Some(&b"RIFF"[..]) {
        return Err(DecodeError::MissingRiff);
    }
    if bytes.get(8..12) != Some(&b"WAVE"[..]) {
        return Err(DecodeError::MissingWave);
    }

    let mut format: Option<(u16, u32)> = None;
    let mut offset = 12usize;
    loop {
        let Some(header) = bytes.get(offset..offset.saturating_add(8)) else {
            return Err(if format.is_none() {
                DecodeError::MissingFormat
            } else {
                DecodeError::MissingData
            });
        };
        let id = &header[0..4];
        let declared = le_u32(header, 4) as usize;
        let body_start = offset + 8;
        let available = bytes.len() - body_start;
        if declared > available {
            return Err(DecodeError::Truncated {
                chunk: String::from_utf8_lossy(id).into_owned(),
                declared,
                available,
            });
        }
        let body = &bytes[body_start..body_start + declared];

        match id {
            b"fmt " => format = Some(parse_format(body)?),
            b"data" => {
                let (channels, sample_rate) = format.ok_or(DecodeError::DataBeforeFormat)?;
                let block_align = usize::from(channels) * usize::from(BYTES_PER_SAMPLE);
                let spec = WavSpec {
                    channels,
                    sample_rate,
                    bits_per_sample: BITS_PER_SAMPLE,
                    frame_count: body.len() / block_align,
                };
                return Ok((spec, body));
            }
            _ => {}
        }

        // Chunk bodies are word aligned; odd sizes carry one pad byte.
        offset = body_start + declared + (declared & 1);
    }
}

fn parse_format(body: &[u8]) -> Result<(u16, u32), DecodeError> {
    if body.len() < FMT_CHUNK_LEN as usize {
        return Err(DecodeError::FormatTooShort(body.len() as u32));
    }

    let format_tag = le_u16(body, 0);
    let channels = le_u16(body, 2);
    let sample_rate = le_u32(body, 4);
    let bits_per_sample = le_u16(body, 14);

    if format_tag != PCM_FORMAT_TAG {
        return Err(DecodeError::UnsupportedFormatTag(format_tag));
    }
    if bits_per_sample != BITS_PER_SAMPLE {
        return Err(DecodeError::UnsupportedBitDepth(bits_per_sample));
    }
    if channels == 0 {
        return Err(DecodeError::ZeroChannels);
    }
    if sample_rate == 0 {
        return Err(DecodeError::ZeroSampleRate);
    }

    Ok((channels, sample_rate))
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn stereo_fixture() -> PcmBuffer {
        PcmBuffer::new(
            22_050,
            vec![vec![0.0, 0.5, -0.5, 1.0], vec![-1.0, 0.25, 0.75, -0.125]],
        )
        .unwrap()
    }

    /// Hand-built WAV file with arbitrary chunks inserted after the header.
    fn wav_with_chunks(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (id, data) in chunks {
            body.extend_from_slice(*id);
            body.extend_from_slice(&(data.len() as u32).to_le_bytes());
            body.extend_from_slice(data);
            if data.len() % 2 == 1 {
                body.push(0);
            }
        }
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(4 + body.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(&body);
        out
    }

    fn fmt_body(format_tag: u16, channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
        let block_align = channels * bits / 8;
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&format_tag.to_le_bytes());
        fmt.extend_from_slice(&channels.to_le_bytes());
        fmt.extend_from_slice(&sample_rate.to_le_bytes());
        fmt.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
        fmt.extend_from_slice(&block_align.to_le_bytes());
        fmt.extend_from_slice(&bits.to_le_bytes());
        fmt
    }

    fn samples_body(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn writes_canonical_header() {
        let bytes = encode(&stereo_fixture()).unwrap();
        let data_len = 4 * 2 * 2;

        assert_eq!(bytes.len(), HEADER_LEN + data_len);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(le_u32(&bytes, 4), 36 + data_len as u32);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(le_u32(&bytes, 16), 16);
        assert_eq!(le_u16(&bytes, 20), 1);
        assert_eq!(le_u16(&bytes, 22), 2);
        assert_eq!(le_u32(&bytes, 24), 22_050);
        assert_eq!(le_u32(&bytes, 28), 22_050 * 4);
        assert_eq!(le_u16(&bytes, 32), 4);
        assert_eq!(le_u16(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(le_u32(&bytes, 40), data_len as u32);
    }

    #[test]
    fn interleaves_frames_in_channel_order() {
        let bytes = encode(&stereo_fixture()).unwrap();
        let samples: Vec<i16> = bytes[HEADER_LEN..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(
            samples,
            vec![0, -32_768, 16_383, 8_191, -16_384, 24_575, 32_767, -4_096]
        );
    }

    #[test]
    fn quantize_uses_asymmetric_scale_and_clamps() {
        assert_eq!(quantize(1.0), i16::MAX);
        assert_eq!(quantize(-1.0), i16::MIN);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(3.5), i16::MAX);
        assert_eq!(quantize(-7.0), i16::MIN);
        assert_eq!(quantize(f32::NAN), 0);
        assert_eq!(quantize(-0.000_01), 0);
    }

    #[test]
    fn round_trip_preserves_shape_and_samples() {
        let original = PcmBuffer::new(
            44_100,
            vec![
                (0..500).map(|n| (n as f32 * 0.013).sin()).collect(),
                (0..500).map(|n| (n as f32 * 0.029).cos() * 0.8).collect(),
            ],
        )
        .unwrap();

        let decoded = decode(&encode(&original).unwrap()).unwrap();

        assert_eq!(decoded.channel_count(), original.channel_count());
        assert_eq!(decoded.sample_rate(), original.sample_rate());
        assert_eq!(decoded.frame_count(), original.frame_count());
        for (a, b) in original.channels().iter().zip(decoded.channels()) {
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() <= 1.0 / 32_767.0, "{x} vs {y}");
            }
        }
    }

    #[test]
    fn round_trip_of_empty_buffer() {
        let original = PcmBuffer::silent(1, 0, 8_000).unwrap();
        let bytes = encode(&original).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(decode(&bytes).unwrap(), original);
    }

    #[test]
    fn hound_reads_encoded_output() {
        let bytes = encode(&stereo_fixture()).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 8);
        assert_eq!(samples[1], i16::MIN);
        assert_eq!(samples[6], i16::MAX);
    }

    #[test]
    fn rejects_too_many_channels() {
        let buffer = PcmBuffer::silent(40_000, 0, 8_000).unwrap();
        assert!(matches!(
            encode(&buffer),
            Err(Error::Encode { channels: 40_000, .. })
        ));
    }

    #[test]
    fn header_sizes_overflow_on_long_buffers() {
        let fits = header_sizes(10, 2, 44_100).unwrap();
        assert_eq!(fits.block_align, 4);
        assert_eq!(fits.byte_rate, 176_400);
        assert_eq!(fits.data_len, 40);
        assert_eq!(fits.riff_len, 76);

        // Largest mono buffer whose RIFF size still fits in 32 bits.
        let edge = header_sizes(2_147_483_629, 1, 8_000).unwrap();
        assert_eq!(edge.riff_len, u32::MAX - 1);

        // Data size fits, RIFF size does not.
        assert_eq!(header_sizes(2_147_483_630, 1, 8_000), None);
        // Data size itself overflows.
        assert_eq!(header_sizes(1 << 31, 1, 8_000), None);
        assert_eq!(header_sizes(1 << 30, 3, 8_000), None);
        // Byte rate overflows.
        assert_eq!(header_sizes(1, 2, u32::MAX), None);
    }

    #[test]
    fn decodes_extended_format_and_skips_unknown_chunks() {
        let mut fmt = fmt_body(1, 1, 8_000, 16);
        fmt.extend_from_slice(&0u16.to_le_bytes());
        let bytes = wav_with_chunks(&[
            (b"fmt ", fmt),
            (b"LIST", b"INFOabc".to_vec()),
            (b"data", samples_body(&[0, 32_767, -32_768])),
        ]);

        let buffer = decode(&bytes).unwrap();
        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.sample_rate(), 8_000);
        assert_eq!(buffer.channel(0).unwrap(), &[0.0, 1.0, -1.0]);
    }

    #[test]
    fn uses_declared_data_size() {
        let mut bytes = wav_with_chunks(&[
            (b"fmt ", fmt_body(1, 1, 8_000, 16)),
            (b"data", samples_body(&[1, 2])),
        ]);
        bytes.extend_from_slice(&samples_body(&[3, 4, 5]));

        let spec = read_spec(&bytes).unwrap();
        assert_eq!(spec.frame_count, 2);
        assert_eq!(decode(&bytes).unwrap().frame_count(), 2);
    }

    #[test]
    fn rejects_declared_size_beyond_input() {
        let mut bytes = wav_with_chunks(&[
            (b"fmt ", fmt_body(1, 2, 8_000, 16)),
            (b"data", samples_body(&[1, 2, 3, 4])),
        ]);
        bytes.truncate(bytes.len() - 2);

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::Truncated { declared: 8, available: 6, .. })
        ));
    }

    #[test]
    fn rejects_malformed_containers() {
        assert!(matches!(
            decode(b"not a wav file at all"),
            Err(Error::Decode(DecodeError::MissingRiff))
        ));

        let mut not_wave = wav_with_chunks(&[(b"fmt ", fmt_body(1, 1, 8_000, 16))]);
        not_wave[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(
            decode(&not_wave),
            Err(Error::Decode(DecodeError::MissingWave))
        ));

        let data_first = wav_with_chunks(&[
            (b"data", samples_body(&[0])),
            (b"fmt ", fmt_body(1, 1, 8_000, 16)),
        ]);
        assert!(matches!(
            decode(&data_first),
            Err(Error::Decode(DecodeError::DataBeforeFormat))
        ));

        let no_data = wav_with_chunks(&[(b"fmt ", fmt_body(1, 1, 8_000, 16))]);
        assert!(matches!(
            decode(&no_data),
            Err(Error::Decode(DecodeError::MissingData))
        ));

        let no_fmt = wav_with_chunks(&[(b"LIST", vec![0; 4])]);
        assert!(matches!(
            decode(&no_fmt),
            Err(Error::Decode(DecodeError::MissingFormat))
        ));

        let short_fmt = wav_with_chunks(&[(b"fmt ", vec![1, 0, 1, 0])]);
        assert!(matches!(
            decode(&short_fmt),
            Err(Error::Decode(DecodeError::FormatTooShort(4)))
        ));
    }

    #[test]
    fn rejects_unsupported_encodings() {
        let float = wav_with_chunks(&[
            (b"fmt ", fmt_body(3, 1, 8_000, 32)),
            (b"data", vec![0; 4]),
        ]);
        assert!(matches!(
            decode(&float),
            Err(Error::Decode(DecodeError::UnsupportedFormatTag(3)))
        ));

        let deep = wav_with_chunks(&[
            (b"fmt ", fmt_body(1, 1, 8_000, 24)),
            (b"data", vec![0; 3]),
        ]);
        assert!(matches!(
            decode(&deep),
            Err(Error::Decode(DecodeError::UnsupportedBitDepth(24)))
        ));

        let silent = wav_with_chunks(&[
            (b"fmt ", fmt_body(1, 0, 8_000, 16)),
            (b"data", Vec::new()),
        ]);
        assert!(matches!(
            decode(&silent),
            Err(Error::Decode(DecodeError::ZeroChannels))
        ));
    }
}
