use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::mix::mix_with_progress;
use crate::progress::{NoProgress, ProgressReporter, Stage, StageProgress};
use crate::segment::{self, segment_with_progress, SegmentLength, SegmentPlan};
use crate::source::read_source;
use crate::wav;

/// File name prefix of exported mixes.
pub const EXPORT_PREFIX: &str = "shuffled_mix_";

/// Default file name of a mix exported at `timestamp`.
///
/// The timestamp is written without punctuation, e.g.
/// `shuffled_mix_20240305T070809.wav`.
pub fn export_file_name(timestamp: DateTime<Utc>) -> String {
    format!("{EXPORT_PREFIX}{}.wav", timestamp.format("%Y%m%dT%H%M%S"))
}

/// Configuration for a split-and-mix run over files.
#[derive(Clone, Debug)]
pub struct Config {
    /// Canonicalized path of the recording.
    pub input_path: PathBuf,
    /// Canonicalized directory into which the output files will be written.
    pub output_dir: PathBuf,
    pub segment_length: SegmentLength,
    /// Postfix inserted into segment file names.
    pub postfix: String,
    /// Whether existing files in the output directory may be replaced.
    pub overwrite: bool,
    /// Also write every segment to its own WAV file.
    pub write_segments: bool,
    /// Seed for the shuffle; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// File name of the mix inside `output_dir`.
    ///
    /// Defaults to [`export_file_name`] at the moment the config is built, so
    /// [`plan`] and [`run`] agree on it.
    pub mix_name: String,
}

impl Config {
    /// Construct a new [`Config`] with default options.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>, S: Into<String>>(
        input: P,
        output: Q,
        segment_length: Duration,
        postfix: S,
    ) -> Result<Self> {
        Self::builder(input, output, segment_length, postfix).build()
    }

    pub fn builder<P: AsRef<Path>, Q: AsRef<Path>, S: Into<String>>(
        input: P,
        output: Q,
        segment_length: Duration,
        postfix: S,
    ) -> ConfigBuilder {
        ConfigBuilder {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            segment_length,
            postfix: postfix.into(),
            overwrite: false,
            write_segments: false,
            seed: None,
            mix_name: None,
        }
    }

    fn mix_path(&self) -> PathBuf {
        self.output_dir.join(&self.mix_name)
    }

    fn segment_paths(&self, count: usize) -> Result<Vec<PathBuf>> {
        if !self.write_segments {
            return Ok(Vec::new());
        }
        let base_name = self
            .input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or(Error::InvalidInputName)?;
        let pad_width = num_width(count as u64);

        Ok((1..=count)
            .map(|index| {
                self.output_dir.join(format!(
                    "{base_name}_{}_{index:0pad_width$}.wav",
                    self.postfix
                ))
            })
            .collect())
    }
}

/// Builder for [`Config`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    input: PathBuf,
    output: PathBuf,
    segment_length: Duration,
    postfix: String,
    overwrite: bool,
    write_segments: bool,
    seed: Option<u64>,
    mix_name: Option<String>,
}

impl ConfigBuilder {
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn write_segments(mut self, write_segments: bool) -> Self {
        self.write_segments = write_segments;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn mix_name<S: Into<String>>(mut self, name: Option<S>) -> Self {
        self.mix_name = name.map(Into::into);
        self
    }

    /// Validate the segment length and mix name, and canonicalize both paths.
    ///
    /// The mix name must be a bare file name so the mix lands in the output
    /// directory.
    pub fn build(self) -> Result<Config> {
        let segment_length = SegmentLength::try_from(self.segment_length)?;
        let mix_name = self
            .mix_name
            .unwrap_or_else(|| export_file_name(Utc::now()));
        if Path::new(&mix_name).file_name() != Some(OsStr::new(&mix_name)) {
            return Err(Error::InvalidMixName(mix_name));
        }
        let input_path = fs::canonicalize(&self.input)?;
        let output_dir = fs::canonicalize(&self.output)?;

        Ok(Config {
            input_path,
            output_dir,
            segment_length,
            postfix: self.postfix,
            overwrite: self.overwrite,
            write_segments: self.write_segments,
            seed: self.seed,
            mix_name,
        })
    }
}

/// Files a run would produce.
#[derive(Clone, Debug)]
pub struct Plan {
    pub layout: SegmentPlan,
    /// Empty unless [`Config::write_segments`] is set.
    pub segment_paths: Vec<PathBuf>,
    pub mix_path: PathBuf,
}

/// Outcome of a successful [`run`].
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub layout: SegmentPlan,
    pub segment_paths: Vec<PathBuf>,
    pub mix_path: PathBuf,
    pub mix_frames: usize,
}

/// Work out which files [`run`] would write, without writing anything.
pub fn plan(config: &Config) -> Result<Plan> {
    let bytes = fs::read(&config.input_path)?;
    let (frames, sample_rate) = match wav::read_spec(&bytes) {
        Ok(spec) => (spec.frame_count, spec.sample_rate),
        Err(_) => {
            let recording = read_source(&config.input_path)?;
            (recording.frame_count(), recording.sample_rate())
        }
    };
    let layout = segment::plan(frames, sample_rate, config.segment_length)?;
    let segment_paths = config.segment_paths(layout.segment_count)?;
    let mix_path = config.mix_path();
    check_distinct(&segment_paths, &mix_path)?;

    Ok(Plan {
        layout,
        segment_paths,
        mix_path,
    })
}

/// Split the recording, shuffle the segments and write the mix.
pub fn run(config: Config) -> Result<RunSummary> {
    run_with_progress(config, &mut NoProgress)
}

/// Like [`run`], reporting progress for segmenting, mixing and writing.
///
/// Every output path is checked before the first byte is written, so a
/// failed run leaves the output directory untouched.
pub fn run_with_progress<P>(config: Config, reporter: &mut P) -> Result<RunSummary>
where
    P: ProgressReporter + ?Sized,
{
    if !config.output_dir.is_dir() {
        return Err(Error::MissingOutputDirectory(config.output_dir.clone()));
    }

    info!("reading '{}'", config.input_path.display());
    let recording = read_source(&config.input_path)?;
    let layout = segment::plan(
        recording.frame_count(),
        recording.sample_rate(),
        config.segment_length,
    )?;
    let segments = segment_with_progress(&recording, config.segment_length, reporter)?;
    drop(recording);

    let segment_paths = config.segment_paths(segments.len())?;
    let mix_path = config.mix_path();
    check_distinct(&segment_paths, &mix_path)?;
    if !config.overwrite {
        if let Some(existing) = segment_paths
            .iter()
            .chain(std::iter::once(&mix_path))
            .find(|path| path.exists())
        {
            return Err(Error::OutputExists(existing.clone()));
        }
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mixed = mix_with_progress(&segments, &mut rng, reporter)?;
    let mix_frames = mixed.frame_count();
    let mix_bytes = wav::encode(&mixed)?;
    drop(mixed);

    let mut progress = StageProgress::start(reporter, Stage::Writing, segment_paths.len() + 1);
    for (segment, path) in segments.iter().zip(&segment_paths) {
        fs::write(path, wav::encode(segment.buffer())?)?;
        debug!("wrote {}", path.display());
        progress.advance();
    }
    fs::write(&mix_path, mix_bytes)?;
    progress.advance();
    progress.finish();
    info!(
        "wrote {} segment files and mix '{}'",
        segment_paths.len(),
        mix_path.display()
    );

    Ok(RunSummary {
        layout,
        segment_paths,
        mix_path,
        mix_frames,
    })
}

fn check_distinct(segment_paths: &[PathBuf], mix_path: &Path) -> Result<()> {
    if segment_paths.iter().any(|path| path == mix_path) {
        return Err(Error::OutputConflict(mix_path.to_path_buf()));
    }
    Ok(())
}

fn num_width(mut value: u64) -> usize {
    let mut width = 1;
    while value >= 10 {
        value /= 10;
        width += 1;
    }
    width
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn export_name_strips_timestamp_punctuation() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(
            export_file_name(timestamp),
            "shuffled_mix_20240305T070809.wav"
        );
    }

    #[test]
    fn pads_segment_numbers_to_count_width() {
        assert_eq!(num_width(0), 1);
        assert_eq!(num_width(9), 1);
        assert_eq!(num_width(10), 2);
        assert_eq!(num_width(12_345), 5);
    }
}
