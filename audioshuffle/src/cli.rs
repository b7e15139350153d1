mod duration;

use std::path::PathBuf;

use clap::{builder::ValueParser, value_parser, Arg, ArgAction, Command};

use duration::parse_duration;

pub const DEFAULT_POSTFIX: &str = "part";

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .about("Cut a recording into equal segments and write them back in random order")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("length")
                .short('l')
                .long("length")
                .value_name("DURATION")
                .help("Length of each segment between 0.1 and 2 seconds (e.g. 500ms, 0.5s, 0.5)")
                .required(true)
                .value_parser(ValueParser::new(parse_duration)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("Directory where the mix and segment files will be written")
                .default_value(".")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("postfix")
                .short('p')
                .long("postfix")
                .value_name("POSTFIX")
                .help("Postfix inserted into segment file names")
                .default_value(DEFAULT_POSTFIX),
        )
        .arg(
            Arg::new("segments")
                .long("segments")
                .help("Also write every segment to its own WAV file")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .help("Seed the shuffle for a reproducible mix")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("FILE")
                .help("File name of the mix (defaults to shuffled_mix_<timestamp>.wav)"),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Allow overwriting existing files in the output directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print the files that would be written without writing them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("file_path")
                .value_name("FILE_PATH")
                .help("Path to the input recording")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
}
