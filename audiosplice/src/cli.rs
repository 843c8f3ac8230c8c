mod duration;

use std::path::PathBuf;

use clap::{builder::ValueParser, value_parser, Arg, ArgAction, Command};

use duration::parse_duration;

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Split one recording into several time-shifted, equal-length WAV files")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("count")
                .short('n')
                .long("count")
                .value_name("COUNT")
                .help("Number of files to produce (at least 2)")
                .required(true)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("offset")
                .short('s')
                .long("offset")
                .value_name("DURATION")
                .help("Offset between successive files; a bare number is seconds (e.g. 2, 1500ms)")
                .required(true)
                .value_parser(ValueParser::new(parse_duration)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("Directory for 1.wav, 2.wav, ... [default: the input file's directory]")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("no-ramps")
                .long("no-ramps")
                .help("Do not fade each file in and out over 20 ms")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Preview the generated files without writing them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("file_path")
                .value_name("FILE_PATH")
                .help("Path to the input WAV file")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
}
