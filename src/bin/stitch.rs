//! stitch: assemble numbered bitmaps into a video.

extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate mandelzoom;

use clap::{App, Arg, ArgMatches};
use mandelzoom::args::validate_range;
use mandelzoom::{stitch, EncoderSettings, FrameSequence};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const INPUT: &str = "input";
const OUTPUT: &str = "output";
const FIRST: &str = "first";
const LAST: &str = "last";
const FPS: &str = "fps";
const CRF: &str = "crf";
const FFMPEG: &str = "ffmpeg";

fn args<'a>() -> ArgMatches<'a> {
    App::new("stitch")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Assembles numbered bitmaps (0.bmp, 1.bmp, ...) into a video")
        .arg(
            Arg::with_name(INPUT)
                .long(INPUT)
                .short("i")
                .takes_value(true)
                .default_value("frames")
                .help("Directory holding the frames"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("output.mp4")
                .help("Video file to write"),
        )
        .arg(
            Arg::with_name(FIRST)
                .long(FIRST)
                .takes_value(true)
                .default_value("0")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        usize::max_value(),
                        "Could not parse first frame",
                        "First frame out of range",
                    )
                })
                .help("Number of the first frame"),
        )
        .arg(
            Arg::with_name(LAST)
                .long(LAST)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        usize::max_value(),
                        "Could not parse last frame",
                        "Last frame out of range",
                    )
                })
                .help("One past the number of the last frame [default: stop at the first gap]"),
        )
        .arg(
            Arg::with_name(FPS)
                .long(FPS)
                .short("r")
                .takes_value(true)
                .default_value("30")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        240,
                        "Could not parse frame rate",
                        "Frame rate must be between 1 and 240",
                    )
                })
                .help("Frames per second"),
        )
        .arg(
            Arg::with_name(CRF)
                .long(CRF)
                .takes_value(true)
                .default_value("18")
                .validator(|s| {
                    validate_range(
                        &s,
                        0,
                        51,
                        "Could not parse quality",
                        "Quality must be between 0 and 51",
                    )
                })
                .help("x264 constant rate factor; lower is better"),
        )
        .arg(
            Arg::with_name(FFMPEG)
                .long(FFMPEG)
                .takes_value(true)
                .default_value("ffmpeg")
                .help("The ffmpeg executable"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, failure::Error> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| format_err!("Could not parse --{}", name))
}

fn run() -> Result<(), failure::Error> {
    let matches = args();
    let dir = Path::new(matches.value_of(INPUT).unwrap_or("frames"));
    let first: usize = value(&matches, FIRST)?;
    let sequence = match matches.value_of(LAST) {
        Some(_) => {
            let last: usize = value(&matches, LAST)?;
            if last <= first {
                bail!("--last ({}) must be greater than --first ({})", last, first);
            }
            FrameSequence::range(dir, first, last)
        }
        None => FrameSequence::open_ended(dir, first),
    };

    let settings = EncoderSettings {
        ffmpeg: PathBuf::from(matches.value_of(FFMPEG).unwrap_or("ffmpeg")),
        fps: value(&matches, FPS)?,
        output: PathBuf::from(matches.value_of(OUTPUT).unwrap_or("output.mp4")),
        crf: value(&matches, CRF)?,
    };

    let frames = stitch(&sequence, &settings)?;
    info!("video created from {} frames", frames);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        error!("Stitch failure: {}", e);
        for cause in e.iter_causes() {
            error!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
