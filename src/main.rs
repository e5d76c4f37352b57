// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! mandelzoom: render a Mandelbrot zoom animation as numbered bitmaps.
//!
//! For every target point the animation starts from the whole set,
//! dives toward the point, then backs out again, one frame per step.
//! Frames land in the output directory as `0.bmp`, `1.bmp`, ... ready
//! for `stitch` to turn into a video.

extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate mandelzoom;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use failure::ResultExt;
use mandelzoom::args::{parse_complex, parse_size, validate_pair, validate_range, validate_size};
use mandelzoom::saver::clear_frames;
use mandelzoom::{render_sequence, Backend, ComplexPlane, FrameSaver, RenderSettings, ZoomPlan};
use num::Complex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const FRAMES: &str = "frames";
const DEPTH: &str = "depth";
const POINT: &str = "point";
const ZOOMIN: &str = "zoom-in";
const ZOOMOUT: &str = "zoom-out";
const THREADS: &str = "threads";
const BACKEND: &str = "backend";
const KERNEL: &str = "kernel";
const QUEUE: &str = "queue";
const WRITERS: &str = "writers";
const KEEP: &str = "keep";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandelzoom")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Renders a Mandelbrot zoom animation as numbered bitmaps")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("frames")
                .help("Directory the frames are written to"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1920x1080")
                .validator(|s| validate_size(&s))
                .help("Size of each frame"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .long(FRAMES)
                .short("f")
                .takes_value(true)
                .default_value("2400")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse frame count",
                        "Frames per leg must be between 1 and 1000000",
                    )
                })
                .help("Frames in each leg (the dive, and the climb back out)"),
        )
        .arg(
            Arg::with_name(DEPTH)
                .long(DEPTH)
                .short("d")
                .takes_value(true)
                .default_value("10000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        10_000_000,
                        "Could not parse iteration depth",
                        "Iteration depth must be between 1 and 10000000",
                    )
                })
                .help("Iterations per pixel before a point is declared inside the set"),
        )
        .arg(
            Arg::with_name(POINT)
                .long(POINT)
                .short("p")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .allow_hyphen_values(true)
                .default_value("-0.743643887037151,0.131825904205330")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse target point"))
                .help("Point to zoom toward, as re,im; repeat for several dives"),
        )
        .arg(
            Arg::with_name(ZOOMIN)
                .long(ZOOMIN)
                .takes_value(true)
                .default_value("1.015")
                .validator(|s| {
                    validate_range(
                        &s,
                        1.0001,
                        10.0,
                        "Could not parse zoom factor",
                        "Zoom factor must be between 1.0001 and 10",
                    )
                })
                .help("Magnification per frame on the way in"),
        )
        .arg(
            Arg::with_name(ZOOMOUT)
                .long(ZOOMOUT)
                .takes_value(true)
                .default_value("1.03")
                .validator(|s| {
                    validate_range(
                        &s,
                        1.0001,
                        10.0,
                        "Could not parse zoom factor",
                        "Zoom factor must be between 1.0001 and 10",
                    )
                })
                .help("Demagnification per frame on the way out"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in the CPU renderer [default: all cores]"),
        )
        .arg(
            Arg::with_name(BACKEND)
                .long(BACKEND)
                .short("b")
                .takes_value(true)
                .possible_values(&["cpu", "gpu"])
                .default_value("cpu")
                .help("Where the fractal is computed"),
        )
        .arg(
            Arg::with_name(KERNEL)
                .long(KERNEL)
                .short("k")
                .takes_value(true)
                .help("OpenCL source to use instead of the bundled kernel"),
        )
        .arg(
            Arg::with_name(QUEUE)
                .long(QUEUE)
                .short("q")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        10_000,
                        "Could not parse queue size",
                        "Queue size must be between 1 and 10000",
                    )
                })
                .help("Finished frames allowed to wait for a writer"),
        )
        .arg(
            Arg::with_name(WRITERS)
                .long(WRITERS)
                .short("w")
                .takes_value(true)
                .default_value("2")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        64,
                        "Could not parse writer count",
                        "Writer count must be between 1 and 64",
                    )
                })
                .help("Threads writing frames to disk"),
        )
        .arg(
            Arg::with_name(KEEP)
                .long(KEEP)
                .help("Leave numbered bitmaps from an earlier run in place"),
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

    let (width, height) = matches
        .value_of(SIZE)
        .and_then(parse_size)
        .ok_or_else(|| format_err!("Error parsing image dimensions"))?;
    let targets = matches
        .values_of(POINT)
        .map(|points| points.filter_map(parse_complex).collect::<Vec<Complex<f64>>>())
        .unwrap_or_default();
    if targets.is_empty() {
        bail!("No target points to zoom toward");
    }

    let plan = ZoomPlan {
        targets,
        legs: vec![value::<f64>(&matches, ZOOMIN)?, 1.0 / value::<f64>(&matches, ZOOMOUT)?],
        frames_per_leg: value(&matches, FRAMES)?,
        home: ComplexPlane::home(),
    };

    let kernel_source = match matches.value_of(KERNEL) {
        Some(path) => Some(
            fs::read_to_string(path).context(format!("Could not read kernel source {}", path))?,
        ),
        None => None,
    };
    let settings = RenderSettings {
        depth: value(&matches, DEPTH)?,
        threads: match matches.value_of(THREADS) {
            Some(_) => value(&matches, THREADS)?,
            None => num_cpus::get(),
        },
        kernel_source,
    };
    let backend: Backend = value(&matches, BACKEND)?;
    let mut renderer = backend.build(&settings)?;

    let dir = Path::new(matches.value_of(OUTPUT).unwrap_or("frames"));
    if !matches.is_present(KEEP) {
        clear_frames(dir)?;
    }
    let saver = FrameSaver::spawn(dir, value(&matches, QUEUE)?, value(&matches, WRITERS)?)?;
    let saver_dir = saver.dir().to_path_buf();

    // Queued frames are written even when rendering fails.
    let rendered = render_sequence(&plan, &mut *renderer, width, height, &saver);
    info!("waiting for {} queued frames to be written", saver.pending());
    let written = saver.finish()?;
    let rendered = rendered?;
    info!(
        "{} frames rendered, {} written to {}",
        rendered,
        written,
        saver_dir.display()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        error!("Render failure: {}", e);
        for cause in e.iter_causes() {
            error!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
