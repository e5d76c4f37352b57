//! snapshot: render a single still of a region of the Mandelbrot set.
//!
//! The one-shot counterpart of `mandelzoom`, handy for checking a
//! kernel or framing a target before committing to an animation.

extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate mandelzoom;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use failure::ResultExt;
use mandelzoom::args::{parse_complex, parse_size, validate_pair, validate_range, validate_size};
use mandelzoom::{Backend, ComplexPlane, Frame, RenderSettings};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const DEPTH: &str = "depth";
const BACKEND: &str = "backend";
const KERNEL: &str = "kernel";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("snapshot")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Renders one still of the Mandelbrot set")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("mandelbrot.png")
                .help("Output image; the extension picks the format"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1920x1080")
                .validator(|s| validate_size(&s))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.5,-1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the mandelbrot space"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1.0,1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the mandelbrot space"),
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
            Arg::with_name(DEPTH)
                .long(DEPTH)
                .short("d")
                .takes_value(true)
                .default_value("1000")
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
        .get_matches()
}

fn run() -> Result<(), failure::Error> {
    let matches = args();
    let (width, height) = matches
        .value_of(SIZE)
        .and_then(parse_size)
        .ok_or_else(|| format_err!("Error parsing image dimensions"))?;
    let leftlower = matches
        .value_of(LEFTLOWER)
        .and_then(parse_complex)
        .ok_or_else(|| format_err!("Error parsing left lower point"))?;
    let rightupper = matches
        .value_of(RIGHTUPPER)
        .and_then(parse_complex)
        .ok_or_else(|| format_err!("Error parsing right upper point"))?;
    let plane = ComplexPlane::new(leftlower, rightupper)?;

    let depth = matches
        .value_of(DEPTH)
        .and_then(|s| usize::from_str(s).ok())
        .ok_or_else(|| format_err!("Could not parse iteration depth"))?;
    let threads = match matches.value_of(THREADS) {
        Some(s) => usize::from_str(s).context("Could not parse thread count")?,
        None => num_cpus::get(),
    };
    let kernel_source = match matches.value_of(KERNEL) {
        Some(path) => Some(
            fs::read_to_string(path).context(format!("Could not read kernel source {}", path))?,
        ),
        None => None,
    };
    let backend = matches
        .value_of(BACKEND)
        .unwrap_or("cpu")
        .parse::<Backend>()
        .map_err(|e| format_err!("{}", e))?;

    let mut renderer = backend.build(&RenderSettings {
        depth,
        threads,
        kernel_source,
    })?;

    let started = Instant::now();
    let mut frame = Frame::new(width, height)?;
    renderer.render(&plane, &mut frame)?;
    let elapsed = started.elapsed();
    info!(
        "rendered {}x{} on {} in {}.{:03}s",
        width,
        height,
        renderer.name(),
        elapsed.as_secs(),
        elapsed.subsec_millis()
    );

    let output = Path::new(matches.value_of(OUTPUT).unwrap_or("mandelbrot.png"));
    frame.save(output)?;
    info!("wrote {}", output.display());
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
