//! Escape-time iteration and the smooth HSV colouring applied to it.
//!
//! Every backend colours a pixel the same way: iterate `z = z² + c`
//! until `|z|² >= 4` or the depth runs out.  Points that never escape
//! are black.  Points that do are given a fractional "smooth" count,
//! `n + 1 - log2(ln |z|)`, which divided by the depth becomes a hue
//! on a fully saturated, full-value HSV wheel.  The OpenCL kernel in
//! `mandel.cl` performs exactly these steps.

use image::Rgb;
use num::{clamp, Complex};

/// The outcome of iterating a single point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Escape {
    /// The orbit stayed bounded for the whole depth.
    Inside,
    /// The orbit left the radius-2 disc after `iterations` steps,
    /// landing on `z`.
    Escaped {
        /// Number of iterations performed, at least 1.
        iterations: usize,
        /// The first point of the orbit outside the disc.
        z: Complex<f64>,
    },
}

/// Iterate the point `c` up to `depth` times.
#[inline]
pub fn escape_time(c: Complex<f64>, depth: usize) -> Escape {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    let mut iterations = 0;
    while z.norm_sqr() < 4.0 && iterations < depth {
        z = z * z + c;
        iterations += 1;
    }
    if iterations == depth {
        Escape::Inside
    } else {
        Escape::Escaped { iterations, z }
    }
}

/// The hue, nominally in [0, 1), for an escaped orbit.
#[inline]
pub fn smooth_hue(iterations: usize, z: Complex<f64>, depth: usize) -> f64 {
    let modulus = z.norm_sqr().sqrt();
    let smooth = (iterations as f64) + 1.0 - modulus.ln().ln() / ::std::f64::consts::LN_2;
    smooth / (depth as f64)
}

/// Convert an HSV triple, each component in [0, 1], to eight-bit RGB.
/// A negative hue has no sector and comes back black.
pub fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb<u8> {
    let sector = (hue * 6.0).floor();
    let f = hue * 6.0 - sector;
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - f * saturation);
    let t = value * (1.0 - (1.0 - f) * saturation);

    let (r, g, b) = match (sector as i64) % 6 {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        5 => (value, p, q),
        _ => (0.0, 0.0, 0.0),
    };

    Rgb([channel(r), channel(g), channel(b)])
}

#[inline]
fn channel(v: f64) -> u8 {
    clamp((v * 255.0) as i32, 0, 255) as u8
}

/// Iterate and colour the point `c`.
#[inline]
pub fn colorize(c: Complex<f64>, depth: usize) -> Rgb<u8> {
    match escape_time(c, depth) {
        Escape::Inside => Rgb([0, 0, 0]),
        Escape::Escaped { iterations, z } => hsv_to_rgb(smooth_hue(iterations, z, depth), 1.0, 1.0),
    }
}
