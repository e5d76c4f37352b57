#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot zoom animations
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which iterating `z = z² + c` from zero never runs off to
//! infinity.  Colouring every other point by how quickly it escapes
//! gives the familiar picture, and because the boundary is infinitely
//! detailed you can keep zooming into it forever.
//!
//! This crate renders such a zoom as a numbered series of bitmaps
//! (on the CPU, or on an OpenCL device with the `opencl` feature),
//! writing them from a background saver while the next frame is being
//! computed, and then stitches the bitmaps into a video with ffmpeg.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate ffmpeg_sidecar;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
#[cfg(feature = "opencl")]
extern crate opencl3;

#[cfg(test)]
extern crate tempfile;

pub mod args;
pub mod cpu;
pub mod error;
pub mod escape;
pub mod frame;
#[cfg(feature = "opencl")]
pub mod gpu;
pub mod planes;
pub mod render;
pub mod saver;
pub mod stitch;
pub mod video;
pub mod zoom;

pub use cpu::CpuRenderer;
pub use error::{Error, Result};
pub use frame::Frame;
#[cfg(feature = "opencl")]
pub use gpu::GpuRenderer;
pub use planes::{ComplexPlane, PlaneMapper};
pub use render::{Backend, RenderSettings, Renderer};
pub use saver::FrameSaver;
pub use stitch::{stitch, FrameSequence};
pub use video::{EncoderSettings, VideoEncoder};
pub use zoom::{render_sequence, ZoomPlan};
