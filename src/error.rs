// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single error type shared by the renderers, the frame saver and
//! the stitcher.

use image::ImageError;
use std::io;
use std::path::Path;

/// Everything that can go wrong while rendering, saving or stitching
/// frames.
#[derive(Debug, Fail)]
pub enum Error {
    /// The complex plane's corners are in the wrong order, or the
    /// integral plane has no area.
    #[fail(display = "invalid plane: {}", _0)]
    InvalidPlane(String),

    /// A frame does not have the dimensions the sequence started with.
    #[fail(
        display = "frame {} is {}x{}, expected {}x{}",
        path, width, height, expected_width, expected_height
    )]
    FrameSize {
        /// The offending frame.
        path: String,
        /// Its width.
        width: usize,
        /// Its height.
        height: usize,
        /// Width of the first frame of the sequence.
        expected_width: usize,
        /// Height of the first frame of the sequence.
        expected_height: usize,
    },

    /// A pixel buffer that does not match its stated dimensions.
    #[fail(display = "bad pixel buffer: {}", _0)]
    PixelBuffer(String),

    /// A frame the sequence names is not on disk.
    #[fail(display = "missing frame: {}", _0)]
    MissingFrame(String),

    /// The external video encoder failed.
    #[fail(display = "video encoder failed: {}", _0)]
    Encoder(String),

    /// An OpenCL call failed.
    #[fail(display = "OpenCL: {}", _0)]
    Gpu(String),

    /// The GPU backend was requested from a build without it.
    #[fail(display = "this build has no GPU backend; rebuild with --features opencl")]
    GpuUnavailable,

    /// Every frame saver worker has stopped.
    #[fail(display = "the frame saver is no longer accepting frames")]
    SaverClosed,

    /// A worker thread panicked.
    #[fail(display = "a {} worker panicked", _0)]
    WorkerPanicked(&'static str),

    /// Filesystem or pipe failure.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),

    /// Bitmap encoding or decoding failure.
    #[fail(display = "image error: {}", _0)]
    Image(#[cause] ImageError),
}

impl Error {
    pub(crate) fn missing(path: &Path) -> Error {
        Error::MissingFrame(path.display().to_string())
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<ImageError> for Error {
    fn from(e: ImageError) -> Error {
        Error::Image(e)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = ::std::result::Result<T, Error>;
