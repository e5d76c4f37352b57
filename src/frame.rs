//! A single still image of an animation, and the numbered bitmap
//! files frames are kept in between rendering and stitching.

use error::{Error, Result};
use image;
use image::bmp::BMPEncoder;
use image::{ColorType, Rgb};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Bytes per pixel: red, green, blue.
pub const CHANNELS: usize = 3;

/// A row-major RGB frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

/// The most pixels a frame may have along either axis.  Bitmap
/// encoders take `u32` dimensions and kernels `int` ones.
pub const MAX_DIMENSION: usize = i32::max_value() as usize;

/// Bytes needed for a `width` x `height` RGB frame, if such a frame
/// can exist at all.
pub fn frame_len(width: usize, height: usize) -> Result<usize> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::PixelBuffer(format!(
            "a {}x{} frame is larger than {} pixels on a side",
            width, height, MAX_DIMENSION
        )));
    }
    width
        .checked_mul(height)
        .and_then(|area| area.checked_mul(CHANNELS))
        .ok_or_else(|| {
            Error::PixelBuffer(format!("a {}x{} frame does not fit in memory", width, height))
        })
}

impl Frame {
    /// A black frame.
    pub fn new(width: usize, height: usize) -> Result<Frame> {
        Ok(Frame {
            width,
            height,
            pixels: vec![0 as u8; frame_len(width, height)?],
        })
    }

    /// Wrap an existing RGB buffer.  The buffer must be exactly
    /// `width * height * 3` bytes.
    pub fn from_rgb(width: usize, height: usize, pixels: Vec<u8>) -> Result<Frame> {
        if pixels.len() != frame_len(width, height)? {
            return Err(Error::PixelBuffer(format!(
                "{} bytes cannot hold a {}x{} RGB frame",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Frame {
            width,
            height,
            pixels,
        })
    }

    /// Read a frame from any bitmap format the `image` crate knows.
    pub fn load(path: &Path) -> Result<Frame> {
        if !path.is_file() {
            return Err(Error::missing(path));
        }
        let img = image::open(path)?.to_rgb();
        let (width, height) = img.dimensions();
        Frame::from_rgb(width as usize, height as usize, img.into_raw())
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The raw RGB bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The raw RGB bytes, for renderers to fill in.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// One row's worth of bytes.
    pub fn stride(&self) -> usize {
        self.width * CHANNELS
    }

    /// The colour at x, y.
    pub fn get_pixel(&self, x: usize, y: usize) -> Rgb<u8> {
        let offset = (y * self.width + x) * CHANNELS;
        Rgb([
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ])
    }

    /// Paint x, y.
    pub fn set_pixel(&mut self, x: usize, y: usize, colour: Rgb<u8>) {
        let offset = (y * self.width + x) * CHANNELS;
        self.pixels[offset..offset + CHANNELS].copy_from_slice(&colour.0);
    }

    /// Write the frame out as a 24-bit BMP.
    pub fn save_bmp(&self, path: &Path) -> Result<()> {
        let mut output = BufWriter::new(File::create(path)?);
        BMPEncoder::new(&mut output).encode(
            &self.pixels,
            self.width as u32,
            self.height as u32,
            ColorType::RGB(8),
        )?;
        output.flush()?;
        Ok(())
    }

    /// Write the frame in whatever format the path's extension names.
    pub fn save(&self, path: &Path) -> Result<()> {
        image::save_buffer(
            path,
            &self.pixels,
            self.width as u32,
            self.height as u32,
            ColorType::RGB(8),
        )?;
        Ok(())
    }
}

/// Where frame `index` lives inside `dir`: `dir/{index}.bmp`.
pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{}.bmp", index))
}

/// If `path` names a numbered frame, its number.
pub fn frame_index(path: &Path) -> Option<usize> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("bmp") => {
            path.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse().ok())
        }
        _ => None,
    }
}
