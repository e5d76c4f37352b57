// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The CPU renderer.  The frame is cut into rows; a pool of scoped
//! worker threads pulls rows off a shared queue until there are none
//! left, so a slow band near the set's boundary doesn't leave the
//! other threads idle.

use crossbeam;
use error::{Error, Result};
use escape::colorize;
use frame::{Frame, CHANNELS};
use planes::{ComplexPlane, Pixel, PlaneMapper};
use render::Renderer;
use std::sync::Mutex;

/// Renders frames with nothing but the host's cores.
#[derive(Debug, Clone)]
pub struct CpuRenderer {
    depth: usize,
    threads: usize,
}

impl CpuRenderer {
    /// `depth` is the iteration limit per pixel; `threads` is clamped
    /// to at least one.
    pub fn new(depth: usize, threads: usize) -> CpuRenderer {
        CpuRenderer {
            depth,
            threads: threads.max(1),
        }
    }

    /// How many workers share a frame.
    pub fn threads(&self) -> usize {
        self.threads
    }
}

/// Colour one row of the frame.
fn paint_row(plane: &PlaneMapper, row: usize, line: &mut [u8], depth: usize) {
    for (column, pixel) in line.chunks_mut(CHANNELS).enumerate() {
        let point = plane.pixel_to_point(&Pixel(column, row));
        pixel.copy_from_slice(&colorize(point, depth).0);
    }
}

impl Renderer for CpuRenderer {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn render(&mut self, plane: &ComplexPlane, frame: &mut Frame) -> Result<()> {
        let mapper = PlaneMapper::new(frame.width(), frame.height(), *plane)?;
        let stride = frame.stride();
        let depth = self.depth;

        if self.threads == 1 {
            for (row, line) in frame.pixels_mut().chunks_mut(stride).enumerate() {
                paint_row(&mapper, row, line, depth);
            }
            return Ok(());
        }

        let rows = Mutex::new(frame.pixels_mut().chunks_mut(stride).enumerate());
        let (rows, mapper) = (&rows, &mapper);
        crossbeam::scope(|spawner| {
            for _ in 0..self.threads {
                spawner.spawn(move |_| loop {
                    let next = match rows.lock() {
                        Ok(mut rows) => rows.next(),
                        Err(_) => None,
                    };
                    match next {
                        Some((row, line)) => paint_row(mapper, row, line, depth),
                        None => break,
                    }
                });
            }
        })
        .map_err(|_| Error::WorkerPanicked("render"))
    }
}
