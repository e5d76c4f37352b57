// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The OpenCL renderer.  One kernel launch per frame, over a 2D range
//! the size of the frame, into a device buffer that is read back once
//! the launch's event completes.

use error::{Error, Result};
use frame::Frame;
use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::{Device, CL_DEVICE_TYPE_ALL};
use opencl3::kernel::{ExecuteKernel, Kernel};
use opencl3::memory::{Buffer, ClMem, CL_MEM_WRITE_ONLY};
use opencl3::platform::get_platforms;
use opencl3::program::Program;
use opencl3::types::{cl_double, cl_int, CL_BLOCKING};
use planes::ComplexPlane;
use render::Renderer;
use std::fmt;
use std::ptr;

/// The bundled kernel.
pub const KERNEL_SOURCE: &str = include_str!("mandel.cl");

/// The entry point every kernel source must define.
pub const KERNEL_NAME: &str = "mandelbrot";

fn gpu_error<E: fmt::Display>(what: &'static str) -> impl Fn(E) -> Error {
    move |e| Error::Gpu(format!("{}: {}", what, e))
}

/// Renders frames on the first OpenCL device of the first platform.
pub struct GpuRenderer {
    depth: usize,
    device_name: String,
    // Field order is release order.
    kernel: Kernel,
    buffer: Option<(Buffer<u8>, usize)>,
    _program: Program,
    queue: CommandQueue,
    context: Context,
}

impl fmt::Debug for GpuRenderer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GpuRenderer")
            .field("device_name", &self.device_name)
            .field("depth", &self.depth)
            .finish()
    }
}

impl GpuRenderer {
    /// Compile `source` for the first device and get ready to render.
    /// `source` must define the `mandelbrot` kernel with the argument
    /// list of the bundled `mandel.cl`.
    pub fn new(source: &str, depth: usize) -> Result<GpuRenderer> {
        let platforms = get_platforms().map_err(gpu_error("listing platforms"))?;
        let platform = platforms
            .first()
            .ok_or_else(|| Error::Gpu("no OpenCL platforms found".to_string()))?;
        let device_id = *platform
            .get_devices(CL_DEVICE_TYPE_ALL)
            .map_err(gpu_error("listing devices"))?
            .first()
            .ok_or_else(|| Error::Gpu("the first OpenCL platform has no devices".to_string()))?;
        let device = Device::new(device_id);
        let device_name = device.name().unwrap_or_default();
        info!(
            "OpenCL device: {} on {}",
            device_name,
            platform.name().unwrap_or_default()
        );

        let context = Context::from_device(&device).map_err(gpu_error("creating context"))?;
        let queue = CommandQueue::create_default_with_properties(&context, 0, 0)
            .map_err(gpu_error("creating command queue"))?;
        let program = Program::create_and_build_from_source(&context, source, "")
            .map_err(gpu_error("building kernel"))?;
        let kernel =
            Kernel::create(&program, KERNEL_NAME).map_err(gpu_error("creating kernel"))?;
        debug!("kernel {} built", KERNEL_NAME);

        Ok(GpuRenderer {
            depth,
            device_name,
            kernel,
            buffer: None,
            _program: program,
            queue,
            context,
        })
    }

    // The device buffer is kept between frames and only replaced when
    // the frame size changes.
    fn ensure_buffer(&mut self, len: usize) -> Result<()> {
        if let Some((_, existing)) = self.buffer {
            if existing == len {
                return Ok(());
            }
        }
        self.buffer = None;
        let buffer = unsafe {
            Buffer::<u8>::create(&self.context, CL_MEM_WRITE_ONLY, len, ptr::null_mut())
                .map_err(gpu_error("allocating frame buffer"))?
        };
        debug!("allocated a {} byte device buffer", len);
        self.buffer = Some((buffer, len));
        Ok(())
    }
}

impl Renderer for GpuRenderer {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn render(&mut self, plane: &ComplexPlane, frame: &mut Frame) -> Result<()> {
        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            return Err(Error::InvalidPlane(format!(
                "An image of {}x{} pixels has nothing to render.",
                width, height
            )));
        }
        let len = frame.pixels().len();
        let depth = self.depth as cl_int;
        let args: (cl_int, cl_int) = (width as cl_int, height as cl_int);
        let bounds: [cl_double; 4] = [plane.xmin(), plane.ymin(), plane.xmax(), plane.ymax()];

        self.ensure_buffer(len)?;
        let GpuRenderer {
            ref kernel,
            ref buffer,
            ref queue,
            ..
        } = *self;
        let buffer = match *buffer {
            Some((ref buffer, _)) => buffer,
            None => return Err(Error::Gpu("frame buffer vanished".to_string())),
        };

        let event = unsafe {
            ExecuteKernel::new(kernel)
                .set_arg(&buffer.get())
                .set_arg(&args.0)
                .set_arg(&args.1)
                .set_arg(&bounds[0])
                .set_arg(&bounds[1])
                .set_arg(&bounds[2])
                .set_arg(&bounds[3])
                .set_arg(&depth)
                .set_global_work_sizes(&[width, height])
                .enqueue_nd_range(queue)
                .map_err(gpu_error("launching kernel"))?
        };
        event.wait().map_err(gpu_error("waiting for kernel"))?;

        unsafe {
            queue
                .enqueue_read_buffer(buffer, CL_BLOCKING, 0, frame.pixels_mut(), &[])
                .map_err(gpu_error("reading frame buffer"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpu::CpuRenderer;
    use frame::CHANNELS;
    use num::Complex;

    // Needs an OpenCL device with double precision.
    #[test]
    #[ignore]
    fn gpu_and_cpu_paint_the_same_pixels() {
        let views = [
            ComplexPlane::home(),
            ComplexPlane::new(Complex::new(-0.75, 0.1), Complex::new(-0.74, 0.11)).unwrap(),
        ];
        let mut gpu = GpuRenderer::new(KERNEL_SOURCE, 300).unwrap();
        let mut cpu = CpuRenderer::new(300, 2);
        for view in &views {
            let mut on_gpu = Frame::new(64, 36).unwrap();
            let mut on_cpu = Frame::new(64, 36).unwrap();
            gpu.render(view, &mut on_gpu).unwrap();
            cpu.render(view, &mut on_cpu).unwrap();
            // The device's log() is allowed a few ulps.
            for (g, c) in on_gpu.pixels().iter().zip(on_cpu.pixels()) {
                assert!((*g as i32 - *c as i32).abs() <= 1, "gpu {} cpu {}", g, c);
            }
        }
    }

    #[test]
    #[ignore]
    fn the_device_buffer_follows_the_frame_size() {
        let mut gpu = GpuRenderer::new(KERNEL_SOURCE, 50).unwrap();
        let mut small = Frame::new(8, 8).unwrap();
        gpu.render(&ComplexPlane::home(), &mut small).unwrap();
        let mut large = Frame::new(32, 16).unwrap();
        gpu.render(&ComplexPlane::home(), &mut large).unwrap();
        assert_eq!(gpu.buffer.as_ref().map(|b| b.1), Some(32 * 16 * CHANNELS));
        assert_eq!(gpu.depth(), 50);
    }
}
