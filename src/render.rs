//! The seam between "what region, how big" and "who does the
//! arithmetic".

use cpu::CpuRenderer;
use error::Result;
use frame::Frame;
use planes::ComplexPlane;
use std::fmt;
use std::str::FromStr;

/// Anything that can fill a frame with the view of a region of the
/// complex plane.
pub trait Renderer {
    /// Short name, for the logs.
    fn name(&self) -> &'static str;

    /// The iteration limit per pixel.
    fn depth(&self) -> usize;

    /// Paint every pixel of `frame` with the region `plane`, stretched
    /// to the frame's dimensions.  Returns only when the frame is
    /// complete.
    fn render(&mut self, plane: &ComplexPlane, frame: &mut Frame) -> Result<()>;
}

/// Which renderer to build.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Backend {
    /// Scoped worker threads on the host.
    Cpu,
    /// An OpenCL kernel on the first device of the first platform.
    Gpu,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> ::std::result::Result<Backend, String> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Backend::Cpu),
            "gpu" | "opencl" => Ok(Backend::Gpu),
            other => Err(format!("Unknown backend '{}': expected cpu or gpu", other)),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Backend::Cpu => write!(f, "cpu"),
            Backend::Gpu => write!(f, "gpu"),
        }
    }
}

/// Everything a backend needs to know to be built.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    /// Iteration limit per pixel.
    pub depth: usize,
    /// Worker threads for the CPU backend.
    pub threads: usize,
    /// OpenCL C source to use instead of the bundled kernel.
    pub kernel_source: Option<String>,
}

impl Backend {
    /// Build the renderer this backend names.
    pub fn build(self, settings: &RenderSettings) -> Result<Box<dyn Renderer>> {
        match self {
            Backend::Cpu => Ok(Box::new(CpuRenderer::new(
                settings.depth,
                settings.threads,
            ))),
            Backend::Gpu => build_gpu(settings),
        }
    }
}

#[cfg(feature = "opencl")]
fn build_gpu(settings: &RenderSettings) -> Result<Box<dyn Renderer>> {
    use gpu::{GpuRenderer, KERNEL_SOURCE};
    let source = match settings.kernel_source {
        Some(ref source) => source.as_str(),
        None => KERNEL_SOURCE,
    };
    Ok(Box::new(GpuRenderer::new(source, settings.depth)?))
}

#[cfg(not(feature = "opencl"))]
fn build_gpu(_settings: &RenderSettings) -> Result<Box<dyn Renderer>> {
    Err(::error::Error::GpuUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::Error;

    fn settings() -> RenderSettings {
        RenderSettings {
            depth: 100,
            threads: 2,
            kernel_source: None,
        }
    }

    #[test]
    fn backends_parse() {
        assert_eq!("cpu".parse::<Backend>(), Ok(Backend::Cpu));
        assert_eq!("GPU".parse::<Backend>(), Ok(Backend::Gpu));
        assert_eq!("opencl".parse::<Backend>(), Ok(Backend::Gpu));
        assert!("cuda".parse::<Backend>().is_err());
    }

    #[test]
    fn backends_print_as_they_parse() {
        assert_eq!(Backend::Cpu.to_string(), "cpu");
        assert_eq!(Backend::Gpu.to_string(), "gpu");
    }

    #[test]
    fn the_cpu_backend_always_builds() {
        let renderer = Backend::Cpu.build(&settings()).unwrap();
        assert_eq!(renderer.name(), "cpu");
        assert_eq!(renderer.depth(), 100);
    }

    #[cfg(not(feature = "opencl"))]
    #[test]
    fn the_gpu_backend_needs_the_feature() {
        match Backend::Gpu.build(&settings()) {
            Err(Error::GpuUnavailable) => (),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("built a GPU renderer without OpenCL"),
        }
    }
}
