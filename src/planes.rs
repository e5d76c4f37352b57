//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane with an arbitrary pair of
//! corners defining the leftlower and rightupper corners of the
//! region being rendered.  A zoom animation is nothing more than a
//! series of ComplexPlanes, each a little smaller than the last.
use error::{Error, Result};
use num::Complex;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.  For that reason,
/// the lower-left-hand corner is not included.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the lower-left corner and upper-right corner of the
/// Complex plane, treating the real part of each value as the
/// x-component and the imaginary part of each value as the
/// y-component.  These are the four bounding coordinates handed to a
/// renderer: (xmin, ymin) and (xmax, ymax).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

/// Describes the x, y of a point in a region.  Yes, it's the exact
/// same. Names are important.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

impl ComplexPlane {
    /// Constructor.  Fails unless leftlower really is to the left of
    /// and below rightupper.
    pub fn new(leftlower: Complex<f64>, rightupper: Complex<f64>) -> Result<ComplexPlane> {
        if !(rightupper.re > leftlower.re) {
            return Err(Error::InvalidPlane(
                "The left lower corner is not to the left of the right upper corner.".to_string(),
            ));
        }

        if !(rightupper.im > leftlower.im) {
            return Err(Error::InvalidPlane(
                "The left lower corner is not lower than the right upper corner".to_string(),
            ));
        }

        Ok(ComplexPlane(leftlower, rightupper))
    }

    /// The whole set, framed for a 16:9-ish image.  Every zoom
    /// starts here.
    pub fn home() -> ComplexPlane {
        ComplexPlane(Complex::new(-2.5, -1.0), Complex::new(1.0, 1.0))
    }

    /// Smallest real coordinate.
    pub fn xmin(&self) -> f64 {
        self.0.re
    }

    /// Smallest imaginary coordinate.
    pub fn ymin(&self) -> f64 {
        self.0.im
    }

    /// Largest real coordinate.
    pub fn xmax(&self) -> f64 {
        self.1.re
    }

    /// Largest imaginary coordinate.
    pub fn ymax(&self) -> f64 {
        self.1.im
    }

    /// Extent along the real axis.
    pub fn width(&self) -> f64 {
        self.1.re - self.0.re
    }

    /// Extent along the imaginary axis.
    pub fn height(&self) -> f64 {
        self.1.im - self.0.im
    }

    /// Shrink (factor > 1) or grow (factor < 1) the region by
    /// `factor`, re-centering it on `center`.  The center does not
    /// have to lie inside the current region.
    pub fn zoom(&self, center: Complex<f64>, factor: f64) -> ComplexPlane {
        let half_width = self.width() / factor / 2.0;
        let half_height = self.height() / factor / 2.0;
        ComplexPlane(
            Complex::new(center.re - half_width, center.im - half_height),
            Complex::new(center.re + half_width, center.im + half_height),
        )
    }
}

/// Contains the definitions of two planes: an integral cartesian plane,
/// and a complex, real cartesian plane.  Maps points from one to the
/// other.  Row 0 of the integral plane sits on the complex plane's
/// lowest imaginary coordinate.
#[derive(Debug)]
pub struct PlaneMapper {
    /// The right-upper hand corner of the integral cartesian plane.
    /// The left-lower is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The two coordinates defining the complex cartesian plane,
    /// left-lower and right-upper
    pub complex_plane: ComplexPlane,
    // The size of one pixel, along each axis, measured on the
    // complex plane.
    steps: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane and the
    /// complex plane it should be stretched over.
    pub fn new(width: usize, height: usize, complex_plane: ComplexPlane) -> Result<PlaneMapper> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidPlane(format!(
                "An image of {}x{} pixels has nothing to render.",
                width, height
            )));
        }

        let steps = (
            complex_plane.width() / (width as f64),
            complex_plane.height() / (height as f64),
        );

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            complex_plane,
            steps,
        })
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Given a pixel on the integral cartesian plane, map that as
    /// closely as possible to a point on the complex cartesian plane.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.complex_plane.0.re + (pixel.0 as f64) * self.steps.0,
            self.complex_plane.0.im + (pixel.1 as f64) * self.steps.1,
        )
    }

    /// Given a complex number corresponding to a location on the
    /// complex cartesian plane, map that as closely as possible to a
    /// point on the integral cartesian plane.  Points outside the
    /// plane have no pixel.
    pub fn point_to_pixel(&self, point: &Complex<f64>) -> Option<Pixel> {
        let left = (point.re - self.complex_plane.0.re) / self.steps.0;
        let top = (point.im - self.complex_plane.0.im) / self.steps.1;
        if left < 0.0
            || left >= (self.integral_plane.0 as f64)
            || top < 0.0
            || top >= (self.integral_plane.1 as f64)
        {
            return None;
        }
        Some(Pixel(left as usize, top as usize))
    }
}
