// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Zoom animations.
//!
//! A plan is a list of target points and a list of legs.  Each leg is
//! a per-frame zoom factor: greater than one dives toward the target,
//! less than one backs away from it.  Every target plays every leg in
//! turn, `frames_per_leg` frames apiece, starting from the home view;
//! after its last leg the view snaps back home for the next target.
//! Frames are numbered from zero across the whole plan.

use error::Result;
use frame::Frame;
use itertools::iproduct;
use num::Complex;
use planes::{ComplexPlane, PlaneMapper};
use render::Renderer;
use saver::FrameSaver;
use std::time::Instant;

/// Zoom in by 1.5% a frame.
pub const ZOOM_IN: f64 = 1.015;

/// Back out by 3% a frame, twice as fast as the dive.
pub const ZOOM_OUT: f64 = 1.0 / 1.03;

/// Seahorse valley, the classic deep-zoom target.
pub const SEAHORSE_VALLEY: (f64, f64) = (-0.743643887037151, 0.131825904205330);

/// Log progress every this many frames.
const PROGRESS_EVERY: usize = 25;

/// What to render, and in what order.
#[derive(Clone, Debug)]
pub struct ZoomPlan {
    /// Points to dive toward, one after the other.
    pub targets: Vec<Complex<f64>>,
    /// Per-frame zoom factors, played in order for every target.
    pub legs: Vec<f64>,
    /// Frames rendered in each leg.
    pub frames_per_leg: usize,
    /// Where every target's first frame is framed.
    pub home: ComplexPlane,
}

impl Default for ZoomPlan {
    fn default() -> ZoomPlan {
        ZoomPlan {
            targets: vec![Complex::new(SEAHORSE_VALLEY.0, SEAHORSE_VALLEY.1)],
            legs: vec![ZOOM_IN, ZOOM_OUT],
            frames_per_leg: 2400,
            home: ComplexPlane::home(),
        }
    }
}

/// One frame of a plan: its number, and the region it shows.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameSpec {
    /// Position in the animation, from zero.
    pub index: usize,
    /// The region of the complex plane this frame shows.
    pub plane: ComplexPlane,
}

/// Walks a plan frame by frame.
pub struct Frames<'a> {
    plan: &'a ZoomPlan,
    steps: Box<dyn Iterator<Item = (usize, usize, usize)> + 'a>,
    current_target: Option<usize>,
    plane: ComplexPlane,
    index: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = FrameSpec;

    fn next(&mut self) -> Option<FrameSpec> {
        let (target, leg, _) = self.steps.next()?;
        if self.current_target != Some(target) {
            self.current_target = Some(target);
            self.plane = self.plan.home;
        }
        let spec = FrameSpec {
            index: self.index,
            plane: self.plane,
        };
        self.plane = self
            .plane
            .zoom(self.plan.targets[target], self.plan.legs[leg]);
        self.index += 1;
        Some(spec)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.steps.size_hint()
    }
}

impl ZoomPlan {
    /// Total frames in the animation.
    pub fn len(&self) -> usize {
        self.targets.len() * self.legs.len() * self.frames_per_leg
    }

    /// Whether the plan renders nothing at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every frame of the animation, in order.
    pub fn frames(&self) -> Frames {
        Frames {
            plan: self,
            steps: Box::new(iproduct!(
                0..self.targets.len(),
                0..self.legs.len(),
                0..self.frames_per_leg
            )),
            current_target: None,
            plane: self.home,
            index: 0,
        }
    }
}

/// Render every frame of `plan` at `width` x `height` with
/// `renderer`, handing each finished frame to `saver`.  Returns the
/// number of frames rendered.  The saver is not finished; the caller
/// still has to wait for it.
pub fn render_sequence<R: Renderer + ?Sized>(
    plan: &ZoomPlan,
    renderer: &mut R,
    width: usize,
    height: usize,
    saver: &FrameSaver,
) -> Result<usize> {
    let total = plan.len();
    let home = PlaneMapper::new(width, height, plan.home)?;
    for target in &plan.targets {
        match home.point_to_pixel(target) {
            Some(pixel) => debug!("target {} sits at pixel {:?} of the home view", target, pixel),
            None => warn!("target {} is outside the home view", target),
        }
    }

    info!(
        "rendering {} frames of {}x{} with the {} renderer, depth {}",
        total,
        width,
        height,
        renderer.name(),
        renderer.depth()
    );
    let started = Instant::now();
    let mut rendered = 0;
    for spec in plan.frames() {
        let mut frame = Frame::new(width, height)?;
        renderer.render(&spec.plane, &mut frame)?;
        saver.submit(spec.index, frame)?;
        rendered += 1;
        if rendered % PROGRESS_EVERY == 0 || rendered == total {
            info!(
                "frames: {}/{}, saver queue: {}, region width: {:e}",
                rendered,
                total,
                saver.pending(),
                spec.plane.width()
            );
        }
    }
    let elapsed = started.elapsed();
    debug!(
        "rendered {} frames in {}.{:03}s",
        rendered,
        elapsed.as_secs(),
        elapsed.subsec_millis()
    );
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpu::CpuRenderer;
    use frame::frame_path;
    use tempfile::tempdir;

    fn plan(targets: usize, legs: Vec<f64>, frames_per_leg: usize) -> ZoomPlan {
        ZoomPlan {
            targets: (0..targets)
                .map(|t| Complex::new(-0.5 - (t as f64) * 0.25, 0.0))
                .collect(),
            legs,
            frames_per_leg,
            home: ComplexPlane::home(),
        }
    }

    #[test]
    fn the_default_plan_dives_then_surfaces() {
        let plan = ZoomPlan::default();
        assert_eq!(plan.len(), 4800);
        assert_eq!(plan.legs, vec![ZOOM_IN, ZOOM_OUT]);
        assert_eq!(plan.home, ComplexPlane::home());
    }

    #[test]
    fn frames_are_numbered_contiguously() {
        let plan = plan(2, vec![2.0, 0.5], 3);
        let indices: Vec<usize> = plan.frames().map(|f| f.index).collect();
        assert_eq!(indices, (0..12).collect::<Vec<_>>());
        assert_eq!(plan.frames().count(), plan.len());
    }

    #[test]
    fn the_first_frame_is_the_home_view() {
        let plan = plan(1, vec![2.0], 3);
        let first = plan.frames().next().unwrap();
        assert_eq!(first.plane, ComplexPlane::home());
    }

    #[test]
    fn each_frame_is_zoomed_from_the_last() {
        let plan = plan(1, vec![2.0], 3);
        let frames: Vec<FrameSpec> = plan.frames().collect();
        let target = plan.targets[0];
        assert_eq!(frames[1].plane, frames[0].plane.zoom(target, 2.0));
        assert_eq!(frames[2].plane, frames[1].plane.zoom(target, 2.0));
        assert_eq!(frames[2].plane.width(), ComplexPlane::home().width() / 4.0);
    }

    #[test]
    fn legs_continue_from_where_the_previous_leg_ended() {
        let plan = plan(1, vec![2.0, 0.5], 2);
        let frames: Vec<FrameSpec> = plan.frames().collect();
        let target = plan.targets[0];
        assert_eq!(frames[2].plane, frames[1].plane.zoom(target, 2.0));
        assert_eq!(frames[3].plane, frames[2].plane.zoom(target, 0.5));
    }

    #[test]
    fn each_target_starts_from_home() {
        let plan = plan(2, vec![2.0], 2);
        let frames: Vec<FrameSpec> = plan.frames().collect();
        assert_eq!(frames[2].index, 2);
        assert_eq!(frames[2].plane, ComplexPlane::home());
        assert_eq!(frames[3].plane, ComplexPlane::home().zoom(plan.targets[1], 2.0));
    }

    #[test]
    fn empty_plans_have_no_frames() {
        assert!(plan(0, vec![2.0], 5).is_empty());
        assert!(plan(1, vec![], 5).is_empty());
        assert_eq!(plan(1, vec![2.0], 0).frames().count(), 0);
    }

    #[test]
    fn sequences_are_rendered_to_numbered_bitmaps() {
        let dir = tempdir().unwrap();
        let plan = plan(1, vec![ZOOM_IN, ZOOM_OUT], 2);
        let saver = FrameSaver::spawn(dir.path(), 2, 2).unwrap();
        let mut renderer = CpuRenderer::new(50, 2);
        let rendered = render_sequence(&plan, &mut renderer, 16, 9, &saver).unwrap();
        assert_eq!(rendered, 4);
        assert_eq!(saver.finish().unwrap(), 4);

        let mut expected = Frame::new(16, 9).unwrap();
        CpuRenderer::new(50, 1)
            .render(&ComplexPlane::home(), &mut expected)
            .unwrap();
        assert_eq!(Frame::load(&frame_path(dir.path(), 0)).unwrap(), expected);
        for index in 1..4 {
            assert!(frame_path(dir.path(), index).is_file());
        }
        assert!(!frame_path(dir.path(), 4).exists());
    }
}
