//! Assembling a directory of numbered bitmaps into a video.
//!
//! Frames are streamed to the encoder one at a time; nothing but the
//! frame in flight is held in memory.

use error::{Error, Result};
use frame::{frame_path, Frame};
use std::path::{Path, PathBuf};
use video::{EncoderSettings, VideoEncoder};

/// Log progress every this many frames.
const PROGRESS_EVERY: usize = 100;

/// The numbered frames `dir/{first}.bmp` up to, not including,
/// `dir/{last}.bmp`.  With no `last` the sequence ends at the first
/// number with no file.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    /// Where the frames are.
    pub dir: PathBuf,
    /// The first frame number.
    pub first: usize,
    /// One past the last frame number, if the range is fixed.
    pub last: Option<usize>,
}

impl FrameSequence {
    /// Every frame in `dir` from `first` until one is missing.
    pub fn open_ended(dir: &Path, first: usize) -> FrameSequence {
        FrameSequence {
            dir: dir.to_path_buf(),
            first,
            last: None,
        }
    }

    /// Exactly the frames `first..last`; each of them must exist.
    pub fn range(dir: &Path, first: usize, last: usize) -> FrameSequence {
        FrameSequence {
            dir: dir.to_path_buf(),
            first,
            last: Some(last),
        }
    }

    /// Where frame `index` lives.
    pub fn path(&self, index: usize) -> PathBuf {
        frame_path(&self.dir, index)
    }

    /// The frame paths, in order.  For an open-ended sequence this
    /// stops at the first gap; for a fixed range it names every frame
    /// whether or not it exists.
    pub fn paths(&self) -> Vec<PathBuf> {
        match self.last {
            Some(last) => (self.first..last).map(|i| self.path(i)).collect(),
            None => (self.first..)
                .map(|i| self.path(i))
                .take_while(|path| path.is_file())
                .collect(),
        }
    }
}

/// Load a frame and check it against the size of the first one.
fn load_matching(path: &Path, width: usize, height: usize) -> Result<Frame> {
    let frame = Frame::load(path)?;
    if frame.width() != width || frame.height() != height {
        return Err(Error::FrameSize {
            path: path.display().to_string(),
            width: frame.width(),
            height: frame.height(),
            expected_width: width,
            expected_height: height,
        });
    }
    Ok(frame)
}

/// Encode every frame of `sequence` into the video `settings`
/// describes.  Returns the number of frames encoded.  Nothing is
/// spawned unless the first frame can be read and, for a fixed
/// range, every frame is on disk.  If anything fails once ffmpeg is
/// running, ffmpeg is stopped and the partial video removed.
pub fn stitch(sequence: &FrameSequence, settings: &EncoderSettings) -> Result<usize> {
    let paths = sequence.paths();
    if let Some(missing) = paths.iter().find(|path| !path.is_file()) {
        return Err(Error::missing(missing));
    }
    let first = match paths.first() {
        Some(path) => Frame::load(path)?,
        None => return Err(Error::missing(&sequence.path(sequence.first))),
    };
    let (width, height) = (first.width(), first.height());
    info!(
        "stitching {} frames of {}x{} from {} into {} at {} fps",
        paths.len(),
        width,
        height,
        sequence.dir.display(),
        settings.output.display(),
        settings.fps
    );

    let mut encoder = VideoEncoder::spawn(settings, width, height)?;
    if let Err(e) = feed(&mut encoder, first, &paths[1..]) {
        encoder.abort();
        return Err(e);
    }
    let frames = encoder.finish()?;
    info!("wrote {}", settings.output.display());
    Ok(frames)
}

fn feed(encoder: &mut VideoEncoder, first: Frame, rest: &[PathBuf]) -> Result<()> {
    let (width, height) = (first.width(), first.height());
    let total = rest.len() + 1;
    encoder.write_frame(&first)?;
    for path in rest {
        let frame = load_matching(path, width, height)?;
        encoder.write_frame(&frame)?;
        if encoder.frames() % PROGRESS_EVERY == 0 {
            info!("frames: {}/{}", encoder.frames(), total);
        }
    }
    Ok(())
}
