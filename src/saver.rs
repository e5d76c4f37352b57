//! Writing frames to disk while the next ones are being rendered.
//!
//! Frames go into a bounded channel; a small pool of writer threads
//! drains it into numbered bitmaps.  When the writers fall behind the
//! channel fills and `submit` blocks, which throttles the renderer
//! instead of letting finished frames pile up in memory.

use crossbeam::channel::{bounded, Receiver, Sender};
use error::{Error, Result};
use frame::{frame_index, frame_path, Frame};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// The default number of finished frames allowed to wait for a writer.
pub const DEFAULT_CAPACITY: usize = 100;

/// A pool of writer threads fed by a bounded queue.
pub struct FrameSaver {
    sender: Option<Sender<(usize, Frame)>>,
    workers: Vec<JoinHandle<Result<usize>>>,
    dir: PathBuf,
}

fn write_frames(dir: PathBuf, frames: Receiver<(usize, Frame)>) -> Result<usize> {
    let mut written = 0;
    for (index, frame) in frames.iter() {
        let path = frame_path(&dir, index);
        frame.save_bmp(&path)?;
        trace!("wrote {}", path.display());
        written += 1;
    }
    Ok(written)
}

impl FrameSaver {
    /// Start `workers` writer threads (at least one) saving into `dir`,
    /// with room for `capacity` frames (at least one) in the queue.
    /// `dir` is created if it does not exist.
    pub fn spawn(dir: &Path, capacity: usize, workers: usize) -> Result<FrameSaver> {
        fs::create_dir_all(dir)?;
        let (sender, receiver) = bounded(capacity.max(1));
        let workers = (0..workers.max(1))
            .map(|_| {
                let dir = dir.to_path_buf();
                let receiver = receiver.clone();
                thread::spawn(move || write_frames(dir, receiver))
            })
            .collect();
        debug!(
            "frame saver started in {} with room for {} frames",
            dir.display(),
            capacity.max(1)
        );
        Ok(FrameSaver {
            sender: Some(sender),
            workers,
            dir: dir.to_path_buf(),
        })
    }

    /// The directory frames are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Queue frame `index` for writing, blocking while the queue is
    /// full.
    pub fn submit(&self, index: usize, frame: Frame) -> Result<()> {
        match self.sender {
            Some(ref sender) => sender
                .send((index, frame))
                .map_err(|_| Error::SaverClosed),
            None => Err(Error::SaverClosed),
        }
    }

    /// Frames waiting for a writer.
    pub fn pending(&self) -> usize {
        self.sender.as_ref().map_or(0, |sender| sender.len())
    }

    /// Close the queue, wait for every queued frame to be written,
    /// and return how many were.  The first writer error wins.
    pub fn finish(mut self) -> Result<usize> {
        self.sender = None;
        let mut written = 0;
        let mut failure = None;
        for worker in self.workers.drain(..) {
            match worker.join() {
                Ok(Ok(count)) => written += count,
                Ok(Err(e)) => {
                    failure.get_or_insert(e);
                }
                Err(_) => {
                    failure.get_or_insert(Error::WorkerPanicked("frame saver"));
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }
}

/// Delete every `{number}.bmp` in `dir`, leaving anything else alone,
/// so a new run never stitches stale frames from an old one.  A
/// missing directory has nothing to clear.
pub fn clear_frames(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && frame_index(&path).is_some() {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    if removed > 0 {
        info!("removed {} old frames from {}", removed, dir.display());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::tempdir;

    #[test]
    fn every_submitted_frame_is_written() {
        let dir = tempdir().unwrap();
        let saver = FrameSaver::spawn(dir.path(), 2, 3).unwrap();
        for index in 0..10 {
            let mut frame = Frame::new(4, 4).unwrap();
            frame.set_pixel(0, 0, Rgb([index as u8, 0, 0]));
            saver.submit(index, frame).unwrap();
        }
        assert_eq!(saver.finish().unwrap(), 10);

        for index in 0..10 {
            let frame = Frame::load(&frame_path(dir.path(), index)).unwrap();
            assert_eq!(frame.get_pixel(0, 0), Rgb([index as u8, 0, 0]));
        }
    }

    #[test]
    fn the_output_directory_is_created() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let saver = FrameSaver::spawn(&nested, 1, 1).unwrap();
        saver.submit(0, Frame::new(2, 2).unwrap()).unwrap();
        assert_eq!(saver.finish().unwrap(), 1);
        assert!(frame_path(&nested, 0).is_file());
    }

    #[test]
    fn an_idle_saver_finishes_cleanly() {
        let dir = tempdir().unwrap();
        let saver = FrameSaver::spawn(dir.path(), 4, 2).unwrap();
        assert_eq!(saver.pending(), 0);
        assert_eq!(saver.dir(), dir.path());
        assert_eq!(saver.finish().unwrap(), 0);
    }

    #[test]
    fn write_failures_are_reported() {
        let dir = tempdir().unwrap();
        let saver = FrameSaver::spawn(dir.path(), 4, 1).unwrap();
        // A directory where the frame should go makes the write fail.
        fs::create_dir(frame_path(dir.path(), 3)).unwrap();
        saver.submit(3, Frame::new(2, 2).unwrap()).unwrap();
        match saver.finish() {
            Err(Error::Io(_)) => (),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn clearing_removes_only_numbered_bitmaps() {
        let dir = tempdir().unwrap();
        for index in 0..3 {
            Frame::new(1, 1)
                .unwrap()
                .save_bmp(&frame_path(dir.path(), index))
                .unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        fs::write(dir.path().join("cover.bmp"), "keep me").unwrap();

        assert_eq!(clear_frames(dir.path()).unwrap(), 3);
        assert!(!frame_path(dir.path(), 0).exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("cover.bmp").exists());
    }

    #[test]
    fn clearing_a_missing_directory_is_a_no_op() {
        let dir = tempdir().unwrap();
        assert_eq!(clear_frames(&dir.path().join("nope")).unwrap(), 0);
    }
}
