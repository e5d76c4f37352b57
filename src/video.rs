//! Encoding frames into a video by piping raw RGB into an `ffmpeg`
//! child process.  ffmpeg does all the real work; we only feed it
//! and keep an ear on its stderr.

use error::{Error, Result};
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use frame::Frame;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStderr, ChildStdin, Stdio};
use std::thread::{self, JoinHandle};

/// How to run the encoder.
#[derive(Clone, Debug)]
pub struct EncoderSettings {
    /// The ffmpeg executable.
    pub ffmpeg: PathBuf,
    /// Frames per second of the output.
    pub fps: u32,
    /// The video file to create (overwritten if present).
    pub output: PathBuf,
    /// Constant rate factor handed to libx264; lower is better.
    pub crf: u8,
}

impl Default for EncoderSettings {
    fn default() -> EncoderSettings {
        EncoderSettings {
            ffmpeg: PathBuf::from("ffmpeg"),
            fps: 30,
            output: PathBuf::from("output.mp4"),
            crf: 18,
        }
    }
}

impl EncoderSettings {
    /// The ffmpeg arguments for a stream of `width` x `height` frames.
    /// yuv420p needs even dimensions, so odd ones are padded by a
    /// single black row or column.
    pub fn arguments(&self, width: usize, height: usize) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y", "-hide_banner", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgb24",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        args.push("-s".to_string());
        args.push(format!("{}x{}", width, height));
        args.push("-r".to_string());
        args.push(self.fps.to_string());
        args.extend(
            vec![
                "-i",
                "-",
                "-vf",
                "pad=ceil(iw/2)*2:ceil(ih/2)*2",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-crf",
            ]
            .into_iter()
            .map(String::from),
        );
        args.push(self.crf.to_string());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

fn encoder_error<E: fmt::Display>(what: &'static str) -> impl Fn(E) -> Error {
    move |e| Error::Encoder(format!("{}: {}", what, e))
}

/// How many of ffmpeg's last stderr lines are kept for error reports.
const DIAGNOSTIC_LINES: usize = 20;

// ffmpeg's stderr is read on its own thread so that a chatty encoder
// can never fill the pipe while we are blocked writing frames.
fn drain(stderr: ChildStderr) -> JoinHandle<Vec<String>> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stderr);
        let mut lines = Vec::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line).trim_end().to_string();
                    if text.is_empty() {
                        continue;
                    }
                    debug!("ffmpeg: {}", text);
                    if lines.len() == DIAGNOSTIC_LINES {
                        lines.remove(0);
                    }
                    lines.push(text);
                }
            }
        }
        lines
    })
}

/// A running ffmpeg, waiting for frames on its stdin.
pub struct VideoEncoder {
    child: FfmpegChild,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<Vec<String>>>,
    output: PathBuf,
    width: usize,
    height: usize,
    frames: usize,
}

impl VideoEncoder {
    /// Start ffmpeg for frames of `width` x `height`.
    pub fn spawn(settings: &EncoderSettings, width: usize, height: usize) -> Result<VideoEncoder> {
        let args = settings.arguments(width, height);
        debug!("{} {}", settings.ffmpeg.display(), args.join(" "));
        let mut command = FfmpegCommand::new_with_path(&settings.ffmpeg);
        command.args(&args);
        command.as_inner_mut().stdout(Stdio::null());
        let mut child = command.spawn().map_err(|e| {
            Error::Encoder(format!(
                "could not start {}: {}",
                settings.ffmpeg.display(),
                e
            ))
        })?;
        let stdin = child.take_stdin();
        let stderr = child.take_stderr().map(drain);
        Ok(VideoEncoder {
            child,
            stdin,
            stderr,
            output: settings.output.clone(),
            width,
            height,
            frames: 0,
        })
    }

    /// Frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Send one frame.  It must be the size the encoder was started
    /// with.  If ffmpeg has stopped reading, the error carries its
    /// exit status and its last words.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(Error::FrameSize {
                path: format!("#{}", self.frames),
                width: frame.width(),
                height: frame.height(),
                expected_width: self.width,
                expected_height: self.height,
            });
        }
        let written = match self.stdin {
            Some(ref mut stdin) => stdin.write_all(frame.pixels()),
            None => return Err(Error::Encoder("ffmpeg has no stdin".to_string())),
        };
        if let Err(e) = written {
            drop(self.stdin.take());
            let status = self.child.wait().map_err(encoder_error("waiting for ffmpeg"))?;
            let diagnostics = self.diagnostics()?;
            return Err(Error::Encoder(format!(
                "ffmpeg stopped reading frames after {} ({}, {}): {}",
                self.frames, e, status, diagnostics
            )));
        }
        self.frames += 1;
        Ok(())
    }

    // Everything ffmpeg said on stderr, once it has closed the stream.
    fn diagnostics(&mut self) -> Result<String> {
        match self.stderr.take() {
            Some(handle) => handle
                .join()
                .map(|lines| lines.join("; "))
                .map_err(|_| Error::WorkerPanicked("ffmpeg stderr")),
            None => Ok(String::new()),
        }
    }

    /// Close the stream and wait for ffmpeg to finish the file.
    /// Returns the number of frames encoded.  If ffmpeg fails,
    /// whatever it left at the output path is removed.
    pub fn finish(mut self) -> Result<usize> {
        drop(self.stdin.take());
        let status = self.child.wait().map_err(encoder_error("waiting for ffmpeg"))?;
        let diagnostics = self.diagnostics()?;
        if status.success() {
            return Ok(self.frames);
        }
        remove_output(&self.output);
        Err(Error::Encoder(format!(
            "ffmpeg exited with {}: {}",
            status, diagnostics
        )))
    }

    /// Stop ffmpeg without letting it finish the file, and remove
    /// whatever it wrote.
    pub fn abort(mut self) {
        drop(self.stdin.take());
        if let Err(e) = self.child.kill() {
            debug!("ffmpeg already stopped: {}", e);
        }
        if let Err(e) = self.child.wait() {
            warn!("could not reap ffmpeg: {}", e);
        }
        if let Err(e) = self.diagnostics() {
            warn!("{}", e);
        }
        remove_output(&self.output);
    }
}

fn remove_output(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => info!("removed incomplete {}", output.display()),
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => (),
        Err(e) => warn!("could not remove {}: {}", output.display(), e),
    }
}

/// An executable shell script standing in for ffmpeg.  Every argument
/// it gets is an ffmpeg argument, so `$last` is the output path.
#[cfg(all(test, unix))]
pub(crate) fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("ffmpeg");
    let script = format!("#!/bin/sh\nfor last; do :; done\n{}\n", body);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_describe_the_raw_stream() {
        let settings = EncoderSettings {
            fps: 24,
            output: PathBuf::from("zoom.mp4"),
            ..EncoderSettings::default()
        };
        let args = settings.arguments(1920, 1080);
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgb24 -s 1920x1080 -r 24 -i -"));
        assert!(joined.contains("-c:v libx264 -pix_fmt yuv420p -crf 18"));
        assert_eq!(args.last().map(String::as_str), Some("zoom.mp4"));
        assert_eq!(args[0], "-y");
    }

    #[test]
    fn defaults_write_output_mp4_at_thirty_fps() {
        let settings = EncoderSettings::default();
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.output, PathBuf::from("output.mp4"));
    }

    #[test]
    fn a_missing_ffmpeg_is_an_encoder_error() {
        let settings = EncoderSettings {
            ffmpeg: PathBuf::from("/nonexistent/definitely-not-ffmpeg"),
            ..EncoderSettings::default()
        };
        match VideoEncoder::spawn(&settings, 4, 4) {
            Err(Error::Encoder(message)) => assert!(message.contains("could not start")),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("spawned a program that does not exist"),
        }
    }

    #[cfg(unix)]
    mod with_a_stand_in_ffmpeg {
        use super::*;
        use tempfile::tempdir;

        fn settings(ffmpeg: PathBuf, output: PathBuf) -> EncoderSettings {
            EncoderSettings {
                ffmpeg,
                output,
                ..EncoderSettings::default()
            }
        }

        #[test]
        fn frames_are_streamed_as_raw_rgb() {
            let dir = tempdir().unwrap();
            let output = dir.path().join("out.mp4");
            let ffmpeg = fake_ffmpeg(dir.path(), "cat > \"$last\"");
            let mut encoder = VideoEncoder::spawn(&settings(ffmpeg, output.clone()), 4, 4).unwrap();
            let frame = Frame::new(4, 4).unwrap();
            for _ in 0..3 {
                encoder.write_frame(&frame).unwrap();
            }
            assert_eq!(encoder.frames(), 3);
            assert_eq!(encoder.finish().unwrap(), 3);
            assert_eq!(fs::metadata(&output).unwrap().len(), 3 * 48);
        }

        #[test]
        fn a_failing_ffmpeg_reports_what_it_said() {
            let dir = tempdir().unwrap();
            let output = dir.path().join("out.mp4");
            let ffmpeg = fake_ffmpeg(
                dir.path(),
                "echo 'Unable to find a suitable output format' >&2\nexit 1",
            );
            let mut encoder = VideoEncoder::spawn(&settings(ffmpeg, output), 200, 200).unwrap();
            let frame = Frame::new(200, 200).unwrap();
            let written = (0..3)
                .map(|_| encoder.write_frame(&frame))
                .collect::<Result<Vec<()>>>();
            let error = match written {
                Err(e) => {
                    encoder.abort();
                    e
                }
                Ok(_) => encoder.finish().unwrap_err(),
            };
            match error {
                Error::Encoder(message) => {
                    assert!(message.contains("Unable to find a suitable output format"))
                }
                other => panic!("unexpected: {:?}", other),
            }
        }

        #[test]
        fn an_unsuccessful_exit_is_an_encoder_error() {
            let dir = tempdir().unwrap();
            let output = dir.path().join("out.mp4");
            let ffmpeg = fake_ffmpeg(
                dir.path(),
                "cat > \"$last\"\necho 'Conversion failed!' >&2\nexit 1",
            );
            let mut encoder = VideoEncoder::spawn(&settings(ffmpeg, output.clone()), 4, 4).unwrap();
            encoder.write_frame(&Frame::new(4, 4).unwrap()).unwrap();
            match encoder.finish() {
                Err(Error::Encoder(message)) => {
                    assert!(message.contains("Conversion failed!"));
                    assert!(message.contains("exit"));
                }
                other => panic!("unexpected: {:?}", other),
            }
            assert!(!output.exists());
        }

        #[test]
        fn frames_must_match_the_stream_size() {
            let dir = tempdir().unwrap();
            let output = dir.path().join("out.mp4");
            let ffmpeg = fake_ffmpeg(dir.path(), "cat > \"$last\"");
            let mut encoder = VideoEncoder::spawn(&settings(ffmpeg, output.clone()), 4, 4).unwrap();
            encoder.write_frame(&Frame::new(4, 4).unwrap()).unwrap();
            match encoder.write_frame(&Frame::new(2, 4).unwrap()) {
                Err(Error::FrameSize {
                    width,
                    height,
                    expected_width,
                    expected_height,
                    ..
                }) => assert_eq!((width, height, expected_width, expected_height), (2, 4, 4, 4)),
                other => panic!("unexpected: {:?}", other),
            }
            assert_eq!(encoder.frames(), 1);
            encoder.abort();
            assert!(!output.exists());
        }
    }
}
