use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use ndarray::Array3;
use tracing::{debug, warn};

use crate::media::probe;

/// One model-ready frame: height x width x 1, intensities in [0, 1].
pub type Frame = Array3<f32>;

/// Ordered frames plus the source frame rate, scoped to one analysis request.
pub struct FrameSequence {
    pub frames: Vec<Frame>,
    pub fps: f64,
}

impl FrameSequence {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

/// Decodes `path` into grayscale frames resized to `size` x `size`.
///
/// A video that cannot be opened or probed yields an empty sequence with
/// fps 0 rather than an error: the caller treats that as "nothing to
/// process". Decoding stops at the first undecodable read, so partial
/// sequences are returned as-is.
pub fn extract_frames(path: &Path, size: u32) -> Result<FrameSequence> {
    let info = match probe::probe_video(path) {
        Ok(info) => info,
        Err(e) => {
            warn!("Cannot open video {:?}: {}", path, e);
            return Ok(FrameSequence { frames: Vec::new(), fps: 0.0 });
        }
    };

    let Some(raw) = decode_gray_stream("ffmpeg", path, size)? else {
        warn!("ffmpeg decode failed for {:?}", path);
        return Ok(FrameSequence { frames: Vec::new(), fps: 0.0 });
    };

    let frames = frames_from_raw(&raw, size);
    debug!("Extracted {} frames from {:?} at {} fps", frames.len(), path, info.fps);
    Ok(FrameSequence { frames, fps: info.fps })
}

/// Pipes the video through the decoder as raw single-channel bytes, one
/// byte per pixel, frame-major.
///
/// Returns `Ok(None)` when the decoder cannot be launched or exits
/// non-zero; both read as "cannot be opened" to the caller. `Err` is
/// reserved for I/O failures against an already-running pipe.
fn decode_gray_stream(program: &str, path: &Path, size: u32) -> Result<Option<Vec<u8>>> {
    let mut child = match Command::new(program)
        .arg("-i")
        .arg(path)
        .arg("-vf")
        .arg(format!("scale={size}:{size},format=gray"))
        .arg("-f")
        .arg("rawvideo")
        .arg("-pix_fmt")
        .arg("gray")
        .arg("-")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!("Cannot launch {} for {:?}: {}", program, path, e);
            return Ok(None);
        }
    };

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("Failed to open decoder stdout"))?;
    let mut raw = Vec::new();
    let read_result = stdout.read_to_end(&mut raw);

    // Reap the child on every path so no zombie handle survives the request.
    let status = child.wait().context("Failed to wait on decoder")?;
    read_result.context("Failed to read decoder output")?;

    if !status.success() {
        return Ok(None);
    }
    Ok(Some(raw))
}

/// Splits a raw gray byte stream into normalized frames.
///
/// A trailing partial frame (stream truncated mid-read) is dropped,
/// matching the decode loop stopping at the first failed read.
pub fn frames_from_raw(raw: &[u8], size: u32) -> Vec<Frame> {
    let frame_len = (size as usize) * (size as usize);
    let mut frames = Vec::with_capacity(raw.len() / frame_len.max(1));

    for chunk in raw.chunks_exact(frame_len) {
        let Some(gray) = GrayImage::from_raw(size, size, chunk.to_vec()) else {
            break;
        };
        let mut frame = Array3::zeros((size as usize, size as usize, 1));
        for (x, y, pixel) in gray.enumerate_pixels() {
            frame[[y as usize, x as usize, 0]] = pixel[0] as f32 / 255.0;
        }
        frames.push(frame);
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn unopenable_video_yields_empty_sequence_and_zero_fps() {
        let seq = extract_frames(&PathBuf::from("/nonexistent/clip.mp4"), 224).unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.fps, 0.0);
    }

    #[test]
    fn missing_decoder_binary_reads_as_unopenable() {
        let raw = decode_gray_stream(
            "ffmpeg-binary-that-does-not-exist",
            &PathBuf::from("clip.mp4"),
            8,
        )
        .unwrap();
        assert!(raw.is_none());
    }

    #[test]
    fn raw_bytes_become_normalized_frames() {
        // Two 2x2 frames: all black, then all white.
        let raw = [0u8, 0, 0, 0, 255, 255, 255, 255];
        let frames = frames_from_raw(&raw, 2);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].shape(), &[2, 2, 1]);
        assert_eq!(frames[0][[0, 0, 0]], 0.0);
        assert_eq!(frames[1][[1, 1, 0]], 1.0);
    }

    #[test]
    fn trailing_partial_frame_is_dropped() {
        // One full 2x2 frame plus three stray bytes.
        let raw = [10u8, 20, 30, 40, 1, 2, 3];
        let frames = frames_from_raw(&raw, 2);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn empty_stream_yields_no_frames() {
        assert!(frames_from_raw(&[], 224).is_empty());
    }
}
