use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    streams: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

/// Video stream metadata needed by the decoder and the clip writer.
#[derive(Debug, Clone, Copy)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Probes the first video stream of `path` with ffprobe.
///
/// Fails when ffprobe cannot be launched, exits non-zero (unreadable or
/// non-video input), or reports no usable video stream.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-select_streams")
        .arg("v:0")
        .arg("-show_entries")
        .arg("stream=width,height,r_frame_rate")
        .arg("-of")
        .arg("json")
        .arg(path)
        .output()
        .context("Failed to spawn ffprobe")?;

    if !output.status.success() {
        return Err(anyhow!("ffprobe exited with non-zero status for {:?}", path));
    }

    let parsed: FfprobeOutput =
        serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;

    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| anyhow!("No video stream in {:?}", path))?;

    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .ok_or_else(|| anyhow!("Unparsable frame rate in {:?}", path))?;

    let info = VideoInfo {
        width: stream.width.ok_or_else(|| anyhow!("Stream missing width"))?,
        height: stream.height.ok_or_else(|| anyhow!("Stream missing height"))?,
        fps,
    };
    debug!("Probed {:?}: {}x{} @ {} fps", path, info.width, info.height, info.fps);
    Ok(info)
}

/// ffprobe reports rates as a rational, e.g. "30000/1001" or "25/1".
fn parse_frame_rate(raw: &str) -> Option<f64> {
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => raw.parse().ok(),
    }
}
