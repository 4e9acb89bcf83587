use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

/// Re-encodes frames [start_frame, end_frame) of `video_path` into a new
/// H.264 MP4 at `save_path`, keeping the source's original resolution.
///
/// The source is reopened fresh rather than reusing the decoder's frames:
/// those are downscaled grayscale and lossy for storage purposes. Frame
/// selection is index-accurate via the trim filter; a source that runs out
/// before `end_frame` simply produces a shorter clip.
///
/// On failure no output file is left behind.
pub fn save_anomaly_segment(
    video_path: &Path,
    save_path: &Path,
    start_frame: usize,
    end_frame: usize,
    fps: f64,
) -> Result<()> {
    let status = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(video_path)
        .arg("-vf")
        .arg(format!(
            "trim=start_frame={start_frame}:end_frame={end_frame},setpts=PTS-STARTPTS"
        ))
        .arg("-r")
        .arg(format!("{fps}"))
        .arg("-an")
        .arg("-c:v")
        .arg("libx264")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg(save_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("Failed to spawn ffmpeg for clip encoding")?;

    if !status.success() {
        // ffmpeg may have created a partial output before failing.
        if let Err(e) = fs::remove_file(save_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not remove partial clip {:?}: {}", save_path, e);
            }
        }
        return Err(anyhow!(
            "ffmpeg failed to encode segment [{start_frame}, {end_frame}) of {:?}",
            video_path
        ));
    }

    info!("Abnormal segment saved: {:?}", save_path);
    Ok(())
}
