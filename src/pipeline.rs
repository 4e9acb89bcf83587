use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::media::{decoder, writer};
use crate::ml::detector;
use crate::ml::engine::Reconstructor;
use crate::ml::window;
use crate::storage::clips;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload produced zero decodable frames.
    #[error("Frame extraction failed")]
    FrameExtraction,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Download descriptor for a freshly written abnormal clip.
#[derive(Debug, Clone, Serialize)]
pub struct ClipDescriptor {
    pub filename: String,
    pub url: String,
    pub start_frame: usize,
    pub end_frame: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub anomaly: bool,
    pub clip: Option<ClipDescriptor>,
    pub num_anomalous_frames: usize,
}

/// Runs the full detection pipeline over one persisted upload:
/// decode, score, derive the padded window, and re-encode the abnormal
/// segment into the camera's namespace. Synchronous and blocking; the
/// caller owns the temp file's lifetime.
pub fn analyze_upload(
    model: &dyn Reconstructor,
    config: &Config,
    video_path: &Path,
    cam_id: &str,
) -> Result<AnalysisOutcome, PipelineError> {
    let sequence = decoder::extract_frames(video_path, config.frame_size)?;
    if sequence.is_empty() {
        return Err(PipelineError::FrameExtraction);
    }

    let detection = detector::detect_anomalies(model, &sequence.frames, config.threshold)?;

    let clip = match window::anomaly_window(
        &detection.anomaly_indices,
        sequence.len(),
        config.padding_frames,
    ) {
        Some(w) => {
            let cam_dir = clips::camera_dir(&config.storage_dir, cam_id)?;
            let filename = clips::new_clip_name();
            writer::save_anomaly_segment(
                video_path,
                &cam_dir.join(&filename),
                w.start,
                w.end,
                sequence.fps,
            )?;
            info!(
                "Anomaly on {}: {} frames, window [{}, {})",
                cam_id,
                detection.anomaly_indices.len(),
                w.start,
                w.end
            );
            Some(ClipDescriptor {
                url: format!("/api/download/{cam_id}/{filename}"),
                filename,
                start_frame: w.start,
                end_frame: w.end,
            })
        }
        None => None,
    };

    Ok(AnalysisOutcome {
        anomaly: !detection.anomaly_indices.is_empty(),
        clip,
        num_anomalous_frames: detection.anomaly_indices.len(),
    })
}
