use anyhow::{anyhow, Result};
use tracing::debug;

use crate::media::decoder::Frame;
use crate::ml::engine::Reconstructor;

/// Scoring output: anomalous frame positions plus the full score list.
///
/// `anomaly_indices` is strictly increasing and indexes into the scored
/// sequence; `mse_scores` has one entry per input frame, in frame order.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub anomaly_indices: Vec<usize>,
    pub mse_scores: Vec<f32>,
}

/// Scores every frame independently against its model reconstruction.
///
/// A frame is anomalous iff its mean squared error is strictly greater
/// than `threshold`. No cross-frame state; order is preserved so the
/// window derivation downstream stays correct.
pub fn detect_anomalies(
    model: &dyn Reconstructor,
    frames: &[Frame],
    threshold: f32,
) -> Result<DetectionResult> {
    let mut mse_scores = Vec::with_capacity(frames.len());
    let mut anomaly_indices = Vec::new();

    for (i, frame) in frames.iter().enumerate() {
        let (height, width, _) = frame.dim();
        let input = frame
            .as_slice()
            .ok_or_else(|| anyhow!("Frame {} is not contiguous", i))?;

        let reconstruction = model.reconstruct(input, height, width)?;
        if reconstruction.len() != input.len() {
            return Err(anyhow!(
                "Reconstruction size mismatch for frame {}: expected {}, got {}",
                i,
                input.len(),
                reconstruction.len()
            ));
        }

        let mse = mean_squared_error(input, &reconstruction);
        mse_scores.push(mse);

        if mse > threshold {
            anomaly_indices.push(i);
        }
    }

    debug!(
        "Scored {} frames, {} anomalous",
        mse_scores.len(),
        anomaly_indices.len()
    );
    Ok(DetectionResult {
        anomaly_indices,
        mse_scores,
    })
}

fn mean_squared_error(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum();
    (sum / a.len() as f64) as f32
}
