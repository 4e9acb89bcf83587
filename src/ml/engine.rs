use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::info;

/// A model that reconstructs a single frame from its learned representation.
///
/// The production implementation wraps the pretrained ONNX autoencoder;
/// tests substitute a cheap fake so scoring logic can be exercised without
/// model weights on disk.
pub trait Reconstructor: Send + Sync {
    /// Reconstructs one frame given as a flat (1, H, W, 1) batch with values
    /// in [0, 1]. Returns the reconstruction with the same element count and
    /// ordering as the input.
    fn reconstruct(&self, batch: &[f32], height: usize, width: usize) -> Result<Vec<f32>>;
}

pub struct AutoencoderEngine {
    // ort sessions take &mut to run; scoring is sequential per request anyway.
    session: Mutex<Session>,
}

impl AutoencoderEngine {
    pub fn new(model_path: &Path) -> Result<Self> {
        info!("Loading autoencoder model from {:?}", model_path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(1)?
            .commit_from_file(model_path)
            .context("Failed to load autoencoder model")?;

        info!("Autoencoder model loaded");
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl Reconstructor for AutoencoderEngine {
    fn reconstruct(&self, batch: &[f32], height: usize, width: usize) -> Result<Vec<f32>> {
        let shape = [1, height, width, 1];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), batch.to_vec().into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let outputs = session.run(ort::inputs![input_value])?;

        let (_, data) = outputs[0].try_extract_tensor::<f32>()?;
        Ok(data.to_vec())
    }
}
