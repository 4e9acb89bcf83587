use std::path::PathBuf;

/// Runtime configuration for the detection service.
///
/// Defaults mirror the deployed backend; everything can be overridden
/// from the command line at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_path: PathBuf,
    pub storage_dir: PathBuf,
    pub temp_dir: PathBuf,
    /// Per-frame reconstruction-error threshold. Tuned constant, not derived.
    pub threshold: f32,
    /// Frames of padding added on each side of the anomalous span.
    pub padding_frames: usize,
    /// Spatial size the model expects (square, single channel).
    pub frame_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/crowd_anomaly_model.onnx"),
            storage_dir: PathBuf::from("storage/abnormal_clips"),
            temp_dir: PathBuf::from("temp"),
            threshold: 0.003,
            padding_frames: 5,
            frame_size: 224,
        }
    }
}
