use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;
use walkdir::WalkDir;

/// One persisted abnormal clip as exposed by the listing endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClipRecord {
    #[serde(rename = "camId")]
    pub cam_id: String,
    pub filename: String,
    pub url: String,
}

/// Returns the camera's storage directory, creating it lazily on first use.
pub fn camera_dir(storage_root: &Path, cam_id: &str) -> Result<PathBuf> {
    let dir = storage_root.join(cam_id);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create camera directory {:?}", dir))?;
    Ok(dir)
}

/// A fresh clip filename. The timestamp keeps names roughly sortable; the
/// UUID token makes concurrent requests within the same second safe.
pub fn new_clip_name() -> String {
    format!("anomaly_{}_{}.mp4", unix_seconds(), short_token())
}

pub fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn short_token() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Flat scan of the whole storage tree: one record per file, one directory
/// per camera. Sorted so repeated listings return identical sets.
pub fn list_clips(storage_root: &Path) -> Result<Vec<ClipRecord>> {
    let mut clips = Vec::new();

    for entry in WalkDir::new(storage_root)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(cam) = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
        else {
            continue;
        };
        let Some(filename) = entry.file_name().to_str() else {
            continue;
        };
        clips.push(ClipRecord {
            cam_id: cam.to_string(),
            filename: filename.to_string(),
            url: format!("/api/download/{cam}/{filename}"),
        });
    }

    Ok(clips)
}

/// Resolves a (camera, filename) pair to its on-disk path. Rejects names
/// that would escape the camera namespace.
pub fn clip_path(storage_root: &Path, cam_id: &str, filename: &str) -> Option<PathBuf> {
    if !is_plain_name(cam_id) || !is_plain_name(filename) {
        return None;
    }
    let path = storage_root.join(cam_id).join(filename);
    path.is_file().then_some(path)
}

fn is_plain_name(name: &str) -> bool {
    let path = Path::new(name);
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
