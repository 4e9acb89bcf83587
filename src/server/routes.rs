use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use crate::error::ApiError;
use crate::pipeline::{self, AnalysisOutcome};
use crate::storage::clips::{self, ClipRecord};
use crate::storage::temp::TempUpload;

use super::AppState;

pub async fn home(State(state): State<AppState>) -> Json<Value> {
    let model = if state.engine.is_some() {
        "Loaded"
    } else {
        "Not loaded"
    };
    Json(json!({
        "status": "Crowd Anomaly Detection Backend Running",
        "model": model,
    }))
}

/// Accepts a multipart upload (`camId` optional, `video` required), runs
/// the detection pipeline to completion, and answers with the outcome.
/// The heavy decode/score/encode work runs on a blocking thread; the
/// response still blocks on completion.
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    let engine = state.engine.clone().ok_or(ApiError::ModelNotLoaded)?;

    let mut cam_id = "cam1".to_string();
    let mut video: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("camId") => {
                cam_id = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Internal(e.to_string()))?;
            }
            Some("video") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Internal(e.to_string()))?;
                video = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let video = video.ok_or(ApiError::NoVideo)?;
    let config = state.config.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        let upload = TempUpload::create(&config.temp_dir, &video)?;
        pipeline::analyze_upload(engine.as_ref(), &config, upload.path(), &cam_id)
    })
    .await
    .map_err(|e| {
        error!("Analysis task failed: {}", e);
        ApiError::Internal(e.to_string())
    })??;

    Ok(Json(outcome))
}

pub async fn list_clips(State(state): State<AppState>) -> Result<Json<Vec<ClipRecord>>, ApiError> {
    let records = clips::list_clips(&state.config.storage_dir)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(records))
}

pub async fn download_clip(
    State(state): State<AppState>,
    Path((cam, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    serve_clip(&state, &cam, &filename, true).await
}

pub async fn stream_clip(
    State(state): State<AppState>,
    Path((cam, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    serve_clip(&state, &cam, &filename, false).await
}

async fn serve_clip(
    state: &AppState,
    cam: &str,
    filename: &str,
    as_attachment: bool,
) -> Result<Response, ApiError> {
    let path = clips::clip_path(&state.config.storage_dir, cam, filename)
        .ok_or(ApiError::NotFound)?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let disposition = if as_attachment {
        format!("attachment; filename=\"{filename}\"")
    } else {
        "inline".to_string()
    };

    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ml::engine::Reconstructor;
    use crate::server::{router, AppState};

    use std::fs;
    use std::sync::Arc;

    use anyhow::Result;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    struct EchoModel;

    impl Reconstructor for EchoModel {
        fn reconstruct(&self, batch: &[f32], _h: usize, _w: usize) -> Result<Vec<f32>> {
            Ok(batch.to_vec())
        }
    }

    fn test_state(root: &std::path::Path, with_engine: bool) -> AppState {
        let config = Config {
            storage_dir: root.join("storage"),
            temp_dir: root.join("tmp"),
            ..Config::default()
        };
        AppState {
            engine: with_engine.then(|| Arc::new(EchoModel) as Arc<dyn Reconstructor>),
            config: Arc::new(config),
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart_request(fields: &[(&str, &[u8])]) -> Request<Body> {
        let boundary = "test-boundary";
        let mut body = Vec::new();
        for (name, data) in fields {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn home_reports_model_state() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), false));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["model"], "Not loaded");
    }

    #[tokio::test]
    async fn analyze_without_model_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), false));

        let response = app
            .oneshot(multipart_request(&[("video", b"bytes")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Model not loaded");
    }

    #[tokio::test]
    async fn analyze_without_video_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), true));

        let response = app
            .oneshot(multipart_request(&[("camId", b"cam1")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No video uploaded");
    }

    #[tokio::test]
    async fn analyze_with_undecodable_video_is_a_400() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), true);
        let app = router(state.clone());

        let response = app
            .oneshot(multipart_request(&[("video", b"definitely not mp4")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Frame extraction failed");
        // The temp upload must not leak on this path.
        let leftovers: Vec<_> = fs::read_dir(&state.config.temp_dir)
            .map(|rd| rd.filter_map(|e| e.ok()).collect())
            .unwrap_or_default();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn missing_clip_download_is_a_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), false));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/download/cam1/missing.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "File not found");
    }

    #[tokio::test]
    async fn listing_and_streaming_cover_persisted_clips() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), false);
        let cam_dir = state.config.storage_dir.join("cam3");
        fs::create_dir_all(&cam_dir).unwrap();
        fs::write(cam_dir.join("anomaly_1_abc.mp4"), b"clip bytes").unwrap();

        let app = router(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/abnormal_clips")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json[0]["camId"], "cam3");
        assert_eq!(json[0]["filename"], "anomaly_1_abc.mp4");
        assert_eq!(json[0]["url"], "/api/download/cam3/anomaly_1_abc.mp4");

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/storage/abnormal_clips/cam3/anomaly_1_abc.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"clip bytes");
    }
}
