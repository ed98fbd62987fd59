#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use media_catalog::config::Config;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub root: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub fn media_dir(&self) -> PathBuf {
        self.root.join("media")
    }

    pub fn library_dir(&self) -> PathBuf {
        self.root.join("library")
    }
}

/// Router over a temp SQLite file with every library path inside one temp dir.
pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    std::fs::create_dir_all(root.join("media")).unwrap();

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}?mode=rwc", root.join("test.db").display());
    config.library.allowed_base_paths = vec![root.display().to_string()];
    config.library.jellyfin_root = root.join("library").display().to_string();
    config.library.recycle_path = root.join("recycle").display().to_string();
    config.library.images_path = root.join("images").display().to_string();
    config.omdb.download_posters = false;

    let state = media_catalog::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let router = media_catalog::api::router(state).await;

    TestApp {
        router,
        root,
        _dir: dir,
    }
}

pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&body).to_string())
        })
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn json_request(
    app: &Router,
    method: &str,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(
        app,
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(serde_json::to_string(body).unwrap()))
            .unwrap(),
    )
    .await
}

pub async fn post(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    json_request(app, "POST", uri, &body).await
}
