mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{get, json_request, post, send, spawn_app, write_file};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_root_and_health() {
    let app = spawn_app().await;

    let (status, body) = get(&app.router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert!(body["version"].is_string());

    let (status, body) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "connected");
    assert_eq!(body["data"]["activeScans"], 0);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/tasks")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(!response.headers()["x-request-id"].is_empty());
}

#[tokio::test]
async fn test_movie_create_list_and_duplicate() {
    let app = spawn_app().await;

    let form = json!({
        "title": "Inception",
        "year": "2010",
        "runtime": "2:28:00",
        "releaseDate": "16-Jul-2010",
        "genres": ["Action", "Sci-Fi"],
        "omdbData": { "Title": "Inception", "imdbID": "tt1375666" }
    });

    let (status, body) = post(&app.router, "/api/movies", json!({ "form": form })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "saved");
    assert_eq!(body["data"]["movie"]["title"], "Inception");
    assert_eq!(body["data"]["movie"]["imdbId"], "tt1375666");
    assert_eq!(body["data"]["form"]["title"], "");
    let id = body["data"]["movie"]["id"].as_str().unwrap().to_string();

    let (status, body) = get(&app.router, "/api/movies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], id.as_str());

    let (status, body) = post(&app.router, "/api/movies", json!({ "form": form })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "CONFLICT");

    // Selecting a stored id short-circuits before any provider call.
    let (status, body) = post(
        &app.router,
        "/api/movies/select",
        json!({ "imdbId": "tt1375666" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "duplicate");
    assert_eq!(body["data"]["existing"]["id"], id.as_str());

    let (status, _) = json_request(&app.router, "DELETE", &format!("/api/movies/{id}"), &json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app.router, &format!("/api/movies/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_movie_form_is_rejected() {
    let app = spawn_app().await;

    let (status, body) = post(
        &app.router,
        "/api/movies",
        json!({ "form": { "title": "  ", "year": "20x0", "links": ["ftp://example.com"] } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["errors"]["title"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["errors"]["year"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["errors"]["links"].as_array().unwrap().len(), 1);

    let (_, body) = get(&app.router, "/api/movies").await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_people_and_releases() {
    let app = spawn_app().await;

    let (status, body) = post(
        &app.router,
        "/api/people",
        json!({ "fullName": "Christopher Nolan", "role": "director" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let person_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = get(&app.router, "/api/people?role=director").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = get(&app.router, "/api/people?role=actor").await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = get(&app.router, &format!("/api/people/{person_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &app.router,
        "/api/releases",
        json!({ "title": "Inception 4K", "mediaType": "movie" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = post(
        &app.router,
        "/api/releases",
        json!({ "title": "Inception 4K", "year": 2010, "mediaType": "movie", "movieIds": ["m1"] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["movieIds"][0], "m1");
}

#[tokio::test]
async fn test_file_rename_and_path_security() {
    let app = spawn_app().await;
    let source = app.media_dir().join("old.mkv");
    write_file(&source, b"video");

    let (status, body) = post(
        &app.router,
        "/api/files/rename",
        json!({ "filePath": source.display().to_string(), "newName": "new" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(app.media_dir().join("new.mkv").exists());
    assert!(!source.exists());

    let (status, body) = post(
        &app.router,
        "/api/files/path/exists",
        json!({ "path": "/etc/passwd" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INVALID_PATH");

    let traversal = format!("{}/../../etc", app.media_dir().display());
    let (status, body) = post(
        &app.router,
        "/api/files/folders/list",
        json!({ "path": traversal }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INVALID_PATH");
}

#[tokio::test]
async fn test_delete_to_trash_and_restore() {
    let app = spawn_app().await;
    let file = app.media_dir().join("unwanted.mkv");
    write_file(&file, b"bytes");

    let (status, body) = post(
        &app.router,
        "/api/files/delete",
        json!({ "filePath": file.display().to_string() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(!file.exists());

    let (status, body) = get(&app.router, "/api/files/trash").await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    let recycled = items[0].as_str().unwrap().to_string();

    let (status, body) = post(
        &app.router,
        "/api/files/trash/restore",
        json!({ "recycledPath": recycled, "originalPath": file.display().to_string() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(std::fs::read(&file).unwrap(), b"bytes");
}

#[tokio::test]
async fn test_library_scan_lifecycle() {
    let app = spawn_app().await;
    let media = app.media_dir();
    write_file(&media.join("Inception (2010)/Inception.2010.1080p.mkv"), b"a");
    write_file(&media.join("Show/Show.S01E02.mkv"), b"b");
    write_file(&media.join("notes.txt"), b"ignored");

    let (status, body) = post(
        &app.router,
        "/api/library/scan",
        json!({ "libraryPath": media.display().to_string() }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    let scan_id = body["data"]["scanId"].as_str().unwrap().to_string();

    let mut snapshot = serde_json::Value::Null;
    for _ in 0..100 {
        let (_, body) = get(&app.router, &format!("/api/library/scan/status/{scan_id}")).await;
        snapshot = body["data"].clone();
        if snapshot["status"] != "scanning" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert_eq!(snapshot["status"], "completed", "{snapshot}");
    assert_eq!(snapshot["filesFound"], 2);

    let (status, body) = get(&app.router, &format!("/api/library/scan/results/{scan_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert!(items.iter().any(|i| i["type"] == "file" && i["mediaType"] == "episode"));
    assert!(items.iter().any(|i| i["type"] == "file" && i["mediaType"] == "movie"));

    let (_, body) = get(&app.router, "/api/library/scans?status=completed").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = get(
        &app.router,
        &format!("/api/library/scanned-files?scanId={scan_id}"),
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = json_request(
        &app.router,
        "DELETE",
        &format!("/api/library/scan/cleanup/{scan_id}"),
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app.router, &format!("/api/library/scan/status/{scan_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assign_and_organize_movie() {
    let app = spawn_app().await;
    let source = app.media_dir().join("Inception.2010.2160p.mkv");
    write_file(&source, b"movie bytes");

    let (_, body) = post(
        &app.router,
        "/api/movies",
        json!({ "form": { "title": "Inception", "year": "2010" } }),
    )
    .await;
    let movie_id = body["data"]["movie"]["id"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app.router,
        "/api/media/files/scan",
        json!({
            "filePaths": [source.display().to_string()],
            "libraryPath": app.media_dir().display().to_string()
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["totalProcessed"], 1);
    let file_id = body["data"]["processedFiles"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app.router,
        "/api/media/assign/movie",
        json!({ "fileIds": [file_id, "missing-file"], "movieId": movie_id, "version": "2160p" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["skippedFileIds"][0], "missing-file");
    let assignment_id = body["data"]["assignments"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app.router,
        Request::builder()
            .method("POST")
            .uri(format!("/api/media/organize/{assignment_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let expected = app
        .library_dir()
        .join("Movies/Inception (2010)/Inception (2010) - 2160p.mkv");
    assert!(expected.exists());
    assert!(!source.exists());
    assert_eq!(body["data"]["targetPath"], expected.display().to_string());

    let (_, body) = get(&app.router, &format!("/api/assignments/{assignment_id}")).await;
    assert_eq!(body["data"]["status"], "organized");
    assert_eq!(body["data"]["isOrganized"], true);

    let (_, body) = post(
        &app.router,
        "/api/media/jellyfin/validate",
        json!({ "folderPath": expected.parent().unwrap().display().to_string() }),
    )
    .await;
    assert_eq!(body["data"]["checks"]["folderExists"], true);
    assert_eq!(body["data"]["checks"]["filesPresent"], true);
    assert_eq!(body["data"]["checks"]["metadataComplete"], true);
}

#[tokio::test]
async fn test_tasks_endpoints() {
    let app = spawn_app().await;

    let (status, body) = get(&app.router, "/api/tasks").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = get(&app.router, "/api/tasks/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = post(&app.router, "/api/tasks/nope/cancel", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = json_request(
        &app.router,
        "DELETE",
        "/api/tasks/cleanup?max_age_hours=0",
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_image_upload() {
    let app = spawn_app().await;
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"save_location\"\r\n\r\n\
         posters\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"files\"; filename=\"cover.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         PNGDATA\r\n\
         --{boundary}--\r\n"
    );

    let (status, json) = send(
        &app.router,
        Request::builder()
            .method("POST")
            .uri("/api/images/upload")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{json}");
    let saved = json["data"]["savedFiles"][0].as_str().unwrap();
    assert!(saved.ends_with("cover.png"));
    assert!(app.root.join("images/posters/cover.png").exists());
}
