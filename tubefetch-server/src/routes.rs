/* This file is part of the TubeFetch project
*
*  Copyright (C) 2025 TubeFetch contributors
*  
*  This program is free software: you can redistribute it and/or modify
*  it under the terms of the GNU Affero General Public License as published by
*  the Free Software Foundation, either version 3 of the License, or
*  (at your option) any later version.
*
*  This program is distributed in the hope that it will be useful,
*  but WITHOUT ANY WARRANTY; without even the implied warranty of
*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
*  GNU Affero General Public License for more details.
*
*  You should have received a copy of the GNU Affero General Public License
*  along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::needless_pass_by_value)]
use std::{io, path::{Component, Path}};

use actix_files::{Files, NamedFile};
use actix_web::{
    error::JsonPayloadError,
    get,
    http::{header::{ContentDisposition, DispositionParam, DispositionType}, StatusCode},
    post, rt::spawn, web, HttpRequest, HttpResponse,
};
use cloneable_errors::{ErrContext, ResContext};
use log::{error, warn};
use tubefetch_api::*;
use tubefetch_core::{log_progress, progress_channel, url, Downloader, StreamKind, FORMAT_UNAVAILABLE_MSG};

use crate::{errors::*, pages::ErrorPage, state::AppConfig};

/// Registers every route and the shared state the handlers rely on
pub fn configure(config: web::Data<AppConfig>, downloader: web::Data<Downloader>, error_page: web::Data<ErrorPage>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let json_config = web::JsonConfig::default()
            .limit(config.max_content_length)
            .error_handler(json_error_handler);
        let static_files = Files::new("/static", config.static_content_path.as_path());
        cfg.app_data(config)
           .app_data(downloader)
           .app_data(error_page)
           .app_data(json_config)
           .service(web::scope("/api")
               .service(video_info)
               .service(download)
           )
           .service(index)
           .service(serve_file)
           .service(static_files)
           .default_service(web::to(not_found));
    }
}

type JsonResult<T> = Result<web::Json<T>>;

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            warn!("Rejected oversized request to {}: {err}", req.path());
            Error::new(StatusCode::PAYLOAD_TOO_LARGE, PAYLOAD_TOO_LARGE_MSG).into()
        },
        err => {
            warn!("Rejected malformed request to {}: {err}", req.path());
            Error::bad_request(INVALID_BODY_MSG).into()
        },
    }
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().finish()
}

#[get("/")]
async fn index(config: web::Data<AppConfig>) -> Result<NamedFile> {
    let path = config.static_content_path.join("index.html");
    NamedFile::open_async(&path).await
        .with_context(|| format!("Failed to open {}", path.display()))
        .map_err(|err| {
            error!("Failed to serve the landing page: {err:?}");
            Error::internal(GENERIC_ERROR_MSG, err)
        })
}

#[post("/video-info")]
async fn video_info(downloader: web::Data<Downloader>, body: web::Json<VideoInfoRequest>) -> JsonResult<VideoInfoResponse> {
    let url = url::validate(body.url.as_deref()).map_err(|err| {
        warn!("Rejected video info request for {:?}: {err}", body.url);
        Error::from_fetch(err, GENERIC_ERROR_MSG)
    })?;
    let metadata = downloader.video_info(&url).await
        .map_err(|err| Error::from_fetch(err, GENERIC_ERROR_MSG))?;
    Ok(web::Json(VideoInfoResponse::new((&metadata).into())))
}

#[post("/download")]
async fn download(downloader: web::Data<Downloader>, body: web::Json<DownloadRequest>) -> JsonResult<DownloadResponse> {
    let DownloadRequest { url, itag, kind } = body.into_inner();
    let url = url::validate(url.as_deref()).map_err(|err| {
        warn!("Rejected download request for {url:?}: {err}");
        Error::from_fetch(err, GENERIC_DOWNLOAD_ERROR_MSG)
    })?;
    let kind = match kind.as_deref() {
        None => StreamKind::default(),
        Some(kind) => kind.parse::<StreamKind>().map_err(|_| {
            warn!("Rejected download request with type {kind:?}");
            Error::bad_request(INVALID_KIND_MSG)
        })?,
    };
    let Some(itag) = itag else {
        warn!("Rejected download request for {url} without a format");
        return Err(Error::bad_request(FORMAT_UNAVAILABLE_MSG));
    };

    let (progress, events) = progress_channel();
    spawn(log_progress(events));
    let result = downloader.download(&url, &itag.to_string(), kind, progress).await
        .map_err(|err| Error::from_fetch(err, GENERIC_DOWNLOAD_ERROR_MSG))?;
    Ok(web::Json(DownloadResponse::new(result.download_url())))
}

/// A single normal path component, so `Wait..._what.mp3` is fine but `..` or `a/b` are not
fn is_plain_file_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && matches!(Path::new(name).components().collect::<Vec<_>>()[..], [Component::Normal(_)])
}

#[get("/download/{filename}")]
async fn serve_file(downloader: web::Data<Downloader>, filename: web::Path<String>) -> Result<NamedFile> {
    let filename = filename.into_inner();
    if !is_plain_file_name(&filename) {
        warn!("Refused to serve {filename:?}");
        return Err(Error::not_found());
    }
    let path = downloader.download_dir().join(&filename);
    match NamedFile::open_async(&path).await {
        Ok(file) => Ok(file.set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("Requested file {} does not exist", path.display());
            Err(Error::not_found())
        },
        Err(err) => {
            let err = err.context(format!("Failed to open {}", path.display()));
            error!("Failed to serve a downloaded file: {err:?}");
            Err(Error::internal(GENERIC_ERROR_MSG, err))
        },
    }
}

#[cfg(test)]
mod tests {
    use std::{path::{Path, PathBuf}, sync::Arc};

    use actix_web::{http::header::{self, ContentType}, middleware::NormalizePath, test, App};
    use async_trait::async_trait;
    use cloneable_errors::anyhow;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tubefetch_core::{FetchError, Manifest, ProgressSender, RawStream, VideoSource, VideoUrl};

    use super::*;
    use crate::middleware::{ErrorPages, NOT_FOUND_PAGE_MSG};

    fn stream(id: &str, bitrate: Option<f64>, height: Option<u32>) -> RawStream {
        RawStream {
            id: id.into(),
            container: if height.is_some() { "mp4" } else { "m4a" }.into(),
            mime_type: if height.is_some() { "video/mp4" } else { "audio/mp4" }.into(),
            audio_bitrate: bitrate,
            height,
            fps: height.map(|_| 30.),
            filesize: Some(3_565_158),
            has_audio: bitrate.is_some(),
            has_video: height.is_some(),
        }
    }

    struct FakeSource {
        title: &'static str,
    }

    impl FakeSource {
        fn titled(title: &'static str) -> Arc<FakeSource> {
            Arc::new(FakeSource { title })
        }
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_manifest(&self, url: &VideoUrl) -> std::result::Result<Manifest, FetchError> {
            Ok(Manifest {
                video_id: url.video_id().into(),
                title: self.title.into(),
                author: "Blender".into(),
                length_secs: 596,
                thumbnail_url: None,
                description: Some("A large rabbit".into()),
                view_count: Some(1000),
                publish_date: None,
                streams: vec![
                    stream("140", Some(129.5), None),
                    stream("249", Some(50.), None),
                    stream("22", Some(192.), Some(720)),
                    stream("137", None, Some(1080)),
                ],
            })
        }

        async fn download(&self, _url: &VideoUrl, _stream: &RawStream, dest: &Path, _progress: ProgressSender) -> std::result::Result<(), FetchError> {
            tokio::fs::write(dest, b"not really a video").await
                .map_err(|e| FetchError::Io(anyhow!("{e}")))
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl VideoSource for BrokenSource {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn fetch_manifest(&self, _url: &VideoUrl) -> std::result::Result<Manifest, FetchError> {
            Err(FetchError::Extraction(anyhow!("Video unavailable")))
        }

        async fn download(&self, _url: &VideoUrl, _stream: &RawStream, _dest: &Path, _progress: ProgressSender) -> std::result::Result<(), FetchError> {
            Err(FetchError::Extraction(anyhow!("Video unavailable")))
        }
    }

    struct Harness {
        dir: TempDir,
        config: web::Data<AppConfig>,
        downloader: web::Data<Downloader>,
    }

    impl Harness {
        fn new(source: Arc<dyn VideoSource>) -> Harness {
            let dir = tempfile::tempdir().unwrap();
            let static_dir = dir.path().join("static");
            let download_dir = dir.path().join("downloads");
            std::fs::create_dir(&static_dir).unwrap();
            std::fs::create_dir(&download_dir).unwrap();
            std::fs::write(static_dir.join("index.html"), "<h1>TubeFetch</h1>").unwrap();
            let config = AppConfig {
                static_content_path: static_dir,
                download_path: download_dir.clone(),
                max_content_length: 256,
                ..AppConfig::default()
            };
            Harness {
                dir,
                config: web::Data::new(config),
                downloader: web::Data::new(Downloader::new(source, download_dir)),
            }
        }

        fn download_dir(&self) -> PathBuf {
            self.dir.path().join("downloads")
        }
    }

    macro_rules! init_app {
        ($harness:expr) => {
            test::init_service(
                App::new()
                    .wrap(ErrorPages)
                    .wrap(NormalizePath::trim())
                    .configure(configure($harness.config.clone(), $harness.downloader.clone(), web::Data::new(ErrorPage::fallback())))
            ).await
        };
    }

    const URL: &str = "https://www.youtube.com/watch?v=aqz-KE-bpKQ";

    #[actix_web::test]
    async fn video_info_lists_shaped_streams() {
        let harness = Harness::new(FakeSource::titled("Big Buck Bunny"));
        let app = init_app!(harness);
        let req = test::TestRequest::post().uri("/api/video-info").set_json(json!({"url": URL})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["title"], "Big Buck Bunny");
        assert_eq!(body["data"]["length"], 596);
        assert_eq!(body["data"]["description"], "A large rabbit...");
        assert_eq!(body["data"]["publish_date"], Value::Null);

        let audio = body["data"]["streams"]["audio"].as_array().unwrap();
        let bitrates: Vec<_> = audio.iter().map(|s| s["bitrate"].as_str().unwrap()).collect();
        assert_eq!(bitrates, ["130kbps", "50kbps"]);
        assert_eq!(audio[0]["quality"], "High");
        assert_eq!(audio[1]["quality"], "Low");
        assert_eq!(audio[0]["size"], "3.4 MB");
        assert_eq!(audio[0]["format"], "mp3");

        let video = body["data"]["streams"]["video"].as_array().unwrap();
        let qualities: Vec<_> = video.iter().map(|s| s["quality"].as_str().unwrap()).collect();
        assert_eq!(qualities, ["1080p", "720p"]);
        assert_eq!(video[0]["type"], "video");
    }

    #[actix_web::test]
    async fn video_info_rejects_bad_urls() {
        let harness = Harness::new(FakeSource::titled("Big Buck Bunny"));
        let app = init_app!(harness);
        for body in [json!({"url": "https://vimeo.com/123"}), json!({})] {
            let req = test::TestRequest::post().uri("/api/video-info").set_json(body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"success": false, "error": "Invalid YouTube URL format"}));
        }
    }

    #[actix_web::test]
    async fn video_info_hides_extraction_failures() {
        let harness = Harness::new(Arc::new(BrokenSource));
        let app = init_app!(harness);
        let req = test::TestRequest::post().uri("/api/video-info").set_json(json!({"url": URL})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"success": false, "error": "An unexpected error occurred"}));
    }

    #[actix_web::test]
    async fn download_then_serve() {
        let harness = Harness::new(FakeSource::titled("Big Buck Bunny"));
        let app = init_app!(harness);
        let req = test::TestRequest::post().uri("/api/download").set_json(json!({"url": URL, "itag": 22, "type": "video"})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        let download_url = body["download_url"].as_str().unwrap().to_owned();
        let file_name = download_url.strip_prefix("/download/").unwrap();
        assert!(file_name.starts_with("Big_Buck_Bunny_720p_"));
        assert!(file_name.ends_with(".mp4"));
        assert!(harness.download_dir().join(file_name).is_file());

        let req = test::TestRequest::get().uri(&download_url).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains(file_name));
        assert_eq!(test::read_body(resp).await, "not really a video");
    }

    #[actix_web::test]
    async fn serves_names_with_inner_dots() {
        let harness = Harness::new(FakeSource::titled("Wait... what"));
        let app = init_app!(harness);
        let req = test::TestRequest::post().uri("/api/download").set_json(json!({"url": URL, "itag": 140})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let download_url = body["download_url"].as_str().unwrap().to_owned();
        assert!(download_url.starts_with("/download/Wait..._what_"), "{download_url}");

        let req = test::TestRequest::get().uri(&download_url).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "not really a video");
    }

    #[::core::prelude::v1::test]
    fn plain_file_names() {
        assert!(is_plain_file_name("Wait..._what_20240102_030405.mp3"));
        assert!(is_plain_file_name("..hidden"));
        for name in ["", ".", "..", "../secret.txt", "a/b.mp3", "/etc/passwd", "a\\b.mp3"] {
            assert!(!is_plain_file_name(name), "{name:?}");
        }
    }

    #[actix_web::test]
    async fn download_defaults_to_audio() {
        let harness = Harness::new(FakeSource::titled("Big Buck Bunny"));
        let app = init_app!(harness);
        let req = test::TestRequest::post().uri("/api/download").set_json(json!({"url": URL, "itag": "140"})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let download_url = body["download_url"].as_str().unwrap();
        assert!(download_url.starts_with("/download/Big_Buck_Bunny_"));
        assert!(download_url.ends_with(".mp3"));
    }

    #[actix_web::test]
    async fn download_rejects_client_errors() {
        let harness = Harness::new(FakeSource::titled("Big Buck Bunny"));
        let app = init_app!(harness);
        let cases = [
            (json!({"url": "not a url", "itag": 22}), "Invalid YouTube URL format"),
            (json!({"url": URL, "itag": 9999}), "Selected format is not available"),
            (json!({"url": URL}), "Selected format is not available"),
            (json!({"url": URL, "itag": 22, "type": "gif"}), INVALID_KIND_MSG),
        ];
        for (body, message) in cases {
            let req = test::TestRequest::post().uri("/api/download").set_json(body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"success": false, "error": message}));
        }
        assert_eq!(std::fs::read_dir(harness.download_dir()).unwrap().count(), 0);
    }

    #[actix_web::test]
    async fn download_hides_extraction_failures() {
        let harness = Harness::new(Arc::new(BrokenSource));
        let app = init_app!(harness);
        let req = test::TestRequest::post().uri("/api/download").set_json(json!({"url": URL, "itag": 22})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"success": false, "error": "An unexpected error occurred during download"}));
    }

    #[actix_web::test]
    async fn serve_refuses_missing_and_escaping_files() {
        let harness = Harness::new(FakeSource::titled("Big Buck Bunny"));
        std::fs::write(harness.dir.path().join("secret.txt"), "hunter2").unwrap();
        let app = init_app!(harness);
        for uri in ["/download/missing.mp3", "/download/..secret.txt", "/download/..%2Fsecret.txt"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"success": false, "error": "File not found"}));
        }
    }

    #[actix_web::test]
    async fn oversized_body_is_rejected() {
        let harness = Harness::new(FakeSource::titled("Big Buck Bunny"));
        let app = init_app!(harness);
        let req = test::TestRequest::post().uri("/api/video-info").set_json(json!({"url": "x".repeat(1024)})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"success": false, "error": "File too large"}));
    }

    #[actix_web::test]
    async fn malformed_body_is_rejected() {
        let harness = Harness::new(FakeSource::titled("Big Buck Bunny"));
        let app = init_app!(harness);
        let req = test::TestRequest::post().uri("/api/download")
            .insert_header(ContentType::json())
            .set_payload("{\"url\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn pages() {
        let harness = Harness::new(FakeSource::titled("Big Buck Bunny"));
        let app = init_app!(harness);

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "<h1>TubeFetch</h1>");

        let req = test::TestRequest::get().uri("/no/such/page/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "text/html; charset=utf-8");
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains(NOT_FOUND_PAGE_MSG));
    }
}
