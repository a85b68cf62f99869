#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use socialsave::extractor::parser::FIELD_TEMPLATE;
use socialsave::extractor::{Invocation, RunLimits, ToolRunner};
use socialsave::server::{build_router, AppState};
use socialsave::utils::{Result, ServerSettings, SocialSaveError};
use tower::ServiceExt;

/// Scripted answer for one kind of lookup
#[derive(Debug, Clone)]
pub enum Reply {
    Stdout(String),
    Fail,
    Timeout,
}

impl Reply {
    pub fn stdout(text: &str) -> Self {
        Reply::Stdout(text.to_string())
    }

    fn answer(&self, limits: RunLimits) -> Result<String> {
        match self {
            Reply::Stdout(text) => Ok(text.clone()),
            Reply::Fail => Err(SocialSaveError::ToolFailure(
                "ERROR: [generic] Unable to download webpage".to_string(),
            )),
            Reply::Timeout => Err(SocialSaveError::ToolTimeout {
                operation: limits.operation,
                secs: limits.timeout.as_secs(),
            }),
        }
    }
}

/// What a download invocation does on disk
#[derive(Debug, Clone)]
pub enum DownloadReply {
    /// Write `bytes` bytes at the `-o` template with the given title and ext
    Write { title: String, ext: String, bytes: usize },
    /// Like `Write`, but the file's mtime is set `age` in the past, as
    /// yt-dlp does when it stamps files with the upload date
    Backdated { title: String, ext: String, bytes: usize, age: Duration },
    /// Exit successfully without producing a file
    Nothing,
    Fail,
}

impl DownloadReply {
    pub fn write(title: &str, ext: &str, bytes: usize) -> Self {
        DownloadReply::Write {
            title: title.to_string(),
            ext: ext.to_string(),
            bytes,
        }
    }

    pub fn backdated(title: &str, ext: &str, bytes: usize, age: Duration) -> Self {
        DownloadReply::Backdated {
            title: title.to_string(),
            ext: ext.to_string(),
            bytes,
            age,
        }
    }
}

/// [`ToolRunner`] double that records every invocation and answers from a
/// script instead of spawning yt-dlp.
pub struct RecordingRunner {
    pub calls: Mutex<Vec<Vec<String>>>,
    pub info: Reply,
    pub record: Reply,
    pub basic: Reply,
    pub direct_url: Reply,
    pub download: DownloadReply,
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            info: Reply::stdout("Test Clip|||125|||Test Channel|||4821|||https://i.example.com/t.jpg|||mp4\n"),
            record: Reply::Fail,
            basic: Reply::Fail,
            direct_url: Reply::Fail,
            download: DownloadReply::write("Test Clip", "mp4", 2048),
        }
    }
}

impl RecordingRunner {
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Recorded invocations that materialise media
    pub fn download_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|args| args.iter().any(|a| a == "-o"))
            .collect()
    }

    fn perform_download(&self, invocation: &Invocation) -> Result<String> {
        let (title, ext, bytes, age) = match &self.download {
            DownloadReply::Write { title, ext, bytes } => (title, ext, *bytes, None),
            DownloadReply::Backdated {
                title,
                ext,
                bytes,
                age,
            } => (title, ext, *bytes, Some(*age)),
            DownloadReply::Nothing => return Ok(String::new()),
            DownloadReply::Fail => {
                return Err(SocialSaveError::ToolFailure(
                    "ERROR: Requested format is not available".to_string(),
                ))
            }
        };

        let template = invocation
            .value_of("-o")
            .expect("download invocation without -o");
        let path = template.replace("%(title)s", title).replace("%(ext)s", ext);
        std::fs::write(&path, vec![0u8; bytes])?;
        if let Some(age) = age {
            let file = std::fs::File::options().write(true).open(&path)?;
            file.set_modified(SystemTime::now() - age)?;
        }
        Ok(String::new())
    }
}

#[async_trait]
impl ToolRunner for RecordingRunner {
    fn id(&self) -> &str {
        "recording"
    }

    async fn run(&self, invocation: &Invocation, limits: RunLimits) -> Result<String> {
        self.calls.lock().unwrap().push(invocation.args().to_vec());
        let has = |flag: &str| invocation.args().iter().any(|a| a == flag);

        if has("-o") {
            self.perform_download(invocation)
        } else if has("--dump-single-json") {
            self.record.answer(limits)
        } else if has("--get-url") {
            self.direct_url.answer(limits)
        } else if invocation.value_of("--print") == Some(FIELD_TEMPLATE) {
            self.info.answer(limits)
        } else if invocation.value_of("--print") == Some("title") {
            self.basic.answer(limits)
        } else {
            panic!("unexpected invocation: {:?}", invocation.args());
        }
    }
}

/// Settings pointing the downloads directory at `dir`.
pub fn test_settings(dir: &Path) -> ServerSettings {
    ServerSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
        downloads_dir: dir.to_path_buf(),
        ..ServerSettings::default()
    }
}

/// Full router around the given runner, same middleware stack as production.
pub fn build_test_app(runner: Arc<RecordingRunner>, dir: &Path) -> Router {
    build_router(AppState::new(test_settings(dir), runner))
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
