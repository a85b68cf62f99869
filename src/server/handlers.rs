//! HTTP handlers
//!
//! Every handler validates the URL before anything else so malformed input
//! never reaches yt-dlp.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::extractor::{select_best_format, FormatRequirement};
use crate::server::error::{ApiError, ApiResult};
use crate::server::responses::{
    AudioResponse, DirectDownloadQuery, DownloadResponse, DownloadSummary, HealthResponse,
    InfoResponse, ResolveResponse, VideoInfo, VideoRequest,
};
use crate::server::state::AppState;
use crate::utils::{detect_platform, is_valid_url, Platform, SocialSaveError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Unwrap the JSON body and require a valid `url`. Returns the URL and the
/// optional quality selector.
fn validated(
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<(String, Option<String>)> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected request body: {}", rejection.body_text());
        SocialSaveError::InvalidUrl(String::new())
    })?;

    match request.url {
        Some(url) if is_valid_url(&url) => Ok((url, request.quality)),
        other => Err(SocialSaveError::InvalidUrl(other.unwrap_or_default()).into()),
    }
}

/// Pre-fetch display metadata, then materialise the video.
async fn download_video(
    state: &AppState,
    url: &str,
    quality: Option<&str>,
) -> ApiResult<DownloadResponse> {
    info!("Downloading video: {}", url);

    let summary = match state.extractor.fetch_info(url).await {
        Ok(meta) => DownloadSummary::from_metadata(&meta),
        Err(e) if e.is_tool_error() => {
            warn!("Metadata pre-fetch failed for {}: {}", url, e);
            DownloadSummary::fallback()
        }
        Err(e) => return Err(e.into()),
    };

    let artifact = state.orchestrator.download(url, quality).await?;
    Ok(DownloadResponse::new(summary, &artifact))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/info
///
/// Always answers 200 for a valid URL. When yt-dlp cannot describe the video
/// a placeholder record is returned instead of an error.
pub async fn info(
    State(state): State<AppState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Json<InfoResponse>> {
    let (url, _) = validated(payload)?;
    let platform = detect_platform(&url);
    info!("Getting info for {} URL: {}", platform, url);

    let video_info = match state.extractor.fetch_info(&url).await {
        Ok(meta) => VideoInfo::from_metadata(&meta),
        Err(e) if e.is_tool_error() => {
            warn!("Info lookup failed for {}: {}", url, e);
            VideoInfo::placeholder(platform)
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(InfoResponse {
        success: true,
        platform,
        video_info,
    }))
}

/// POST /api/download
pub async fn download(
    State(state): State<AppState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Json<DownloadResponse>> {
    let (url, quality) = validated(payload)?;
    let response = download_video(&state, &url, quality.as_deref()).await?;
    Ok(Json(response))
}

/// POST /api/download-audio
pub async fn download_audio(
    State(state): State<AppState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Json<AudioResponse>> {
    let (url, _) = validated(payload)?;
    info!("Downloading audio: {}", url);

    let artifact = state.orchestrator.download_audio(&url).await?;
    Ok(Json(AudioResponse::new(&artifact)))
}

/// POST /api/{platform}
///
/// Same as /api/download with the default quality, but refuses URLs that are
/// recognisably from another platform.
pub async fn platform_download(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Json<DownloadResponse>> {
    let expected: Platform = name
        .parse()
        .map_err(|_| SocialSaveError::UnknownPlatform(name.clone()))?;
    let (url, _) = validated(payload)?;

    let detected = detect_platform(&url);
    if detected != expected && detected.is_known() {
        return Err(SocialSaveError::PlatformMismatch {
            expected: expected.to_string(),
            detected: detected.to_string(),
        }
        .into());
    }

    let response = download_video(&state, &url, None).await?;
    Ok(Json(response))
}

/// POST /api/resolve
///
/// Finds the best muxed format from the full record. If the record cannot be
/// fetched, the reduced lookup is tried once before giving up.
pub async fn resolve(
    State(state): State<AppState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Json<ResolveResponse>> {
    let (url, _) = validated(payload)?;
    let platform = detect_platform(&url);
    info!("Processing {} video: {}", platform, url);

    let primary = state.extractor.fetch_record(&url).await.and_then(|meta| {
        let best = select_best_format(&meta.formats, FormatRequirement::Muxed)?;
        Ok(ResolveResponse::from_format(platform, &meta, best))
    });

    let err = match primary {
        Ok(response) => return Ok(Json(response)),
        Err(e) if e.is_tool_error() => e,
        Err(e) => return Err(e.into()),
    };

    warn!("Record lookup failed for {}, trying basic lookup: {}", url, err);
    match state.extractor.fetch_basic(&url).await {
        Ok(meta) => Ok(Json(ResolveResponse::from_basic(platform, &url, &meta))),
        Err(fallback) => {
            warn!("Basic lookup failed for {}: {}", url, fallback);
            Err(ApiError::Failed(format!(
                "Failed to process {} video. The video might be private or unavailable.",
                platform
            )))
        }
    }
}

/// GET /api/direct-download?url=
pub async fn direct_download(
    State(state): State<AppState>,
    Query(query): Query<DirectDownloadQuery>,
) -> ApiResult<Redirect> {
    let url = match query.url {
        Some(url) if is_valid_url(&url) => url,
        other => return Err(SocialSaveError::InvalidUrl(other.unwrap_or_default()).into()),
    };

    let direct = state.extractor.resolve_direct_url(&url).await?;
    debug!("Redirecting {} to direct media URL", url);
    Ok(Redirect::temporary(&direct))
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "SocialSave Download Server is running",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        platforms: Platform::KNOWN.to_vec(),
    })
}
