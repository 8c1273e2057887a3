//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! HTTP handlers for every endpoint under `/api`.
//!
//! Every handler follows the same three-step policy: authenticate the
//! bearer token into a user id, enforce per-meeting ownership, then apply
//! state-machine checks. Binary and JSON artifact responses are wrapped in
//! a fresh per-request session envelope (`X-Encrypted-Key` header) rather
//! than returned in the clear.

use crate::error::{ApiError, StoreError};
use crate::http::state::AppState;
use crate::pipeline::PollOutcome;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Json, Response},
};
use chrono::{TimeZone, Utc};
use futures_util::stream;
use meetvault_core::crypto::{self, build_session_envelope, CbcEncryptor};
use meetvault_types::api::*;
use meetvault_types::meeting::{Meeting, ProcessState};
use meetvault_types::revision::{RevisionKind, Segment, SummaryContent, TranscriptContent};

fn ui_status(state: ProcessState) -> &'static str {
    match state {
        ProcessState::Initializing
        | ProcessState::Downloading
        | ProcessState::Downloaded
        | ProcessState::Transcribing => "processing",
        ProcessState::Completed => "complete",
        ProcessState::Failed => "failed",
    }
}

fn epoch_ms_to_rfc3339(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

fn format_duration(seconds: Option<u32>) -> String {
    let total = seconds.unwrap_or(0);
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

fn format_date(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Auth)?;
    state.identity.authenticate(token).await
}

fn check_owner(meeting: &Meeting, user_id: &str) -> Result<(), ApiError> {
    if meeting.user_id != user_id {
        return Err(ApiError::Ownership);
    }
    Ok(())
}

/// Authenticates, fetches the meeting, and enforces ownership in one step —
/// the common prefix of every per-meeting handler.
async fn authenticated_meeting(
    state: &AppState,
    headers: &HeaderMap,
    meeting_id: &str,
) -> Result<(String, Meeting), ApiError> {
    let user_id = authenticate(state, headers).await?;
    let meeting = state
        .pipeline
        .store()
        .get_meeting(meeting_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("meeting {meeting_id} not found")))?;
    check_owner(&meeting, &user_id)?;
    Ok((user_id, meeting))
}

fn require_public_key(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("X-Public-Key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| ApiError::BadRequest("X-Public-Key header is required".to_string()))
}

fn encrypt_once(cipher: CbcEncryptor, plaintext: &[u8]) -> Vec<u8> {
    let mut cipher = cipher;
    let mut out = cipher.update(plaintext);
    out.extend(cipher.finalize());
    out
}

// ---------------------------------------------------------------------------
// POST /join, POST /leave
// ---------------------------------------------------------------------------

pub async fn join_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let bot_name = req.bot_name.as_deref().unwrap_or("meeting-recorder");
    let meeting = state
        .pipeline
        .join_meeting(&user_id, &req.meeting_url, bot_name)
        .await?;
    Ok(Json(JoinResponse {
        success: true,
        meeting_id: meeting.id,
        message: "bot dispatched".to_string(),
    }))
}

pub async fn leave_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LeaveRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    authenticated_meeting(&state, &headers, &req.meeting_id).await?;
    state.pipeline.leave_meeting(&req.meeting_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ---------------------------------------------------------------------------
// GET /status/:id, GET /meetings
// ---------------------------------------------------------------------------

pub async fn status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    if let Some(meeting) = state.pipeline.store().get_meeting(&id).await? {
        check_owner(&meeting, &user_id)?;
    }

    let outcome = state.pipeline.poll_and_advance(&id).await?;

    match outcome {
        PollOutcome::Discarded => Ok(Json(StatusResponse::Discarded {
            status: "discarded".to_string(),
            message: "the meeting ended with no recording available".to_string(),
        })),
        PollOutcome::Unchanged {
            state: process_state,
            raw_status,
            audio_ready,
        } => {
            let meeting = state
                .pipeline
                .store()
                .get_meeting(&id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("meeting {id} not found")))?;
            let artifacts: Vec<String> = meeting.file_paths.keys().cloned().collect();
            Ok(Json(StatusResponse::Active {
                status: ui_status(process_state).to_string(),
                raw_status,
                process_state: Some(process_state.as_str().to_string()),
                audio_ready,
                timestamp: meeting.last_transition_at,
                artifacts: if artifacts.is_empty() {
                    None
                } else {
                    Some(artifacts)
                },
            }))
        }
    }
}

pub async fn meetings_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeetingsListResponse>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let meetings = state.pipeline.store().list_meetings_by_user(&user_id).await?;
    let meetings = meetings
        .into_iter()
        .map(|m| MeetingSummary {
            id: m.id.clone(),
            meeting_id: m.id,
            user_id: m.user_id,
            status: m.process_state.as_str().to_string(),
            process_state: m.process_state.as_str().to_string(),
            created_at: m.created_at,
            duration: format_duration(m.duration_seconds),
            date: format_date(m.created_at),
        })
        .collect();
    Ok(Json(MeetingsListResponse {
        success: true,
        meetings,
    }))
}

// ---------------------------------------------------------------------------
// GET /audio/:id — streaming, never buffers the whole file
// ---------------------------------------------------------------------------

pub async fn get_audio_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (_, meeting) = authenticated_meeting(&state, &headers, &id).await?;
    let public_key_pem = require_public_key(&headers)?;

    let audio_path = meeting
        .file_paths
        .get("audio")
        .ok_or_else(|| ApiError::NotFound("audio is not available yet".to_string()))?
        .clone();

    let (header_b64, cipher) = build_session_envelope(&public_key_pem)?;
    let (key, iv) = state.pipeline.store().get_meeting_key(&id).await?;
    let plain_stream = state.pipeline.vault().decrypt_stream(&audio_path, &key, &iv).await?;

    let body = Body::from_stream(stream::unfold(
        (plain_stream, Some(cipher)),
        |(mut plain_stream, cipher)| async move {
            let mut cipher = cipher?;
            match plain_stream.next_chunk().await {
                Ok(Some(chunk)) => {
                    let out = cipher.update(&chunk);
                    Some((Ok::<_, std::io::Error>(out), (plain_stream, Some(cipher))))
                }
                Ok(None) => {
                    let tail = cipher.finalize();
                    Some((Ok(tail), (plain_stream, None)))
                }
                Err(e) => Some((
                    Err(std::io::Error::new(std::io::ErrorKind::Other, e)),
                    (plain_stream, None),
                )),
            }
        },
    ));

    let mut response = Response::new(body);
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        "audio/mpeg".parse().expect("static content type is valid"),
    );
    response.headers_mut().insert(
        "X-Encrypted-Key",
        header_b64.parse().map_err(|_| ApiError::Auth)?,
    );
    Ok(response)
}

// ---------------------------------------------------------------------------
// GET /data/:id/transcript, /summary, combined
// ---------------------------------------------------------------------------

async fn decrypt_head(
    state: &AppState,
    meeting: &Meeting,
    meeting_id: &str,
    kind: &str,
) -> Result<Vec<u8>, ApiError> {
    let path = meeting
        .file_paths
        .get(kind)
        .ok_or_else(|| ApiError::NotFound(format!("{kind} is not available yet")))?;
    let (key, iv) = state.pipeline.store().get_meeting_key(meeting_id).await?;
    let bytes = state.pipeline.vault().decrypt_buffer(path, &key, &iv).await?;
    Ok(bytes)
}

fn sealed_json_response(header_b64: String, cipher: CbcEncryptor, plaintext: &[u8]) -> Response {
    let ciphertext = encrypt_once(cipher, plaintext);
    let mut response = Response::new(Body::from(ciphertext));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        "application/json".parse().expect("static content type is valid"),
    );
    response.headers_mut().insert(
        "X-Encrypted-Key",
        header_b64.parse().expect("base64 header value is valid"),
    );
    response
}

pub async fn get_transcript_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (_, meeting) = authenticated_meeting(&state, &headers, &id).await?;
    let public_key_pem = require_public_key(&headers)?;
    let bytes = decrypt_head(&state, &meeting, &id, "transcript").await?;
    let content: TranscriptContent =
        serde_json::from_slice(&bytes).map_err(StoreError::from)?;
    let (header_b64, cipher) = build_session_envelope(&public_key_pem)?;
    let payload = serde_json::to_vec(&content).map_err(StoreError::from)?;
    Ok(sealed_json_response(header_b64, cipher, &payload))
}

pub async fn get_summary_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (_, meeting) = authenticated_meeting(&state, &headers, &id).await?;
    let public_key_pem = require_public_key(&headers)?;
    let bytes = decrypt_head(&state, &meeting, &id, "summary").await?;
    let content: SummaryContent = serde_json::from_slice(&bytes).map_err(StoreError::from)?;
    let (header_b64, cipher) = build_session_envelope(&public_key_pem)?;
    let payload = serde_json::to_vec(&content).map_err(StoreError::from)?;
    Ok(sealed_json_response(header_b64, cipher, &payload))
}

pub async fn get_combined_data_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (_, meeting) = authenticated_meeting(&state, &headers, &id).await?;
    let public_key_pem = require_public_key(&headers)?;

    let transcript_bytes = decrypt_head(&state, &meeting, &id, "transcript").await?;
    let transcript: TranscriptContent =
        serde_json::from_slice(&transcript_bytes).map_err(StoreError::from)?;
    let summary_bytes = decrypt_head(&state, &meeting, &id, "summary").await?;
    let summary: SummaryContent =
        serde_json::from_slice(&summary_bytes).map_err(StoreError::from)?;

    let combined = CombinedDataResponse {
        transcript: transcript.text,
        segments: transcript.segments,
        summary: summary.summary,
    };
    let payload = serde_json::to_vec(&combined).map_err(StoreError::from)?;
    let (header_b64, cipher) = build_session_envelope(&public_key_pem)?;
    Ok(sealed_json_response(header_b64, cipher, &payload))
}

// ---------------------------------------------------------------------------
// POST /edit/:id
// ---------------------------------------------------------------------------

pub async fn edit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<EditRequest>,
) -> Result<Json<EditResponse>, ApiError> {
    authenticated_meeting(&state, &headers, &id).await?;
    let segments: Vec<Segment> = req.segments.unwrap_or_default();
    let (version, hash) = state
        .pipeline
        .save_transcript_revision(&id, &req.text, segments)
        .await?;
    Ok(Json(EditResponse {
        success: true,
        version,
        hash,
    }))
}

// ---------------------------------------------------------------------------
// POST /verify
// ---------------------------------------------------------------------------

fn canonicalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonicalize_summary(content: &SummaryContent) -> String {
    let actions = content
        .actions
        .iter()
        .map(|a| format!("- {a}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("SUMMARY: {} ACTION ITEMS: {}", content.summary.trim(), actions)
}

pub async fn verify_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    authenticate(&state, &headers).await?;

    let mut candidates: Vec<String> = Vec::new();
    if let Some(h) = &req.hash {
        candidates.push(h.clone());
    }
    if let Some(hs) = &req.hashes {
        candidates.extend(hs.iter().cloned());
    }
    if let Some(content) = &req.content {
        candidates.push(crypto::content_hash(content));
    }
    if candidates.is_empty() {
        return Err(ApiError::BadRequest(
            "one of hash, hashes, or content is required".to_string(),
        ));
    }

    for hash in &candidates {
        if let Some(revision) = state.pipeline.store().find_revision_by_hash(hash).await? {
            return Ok(Json(VerifyResponse {
                verified: true,
                version: Some(revision.version),
                kind: Some(revision.kind.as_str().to_string()),
                date: Some(epoch_ms_to_rfc3339(revision.created_at)),
                calculated_hash: Some(hash.clone()),
                message: Some("exact match".to_string()),
            }));
        }
    }

    if let Some(meeting_id) = &req.meeting_id {
        let mut fuzzy_candidates = candidates.clone();
        if let Some(content) = &req.content {
            fuzzy_candidates.push(crypto::content_hash(&canonicalize_whitespace(content)));
        }
        if let Some(found) = fuzzy_verify(&state, meeting_id, &fuzzy_candidates).await? {
            return Ok(Json(found));
        }
    }

    Ok(Json(VerifyResponse {
        verified: false,
        calculated_hash: candidates.into_iter().next(),
        message: Some("no matching revision found".to_string()),
        ..Default::default()
    }))
}

/// Decrypts every revision of a meeting, recomputes a hash over a
/// canonicalized rendering, and compares against the candidate set. This
/// accommodates clients that hash text extracted from a rendered PDF rather
/// than the raw stored content.
async fn fuzzy_verify(
    state: &AppState,
    meeting_id: &str,
    candidates: &[String],
) -> Result<Option<VerifyResponse>, ApiError> {
    state
        .pipeline
        .store()
        .get_meeting(meeting_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("meeting {meeting_id} not found")))?;
    let (key, iv) = state.pipeline.store().get_meeting_key(meeting_id).await?;

    for kind in [RevisionKind::Transcript, RevisionKind::Summary] {
        let revisions = state.pipeline.store().list_revisions(meeting_id, kind).await?;
        for revision in revisions {
            let bytes = state
                .pipeline
                .vault()
                .decrypt_buffer(&revision.vault_path, &key, &iv)
                .await?;
            let canonical = match kind {
                RevisionKind::Transcript => {
                    let c: TranscriptContent =
                        serde_json::from_slice(&bytes).map_err(StoreError::from)?;
                    canonicalize_whitespace(&c.text)
                }
                RevisionKind::Summary => {
                    let c: SummaryContent =
                        serde_json::from_slice(&bytes).map_err(StoreError::from)?;
                    canonicalize_summary(&c)
                }
            };
            let computed = crypto::content_hash(&canonical);
            if candidates.contains(&computed) {
                return Ok(Some(VerifyResponse {
                    verified: true,
                    version: Some(revision.version),
                    kind: Some(kind.as_str().to_string()),
                    date: Some(epoch_ms_to_rfc3339(revision.created_at)),
                    calculated_hash: Some(computed),
                    message: Some("fuzzy match".to_string()),
                }));
            }
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// GET /history/:id, GET /revision/:rid/content
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub async fn history_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    authenticated_meeting(&state, &headers, &id).await?;

    let kinds = match query.kind.as_deref() {
        Some(s) => {
            let kind = RevisionKind::from_str_loose(s)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown revision type {s}")))?;
            vec![kind]
        }
        None => vec![RevisionKind::Transcript, RevisionKind::Summary],
    };

    let mut revisions = Vec::new();
    for kind in kinds {
        revisions.extend(state.pipeline.store().list_revisions(&id, kind).await?);
    }
    revisions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let revisions = revisions
        .into_iter()
        .map(|r| RevisionSummary {
            id: r.id,
            version: r.version,
            kind: r.kind.as_str().to_string(),
            hash: r.content_hash,
            created_at: r.created_at,
        })
        .collect();
    Ok(Json(HistoryResponse {
        success: true,
        revisions,
    }))
}

pub async fn revision_content_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(revision_id): Path<i64>,
) -> Result<Json<RevisionContentResponse>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;
    let revision = state
        .pipeline
        .store()
        .get_revision(revision_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("revision {revision_id} not found")))?;
    let meeting = state
        .pipeline
        .store()
        .get_meeting(&revision.meeting_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("meeting {} not found", revision.meeting_id)))?;
    check_owner(&meeting, &user_id)?;

    let (key, iv) = state.pipeline.store().get_meeting_key(&revision.meeting_id).await?;
    let bytes = state
        .pipeline
        .vault()
        .decrypt_buffer(&revision.vault_path, &key, &iv)
        .await?;
    let content: serde_json::Value = serde_json::from_slice(&bytes).map_err(StoreError::from)?;
    Ok(Json(RevisionContentResponse {
        success: true,
        content,
    }))
}

// ---------------------------------------------------------------------------
// POST /revert/:id, POST /meeting/:id/checkout, DELETE /meeting/:id, POST /retry/:id
// ---------------------------------------------------------------------------

pub async fn revert_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<RevertRequest>,
) -> Result<Json<RevertResponse>, ApiError> {
    authenticated_meeting(&state, &headers, &id).await?;
    let new_version = state.pipeline.revert_to_revision(&id, req.revision_id).await?;
    Ok(Json(RevertResponse {
        success: true,
        new_version,
    }))
}

pub async fn checkout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    authenticated_meeting(&state, &headers, &id).await?;
    state.pipeline.checkout_to_version(&id, req.version).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn delete_meeting_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    authenticated_meeting(&state, &headers, &id).await?;
    state.pipeline.delete_meeting(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn retry_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    authenticated_meeting(&state, &headers, &id).await?;
    state.pipeline.resume_processing(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
