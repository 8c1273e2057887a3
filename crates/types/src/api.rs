//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Request/response bodies for every endpoint under `/api`.

use crate::revision::Segment;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub meeting_url: String,
    pub bot_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub success: bool,
    pub meeting_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRequest {
    pub meeting_id: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `GET /status/:id` — either a normal status report or a discard sentinel.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatusResponse {
    Active {
        /// UI-facing status name ("processing", "complete", "failed" — the
        /// spec's status-name duality: this is NOT the raw process state).
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_status: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        process_state: Option<String>,
        audio_ready: bool,
        timestamp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        artifacts: Option<Vec<String>>,
    },
    Discarded {
        status: String,
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct MeetingsListResponse {
    pub success: bool,
    pub meetings: Vec<MeetingSummary>,
}

#[derive(Debug, Serialize)]
pub struct MeetingSummary {
    pub id: String,
    pub meeting_id: String,
    pub user_id: String,
    /// Raw process state, per the spec's `/meetings` status-name duality note.
    pub status: String,
    pub process_state: String,
    pub created_at: i64,
    /// Rendered as `"MM:SS"` or `"HH:MM:SS"`.
    pub duration: String,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub text: String,
    #[serde(default)]
    pub segments: Option<Vec<Segment>>,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub success: bool,
    pub version: i64,
    pub hash: String,
}

/// `POST /verify` accepts several shapes; all fields are optional and the
/// handler resolves which verification path applies.
#[derive(Debug, Deserialize, Default)]
pub struct VerifyRequest {
    pub hash: Option<String>,
    pub hashes: Option<Vec<String>>,
    pub content: Option<String>,
    pub meeting_id: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct VerifyResponse {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub revisions: Vec<RevisionSummary>,
}

#[derive(Debug, Serialize)]
pub struct RevisionSummary {
    pub id: i64,
    pub version: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub hash: String,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
pub struct RevisionContentResponse {
    pub success: bool,
    pub content: Value,
}

#[derive(Debug, Deserialize)]
pub struct RevertRequest {
    pub revision_id: i64,
}

#[derive(Debug, Serialize)]
pub struct RevertResponse {
    pub success: bool,
    pub new_version: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub version: i64,
}

#[derive(Debug, Serialize)]
pub struct CombinedDataResponse {
    pub transcript: String,
    pub segments: Vec<Segment>,
    pub summary: String,
}

/// Standard JSON error body — every `ApiError` variant renders to this shape.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
