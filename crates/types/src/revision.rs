//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! The append-only revision log, and the two artifact content shapes it
//! covers (transcript, summary).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionKind {
    Transcript,
    Summary,
}

impl RevisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionKind::Transcript => "transcript",
            RevisionKind::Summary => "summary",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s {
            "transcript" => Some(RevisionKind::Transcript),
            "summary" => Some(RevisionKind::Summary),
            _ => None,
        }
    }
}

/// One append-only entry in a meeting's revision log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    pub id: i64,
    pub meeting_id: String,
    pub version: i64,
    pub kind: RevisionKind,
    pub content_hash: String,
    pub vault_path: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// A single transcript segment produced by the transcriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

/// The decrypted content of a transcript blob (head or snapshot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptContent {
    pub text: String,
    pub segments: Vec<Segment>,
}

/// The decrypted content of a summary blob (head or snapshot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryContent {
    pub summary: String,
    pub actions: Vec<String>,
}
