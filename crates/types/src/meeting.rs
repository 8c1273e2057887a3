//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! The Meeting aggregate and its process state machine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Process state of a meeting's pipeline.
///
/// Serializes to the lowercase names used verbatim in both `/status`'s
/// `process_state` field and `/meetings`' `status` field — the spec's
/// "status name duality" note applies at the handler layer, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Initializing,
    Downloading,
    Downloaded,
    Transcribing,
    Completed,
    Failed,
}

impl ProcessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Initializing => "initializing",
            ProcessState::Downloading => "downloading",
            ProcessState::Downloaded => "downloaded",
            ProcessState::Transcribing => "transcribing",
            ProcessState::Completed => "completed",
            ProcessState::Failed => "failed",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s {
            "initializing" => Some(ProcessState::Initializing),
            "downloading" => Some(ProcessState::Downloading),
            "downloaded" => Some(ProcessState::Downloaded),
            "transcribing" => Some(ProcessState::Transcribing),
            "completed" => Some(ProcessState::Completed),
            "failed" => Some(ProcessState::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Completed | ProcessState::Failed)
    }
}

/// The primary aggregate: one external meeting-bot recording and everything
/// derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    /// The bot provider's identifier; also the primary key.
    pub id: String,
    pub user_id: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub process_state: ProcessState,
    /// Epoch milliseconds of the most recent state transition.
    pub last_transition_at: i64,
    pub duration_seconds: Option<u32>,
    /// Artifact kind ("audio", "transcript", "summary") → vault-relative path.
    pub file_paths: HashMap<String, String>,
    /// The revision version currently rendered to live readers.
    pub active_version: Option<i64>,
}
