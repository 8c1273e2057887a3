//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Transcriber adapter — shells out to a local speech-to-text engine and
//! normalizes its output to `{ text, segments }`.

use crate::error::TranscriberError;
use meetvault_types::revision::{Segment, TranscriptContent};
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::warn;

#[derive(Deserialize)]
struct RawTranscript {
    text: String,
    #[serde(default)]
    segments: Vec<RawSegment>,
}

#[derive(Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
    text: String,
    #[serde(default)]
    speaker: Option<String>,
}

pub struct Transcriber {
    bin: String,
}

impl Transcriber {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// Runs the configured engine binary on the decrypted temp audio file at
    /// `audio_path`. Falls back to a mock transcript (logged at `warn!`)
    /// when the engine binary cannot be spawned at all.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptContent, TranscriberError> {
        let spawn_result = Command::new(&self.bin)
            .arg(audio_path)
            .arg("--output-json")
            .output()
            .await;

        let output = match spawn_result {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(bin = %self.bin, "transcriber binary not found, using mock output");
                return Ok(mock_transcript());
            }
            Err(e) => return Err(TranscriberError::Spawn(e)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json_slice = extract_json_object(&stdout).ok_or_else(|| {
            TranscriberError::NoJson(String::from_utf8_lossy(&output.stderr).to_string())
        })?;

        let raw: RawTranscript = serde_json::from_str(json_slice).map_err(|_| {
            TranscriberError::NoJson(String::from_utf8_lossy(&output.stderr).to_string())
        })?;

        Ok(TranscriptContent {
            text: raw.text,
            segments: raw
                .segments
                .into_iter()
                .map(|s| Segment {
                    start: s.start,
                    end: s.end,
                    text: s.text,
                    speaker: s.speaker,
                })
                .collect(),
        })
    }
}

fn mock_transcript() -> TranscriptContent {
    TranscriptContent {
        text: "[mock transcript: transcription engine unavailable]".to_string(),
        segments: vec![Segment {
            start: 0.0,
            end: 0.0,
            text: "[mock transcript: transcription engine unavailable]".to_string(),
            speaker: None,
        }],
    }
}

/// Extract the outermost JSON object from noisy stdout: first `{` to last
/// `}`. Tolerates log lines surrounding the JSON payload.
fn extract_json_object(stdout: &str) -> Option<&str> {
    let start = stdout.find('{')?;
    let end = stdout.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&stdout[start..=end])
}
