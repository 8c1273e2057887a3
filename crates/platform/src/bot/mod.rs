//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Bot Adapter — thin wrapper over the external meeting-bot provider's HTTP
//! API. Normalizes the provider's heterogeneous status surface into a
//! stable shape the orchestrator can reason about.

use crate::error::ProviderError;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;

/// Raw provider states that signal no further progress is possible.
const TERMINAL_STATES: &[&str] = &["done", "fatal", "error", "payment_required"];

/// Preference order for selecting which media shortcut to download.
/// Lossless raw audio > mp3 > any mixed audio > mixed video.
const MEDIA_PRIORITY: &[&str] = &[
    "wav_url",
    "raw_audio_url",
    "mp3_url",
    "audio_mixed_mp3",
    "video_mixed_mp4",
];

#[derive(Debug, Clone)]
pub struct BotStatus {
    pub raw_status: String,
    pub audio_ready: bool,
    pub audio_url: Option<String>,
}

impl BotStatus {
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATES.contains(&self.raw_status.as_str())
    }
}

#[derive(Deserialize)]
struct StatusChangeEntry {
    code: String,
}

#[derive(Deserialize)]
struct ProviderStatusPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    status_changes: Vec<StatusChangeEntry>,
    #[serde(default)]
    media_shortcuts: Value,
}

/// Thin client over the external bot provider.
pub struct BotAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BotAdapter {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    pub async fn join(&self, meeting_url: &str, bot_name: &str) -> Result<String, ProviderError> {
        #[derive(serde::Serialize)]
        struct JoinBody<'a> {
            meeting_url: &'a str,
            bot_name: &'a str,
        }
        #[derive(Deserialize)]
        struct JoinResp {
            bot_id: String,
        }

        let resp = self
            .client
            .post(format!("{}/bots", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&JoinBody {
                meeting_url,
                bot_name,
            })
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let body: JoinResp = resp.json().await?;
        Ok(body.bot_id)
    }

    pub async fn leave(&self, bot_id: &str) -> Result<(), ProviderError> {
        let resp = self
            .client
            .post(format!("{}/bots/{bot_id}/leave", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    pub async fn status(&self, bot_id: &str) -> Result<BotStatus, ProviderError> {
        let resp = self
            .client
            .get(format!("{}/bots/{bot_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let payload: ProviderStatusPayload = resp.json().await?;
        Ok(normalize_status(payload))
    }

    pub async fn download_audio(
        &self,
        url: &str,
    ) -> Result<impl tokio::io::AsyncRead + Unpin + Send + 'static, ProviderError> {
        let resp = self.client.get(url).send().await?;
        let resp = check_status(resp).await?;
        let stream = resp
            .bytes_stream()
            .map(|r| r.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)));
        Ok(tokio_util::io::StreamReader::new(stream))
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(ProviderError::BadStatus { status, body })
    }
}

fn normalize_status(payload: ProviderStatusPayload) -> BotStatus {
    let raw_status = payload.status.unwrap_or_else(|| {
        payload
            .status_changes
            .last()
            .map(|c| c.code.clone())
            .unwrap_or_else(|| "unknown".to_string())
    });

    let audio_url = payload
        .media_shortcuts
        .as_object()
        .and_then(|shortcuts| {
            MEDIA_PRIORITY.iter().find_map(|key| {
                shortcuts
                    .get(*key)
                    .and_then(|v| v.get("download_url").or(Some(v)))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            })
        });

    BotStatus {
        raw_status,
        audio_ready: audio_url.is_some(),
        audio_url,
    }
}
