//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Pipeline Orchestrator — the state machine driving a meeting from
//! ingestion through transcription/summarization to completion, plus the
//! revision/revert/checkout operations over the append-only log.
//!
//! The flow (ingest → transcode → transcribe → summarize → revise) is
//! modeled as a sequence of `async fn`s with explicit state writes between
//! them; any failure unconditionally transitions the meeting to `failed`
//! with a single write.

use crate::bot::BotAdapter;
use crate::error::{IngestError, PipelineError};
use crate::processors::{Summarizer, Transcriber};
use crate::store::Store;
use meetvault_core::crypto::{self, generate_data_key};
use meetvault_core::Vault;
use meetvault_types::meeting::ProcessState;
use meetvault_types::revision::{RevisionKind, TranscriptContent};
use rand::RngCore;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::io::AsyncRead;
use tokio::process::Command;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};

fn audio_path(id: &str) -> String {
    format!("audio/{id}.enc")
}

fn head_path(id: &str, kind: RevisionKind) -> String {
    format!("data/{id}_{}.enc", kind.as_str())
}

fn snapshot_path(id: &str, kind: RevisionKind, version: i64) -> String {
    format!("data/{id}_{}_v{version}.enc", kind.as_str())
}

/// Per-meeting critical sections: a map of id → lock, guarded by a plain
/// `std::sync::Mutex` (never held across an `.await`). A coarser global
/// lock would kill throughput across meetings.
struct MeetingLocks {
    locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl MeetingLocks {
    fn new() -> Self {
        Self {
            locks: StdMutex::new(HashMap::new()),
        }
    }

    fn handle(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.locks.lock().unwrap();
        map.entry(id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[derive(Clone)]
pub struct Pipeline {
    store: Store,
    vault: Vault,
    bot: Arc<BotAdapter>,
    transcriber: Arc<Transcriber>,
    summarizer: Arc<Summarizer>,
    locks: Arc<MeetingLocks>,
}

impl Pipeline {
    pub fn new(
        store: Store,
        vault: Vault,
        bot: BotAdapter,
        transcriber: Transcriber,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            store,
            vault,
            bot: Arc::new(bot),
            transcriber: Arc::new(transcriber),
            summarizer: Arc::new(summarizer),
            locks: Arc::new(MeetingLocks::new()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Asks the bot provider to join a meeting and records the resulting
    /// meeting aggregate.
    pub async fn join_meeting(
        &self,
        user_id: &str,
        meeting_url: &str,
        bot_name: &str,
    ) -> Result<meetvault_types::meeting::Meeting, PipelineError> {
        let bot_id = self.bot.join(meeting_url, bot_name).await?;
        let meeting = self.store.create_meeting(user_id, &bot_id).await?;
        Ok(meeting)
    }

    pub async fn leave_meeting(&self, meeting_id: &str) -> Result<(), PipelineError> {
        self.bot.leave(meeting_id).await?;
        Ok(())
    }

    /// Called from the `/status` poll handler. Consults the bot provider;
    /// dispatches ingestion if audio just became ready, or discards the
    /// meeting if the provider reached a terminal state without audio.
    ///
    /// The `initializing → downloading` transition is a conditional write
    /// (`Store::try_transition`), so two concurrent pollers that both
    /// observe `audio_ready=true` result in exactly one download task.
    pub async fn poll_and_advance(&self, meeting_id: &str) -> Result<PollOutcome, PipelineError> {
        let meeting = self
            .store
            .get_meeting(meeting_id)
            .await?
            .ok_or_else(|| PipelineError::MeetingNotFound(meeting_id.to_string()))?;

        if meeting.process_state != ProcessState::Initializing {
            return Ok(PollOutcome::Unchanged {
                state: meeting.process_state,
                raw_status: None,
                audio_ready: true,
            });
        }

        let status = self.bot.status(meeting_id).await?;

        if status.audio_ready {
            let won = self
                .store
                .try_transition(meeting_id, ProcessState::Initializing, ProcessState::Downloading)
                .await?;
            if won {
                let audio_url = status.audio_url.clone().expect("audio_ready implies a url");
                let pipeline = self.clone();
                let id = meeting_id.to_string();
                tokio::spawn(async move {
                    if let Err(e) = pipeline.ingest_recording(&id, &audio_url).await {
                        error!(meeting_id = %id, error = %e, "ingestion failed");
                        let _ = pipeline
                            .store
                            .update_process_state(&id, ProcessState::Failed, None, None)
                            .await;
                    }
                });
            }
            return Ok(PollOutcome::Unchanged {
                state: ProcessState::Downloading,
                raw_status: Some(status.raw_status),
                audio_ready: true,
            });
        }

        if status.is_terminal() {
            info!(meeting_id, "bot reached terminal state without audio, discarding");
            self.store.delete_meeting(meeting_id).await?;
            return Ok(PollOutcome::Discarded);
        }

        Ok(PollOutcome::Unchanged {
            state: ProcessState::Initializing,
            raw_status: Some(status.raw_status),
            audio_ready: false,
        })
    }

    /// Downloads provider audio, transcodes to MP3, and encrypt-streams it
    /// to the vault, then persists the wrapped key and kicks off
    /// processing.
    pub async fn ingest_recording(&self, meeting_id: &str, audio_url: &str) -> Result<(), IngestError> {
        let reader = self
            .bot
            .download_audio(audio_url)
            .await
            .map_err(|e| IngestError::Transcode(e.to_string()))?;

        let (data_key, file_iv) = generate_data_key();
        self.transcode_and_store(meeting_id, reader, &data_key, &file_iv).await?;

        self.store
            .store_meeting_key(meeting_id, &data_key, &file_iv)
            .await?;
        let mut file_paths = HashMap::new();
        file_paths.insert("audio".to_string(), audio_path(meeting_id));
        self.store
            .update_process_state(meeting_id, ProcessState::Downloaded, Some(&file_paths), None)
            .await?;

        let pipeline = self.clone();
        let id = meeting_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = pipeline.process_meeting(&id).await {
                error!(meeting_id = %id, error = %e, "processing failed");
            }
        });

        Ok(())
    }

    async fn transcode_and_store(
        &self,
        meeting_id: &str,
        mut reader: impl AsyncRead + Unpin + Send + 'static,
        key: &[u8; 32],
        iv: &[u8; 16],
    ) -> Result<(), IngestError> {
        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-i", "pipe:0", "-f", "mp3", "pipe:1"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(IngestError::Io)?;

        let mut stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");

        let copy_task = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            let result = tokio::io::copy(&mut reader, &mut stdin).await;
            let _ = stdin.shutdown().await;
            result
        });

        self.vault
            .encrypt_stream_to_file(&audio_path(meeting_id), stdout, key, iv)
            .await?;

        match copy_task.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(meeting_id, error = %e, "ffmpeg input pipe ended with an error"),
            Err(e) => warn!(meeting_id, error = %e, "ffmpeg input copy task panicked"),
        }

        let status = child.wait().await.map_err(IngestError::Io)?;
        if !status.success() {
            warn!(meeting_id, "ffmpeg exited non-zero; output may be incomplete");
        }

        Ok(())
    }

    /// Stream-decrypts the stored audio, transcribes it, summarizes the
    /// transcript, and writes both head and v1 snapshot blobs. Idempotent
    /// with respect to the head file; each successful run appends a new
    /// revision version, so re-invoking via `resume_processing` after a
    /// failure produces v2, v3, ….
    pub async fn process_meeting(&self, meeting_id: &str) -> Result<(), PipelineError> {
        let guard = self.locks.handle(meeting_id);
        let _held = guard.lock().await;

        self.store
            .update_process_state(meeting_id, ProcessState::Transcribing, None, None)
            .await?;

        match self.run_processing(meeting_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(meeting_id, error = %e, "processing pipeline failed, marking failed");
                self.store
                    .update_process_state(meeting_id, ProcessState::Failed, None, None)
                    .await?;
                Err(e)
            }
        }
    }

    /// Re-runs processing for a meeting stuck in `transcribing`/`failed`.
    pub async fn resume_processing(&self, meeting_id: &str) -> Result<(), PipelineError> {
        self.process_meeting(meeting_id).await
    }

    async fn run_processing(&self, meeting_id: &str) -> Result<(), PipelineError> {
        let (key, iv) = self.store.get_meeting_key(meeting_id).await?;

        let temp_path = temp_audio_path(meeting_id);
        {
            let mut stream = self.vault.decrypt_stream(&audio_path(meeting_id), &key, &iv).await?;
            let mut temp_file = tokio::fs::File::create(&temp_path).await?;
            use tokio::io::AsyncWriteExt;
            while let Some(chunk) = stream.next_chunk().await? {
                temp_file.write_all(&chunk).await?;
            }
            temp_file.flush().await?;
        }

        let duration_seconds = probe_duration_seconds(&temp_path).await;

        let transcript_result = self.transcriber.transcribe(&temp_path).await;
        let _ = tokio::fs::remove_file(&temp_path).await;
        let transcript = transcript_result?;

        let transcript_version = self.write_transcript_revision(meeting_id, &key, &iv, &transcript).await?;

        let summary = self.summarizer.summarize(&transcript.text).await?;
        self.write_summary_revision(meeting_id, &key, &iv, &summary, transcript_version)
            .await?;

        let mut file_paths = HashMap::new();
        file_paths.insert("audio".to_string(), audio_path(meeting_id));
        file_paths.insert("transcript".to_string(), head_path(meeting_id, RevisionKind::Transcript));
        file_paths.insert("summary".to_string(), head_path(meeting_id, RevisionKind::Summary));

        self.store
            .update_process_state(
                meeting_id,
                ProcessState::Completed,
                Some(&file_paths),
                Some(duration_seconds),
            )
            .await?;

        Ok(())
    }

    async fn write_transcript_revision(
        &self,
        meeting_id: &str,
        key: &[u8; 32],
        iv: &[u8; 16],
        content: &TranscriptContent,
    ) -> Result<i64, PipelineError> {
        let hash = crypto::content_hash(&content.text);
        let version = self.store.latest_version(meeting_id, RevisionKind::Transcript).await? + 1;
        let bytes = serde_json::to_vec(content)?;

        self.vault
            .encrypt_buffer_to_file(&head_path(meeting_id, RevisionKind::Transcript), &bytes, key, iv)
            .await?;
        let snapshot = snapshot_path(meeting_id, RevisionKind::Transcript, version);
        self.vault.encrypt_buffer_to_file(&snapshot, &bytes, key, iv).await?;

        self.store
            .add_revision(meeting_id, version, &hash, &snapshot, RevisionKind::Transcript)
            .await?;
        Ok(version)
    }

    async fn write_summary_revision(
        &self,
        meeting_id: &str,
        key: &[u8; 32],
        iv: &[u8; 16],
        content: &meetvault_types::revision::SummaryContent,
        version: i64,
    ) -> Result<(), PipelineError> {
        let hash = crypto::content_hash(&content.summary);
        let bytes = serde_json::to_vec(content)?;

        self.vault
            .encrypt_buffer_to_file(&head_path(meeting_id, RevisionKind::Summary), &bytes, key, iv)
            .await?;
        let snapshot = snapshot_path(meeting_id, RevisionKind::Summary, version);
        self.vault.encrypt_buffer_to_file(&snapshot, &bytes, key, iv).await?;

        self.store
            .add_revision(meeting_id, version, &hash, &snapshot, RevisionKind::Summary)
            .await?;
        Ok(())
    }

    /// Writes a new transcript revision with caller-supplied content,
    /// regenerates the summary from it, and appends both under the same
    /// new version number — so a later `checkout(version)` restores a
    /// consistent pair.
    pub async fn save_transcript_revision(
        &self,
        meeting_id: &str,
        new_text: &str,
        new_segments: Vec<meetvault_types::revision::Segment>,
    ) -> Result<(i64, String), PipelineError> {
        let guard = self.locks.handle(meeting_id);
        let _held = guard.lock().await;

        let (key, iv) = self.store.get_meeting_key(meeting_id).await?;
        let content = TranscriptContent {
            text: new_text.to_string(),
            segments: new_segments,
        };
        let hash = crypto::content_hash(&content.text);
        let version = self.write_transcript_revision(meeting_id, &key, &iv, &content).await?;

        let summary = self.summarizer.summarize(new_text).await?;
        self.write_summary_revision(meeting_id, &key, &iv, &summary, version).await?;

        let mut file_paths = HashMap::new();
        file_paths.insert("transcript".to_string(), head_path(meeting_id, RevisionKind::Transcript));
        file_paths.insert("summary".to_string(), head_path(meeting_id, RevisionKind::Summary));
        self.store
            .update_process_state(meeting_id, ProcessState::Completed, Some(&file_paths), None)
            .await?;
        self.store.checkout_version(meeting_id, version).await?;

        Ok((version, hash))
    }

    /// Allowed only for transcript revisions: loads the snapshot and
    /// re-submits it via `save_transcript_revision`, producing a new
    /// version whose content equals the reverted-to version. History is
    /// never rewritten.
    pub async fn revert_to_revision(
        &self,
        meeting_id: &str,
        revision_id: i64,
    ) -> Result<i64, PipelineError> {
        let revision = self
            .store
            .get_revision(revision_id)
            .await?
            .ok_or(PipelineError::Store(crate::error::StoreError::RevisionNotFound(revision_id)))?;

        if revision.kind != RevisionKind::Transcript {
            return Err(PipelineError::NotATranscriptRevision(revision_id));
        }

        let (key, iv) = self.store.get_meeting_key(meeting_id).await?;
        let bytes = self.vault.decrypt_buffer(&revision.vault_path, &key, &iv).await?;
        let content: TranscriptContent = serde_json::from_slice(&bytes)?;

        let (version, _hash) = self
            .save_transcript_revision(meeting_id, &content.text, content.segments)
            .await?;
        Ok(version)
    }

    pub async fn checkout_to_version(&self, meeting_id: &str, version: i64) -> Result<(), PipelineError> {
        self.store.checkout_version(meeting_id, version).await?;
        Ok(())
    }

    /// Best-effort vault cleanup: database rows are the source of truth, so
    /// they're removed first; orphaned blobs left behind by a failed unlink
    /// are harmless since nothing references their paths anymore.
    pub async fn delete_meeting(&self, meeting_id: &str) -> Result<(), PipelineError> {
        let meeting = self.store.get_meeting(meeting_id).await?;
        self.store.delete_meeting(meeting_id).await?;

        if let Some(meeting) = meeting {
            for path in meeting.file_paths.values() {
                let _ = tokio::fs::remove_file(self.vault.root().join(path)).await;
            }
        }
        let _ = tokio::fs::remove_file(self.vault.root().join(audio_path(meeting_id))).await;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum PollOutcome {
    Unchanged {
        state: ProcessState,
        raw_status: Option<String>,
        audio_ready: bool,
    },
    Discarded,
}

fn temp_audio_path(meeting_id: &str) -> std::path::PathBuf {
    let mut suffix = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut suffix);
    std::env::temp_dir().join(format!("meetvault-{meeting_id}-{}.wav", hex::encode(suffix)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{create_connection_pool, run_migrations};
    use axum::{routing::get, Json as AxumJson, Router as AxumRouter};
    use meetvault_types::revision::Segment;

    async fn test_pipeline() -> (Pipeline, tempfile::TempDir) {
        let pool = create_connection_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = Store::new(pool, [7u8; 32]);

        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::new(dir.path());
        let bot = BotAdapter::new("http://127.0.0.1:0".to_string(), "unused".to_string());
        let transcriber = Transcriber::new("whisper");
        let summarizer = Summarizer::subprocess("summarizer");

        (Pipeline::new(store, vault, bot, transcriber, summarizer), dir)
    }

    /// Seeds a completed meeting with a v1 transcript/summary pair, bypassing
    /// ingestion/transcription entirely — mirrors how `run_processing` writes
    /// revisions, so `revert_to_revision`/`checkout_to_version` exercise real
    /// vault ciphertext rather than bare metadata rows.
    async fn seed_completed_meeting(pipeline: &Pipeline, meeting_id: &str, text: &str) -> ([u8; 32], [u8; 16]) {
        pipeline.store.create_meeting("user-1", meeting_id).await.unwrap();
        let key = [5u8; 32];
        let iv = [6u8; 16];
        pipeline.store.store_meeting_key(meeting_id, &key, &iv).await.unwrap();

        let content = TranscriptContent {
            text: text.to_string(),
            segments: vec![Segment {
                start: 0.0,
                end: 1.0,
                text: text.to_string(),
                speaker: None,
            }],
        };
        pipeline
            .write_transcript_revision(meeting_id, &key, &iv, &content)
            .await
            .unwrap();
        let summary = meetvault_types::revision::SummaryContent {
            summary: format!("summary of {text}"),
            actions: vec![],
        };
        pipeline
            .write_summary_revision(meeting_id, &key, &iv, &summary, 1)
            .await
            .unwrap();

        let mut file_paths = HashMap::new();
        file_paths.insert("transcript".to_string(), head_path(meeting_id, RevisionKind::Transcript));
        file_paths.insert("summary".to_string(), head_path(meeting_id, RevisionKind::Summary));
        pipeline
            .store
            .update_process_state(meeting_id, ProcessState::Completed, Some(&file_paths), Some(42))
            .await
            .unwrap();

        (key, iv)
    }

    #[tokio::test]
    async fn revert_restores_prior_text_under_a_fresh_version() {
        let (pipeline, _dir) = test_pipeline().await;
        let (key, iv) = seed_completed_meeting(&pipeline, "bot-1", "first draft").await;

        let (v2, _hash) = pipeline
            .save_transcript_revision("bot-1", "second draft", vec![])
            .await
            .unwrap();
        assert_eq!(v2, 2);

        let v1_revision = pipeline
            .store
            .list_revisions("bot-1", RevisionKind::Transcript)
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.version == 1)
            .expect("v1 transcript revision should exist");

        let v3 = pipeline.revert_to_revision("bot-1", v1_revision.id).await.unwrap();
        assert_eq!(v3, 3, "revert appends a new version, it does not rewrite history");

        let revisions = pipeline
            .store
            .list_revisions("bot-1", RevisionKind::Transcript)
            .await
            .unwrap();
        assert_eq!(revisions.len(), 3, "version count after revert");

        let head_bytes = pipeline
            .vault
            .decrypt_buffer(&head_path("bot-1", RevisionKind::Transcript), &key, &iv)
            .await
            .unwrap();
        let head: TranscriptContent = serde_json::from_slice(&head_bytes).unwrap();
        assert_eq!(head.text, "first draft", "head content after revert matches v1's text");

        let summary_revisions = pipeline
            .store
            .list_revisions("bot-1", RevisionKind::Summary)
            .await
            .unwrap();
        assert_eq!(
            summary_revisions.len(),
            3,
            "summary revisions track transcript revisions under the same version numbers"
        );
    }

    #[tokio::test]
    async fn checkout_symmetry_restores_either_version_on_demand() {
        let (pipeline, _dir) = test_pipeline().await;
        let (key, iv) = seed_completed_meeting(&pipeline, "bot-1", "version one text").await;
        pipeline
            .save_transcript_revision("bot-1", "version two text", vec![])
            .await
            .unwrap();

        pipeline.checkout_to_version("bot-1", 1).await.unwrap();
        let meeting = pipeline.store.get_meeting("bot-1").await.unwrap().unwrap();
        let transcript_path = meeting.file_paths.get("transcript").unwrap().clone();
        let bytes = pipeline.vault.decrypt_buffer(&transcript_path, &key, &iv).await.unwrap();
        let content: TranscriptContent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(content.text, "version one text");
        assert_eq!(meeting.file_paths.get("audio"), None, "audio path is untouched by checkout");

        pipeline.checkout_to_version("bot-1", 2).await.unwrap();
        let meeting = pipeline.store.get_meeting("bot-1").await.unwrap().unwrap();
        let transcript_path = meeting.file_paths.get("transcript").unwrap().clone();
        let bytes = pipeline.vault.decrypt_buffer(&transcript_path, &key, &iv).await.unwrap();
        let content: TranscriptContent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(content.text, "version two text");
    }

    #[tokio::test]
    async fn delete_meeting_makes_the_data_key_unrecoverable() {
        let (pipeline, _dir) = test_pipeline().await;
        seed_completed_meeting(&pipeline, "bot-1", "some text").await;

        pipeline.delete_meeting("bot-1").await.unwrap();

        assert!(pipeline.store.get_meeting("bot-1").await.unwrap().is_none());
        assert!(matches!(
            pipeline.store.get_meeting_key("bot-1").await,
            Err(crate::error::StoreError::KeyNotFound(_))
        ));
    }

    async fn spawn_mock_bot_server(status_json: serde_json::Value) -> String {
        let app = AxumRouter::new().route(
            "/bots/:id",
            get(move || {
                let status_json = status_json.clone();
                async move { AxumJson(status_json) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn poll_and_advance_discards_a_meeting_that_reaches_a_terminal_state_without_audio() {
        let pool = create_connection_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = Store::new(pool, [7u8; 32]);
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::new(dir.path());

        let base_url = spawn_mock_bot_server(serde_json::json!({
            "status": "fatal",
            "media_shortcuts": {}
        }))
        .await;
        let bot = BotAdapter::new(base_url, "unused".to_string());
        let transcriber = Transcriber::new("whisper");
        let summarizer = Summarizer::subprocess("summarizer");
        let pipeline = Pipeline::new(store, vault, bot, transcriber, summarizer);

        pipeline.store.create_meeting("user-1", "bot-1").await.unwrap();

        let outcome = pipeline.poll_and_advance("bot-1").await.unwrap();
        assert!(matches!(outcome, PollOutcome::Discarded));
        assert!(pipeline.store.get_meeting("bot-1").await.unwrap().is_none());
    }
}

async fn probe_duration_seconds(path: &std::path::Path) -> u32 {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .map(|secs| secs.round() as u32)
            .unwrap_or(0),
        _ => {
            warn!("ffprobe unavailable or failed, recording duration as 0");
            0
        }
    }
}
