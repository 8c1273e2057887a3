//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Metadata Store — durable records of meetings, wrapped keys, and the
//! revision log, over an embedded SQLite database.

use crate::error::StoreError;
use meetvault_core::crypto::{self, WrappedKey};
use meetvault_types::meeting::{Meeting, ProcessState};
use meetvault_types::revision::{Revision, RevisionKind};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

pub async fn create_connection_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect(database_url)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Handle to the embedded metadata store. Cheap to clone — wraps a pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    master_key: [u8; 32],
}

impl Store {
    pub fn new(pool: SqlitePool, master_key: [u8; 32]) -> Self {
        Self { pool, master_key }
    }

    pub async fn create_meeting(&self, user_id: &str, bot_id: &str) -> Result<Meeting, StoreError> {
        let now = now_ms();
        sqlx::query(
            "INSERT INTO meetings (id, user_id, created_at, process_state, last_transition_at, file_paths, active_version) \
             VALUES (?, ?, ?, ?, ?, '{}', NULL)",
        )
        .bind(bot_id)
        .bind(user_id)
        .bind(now)
        .bind(ProcessState::Initializing.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Meeting {
            id: bot_id.to_string(),
            user_id: user_id.to_string(),
            created_at: now,
            process_state: ProcessState::Initializing,
            last_transition_at: now,
            duration_seconds: None,
            file_paths: HashMap::new(),
            active_version: None,
        })
    }

    pub async fn get_meeting(&self, id: &str) -> Result<Option<Meeting>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, created_at, process_state, last_transition_at, \
             duration_seconds, file_paths, active_version FROM meetings WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_meeting).transpose()?.flatten())
    }

    pub async fn list_meetings_by_user(&self, user_id: &str) -> Result<Vec<Meeting>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, user_id, created_at, process_state, last_transition_at, \
             duration_seconds, file_paths, active_version FROM meetings \
             WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .filter_map(|r| row_to_meeting(r).transpose())
            .collect()
    }

    pub async fn update_process_state(
        &self,
        id: &str,
        state: ProcessState,
        artifact_paths: Option<&HashMap<String, String>>,
        duration_seconds: Option<u32>,
    ) -> Result<(), StoreError> {
        let now = now_ms();
        if let Some(paths) = artifact_paths {
            let paths_json = serde_json::to_string(paths).unwrap_or_else(|_| "{}".to_string());
            sqlx::query(
                "UPDATE meetings SET process_state = ?, last_transition_at = ?, \
                 file_paths = ?, duration_seconds = COALESCE(?, duration_seconds) WHERE id = ?",
            )
            .bind(state.as_str())
            .bind(now)
            .bind(paths_json)
            .bind(duration_seconds)
            .bind(id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "UPDATE meetings SET process_state = ?, last_transition_at = ?, \
                 duration_seconds = COALESCE(?, duration_seconds) WHERE id = ?",
            )
            .bind(state.as_str())
            .bind(now)
            .bind(duration_seconds)
            .bind(id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Conditional transition used to prevent duplicate ingestion: succeeds
    /// only if the meeting is currently in `expected`.
    pub async fn try_transition(
        &self,
        id: &str,
        expected: ProcessState,
        next: ProcessState,
    ) -> Result<bool, StoreError> {
        let now = now_ms();
        let result = sqlx::query(
            "UPDATE meetings SET process_state = ?, last_transition_at = ? \
             WHERE id = ? AND process_state = ?",
        )
        .bind(next.as_str())
        .bind(now)
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn store_meeting_key(
        &self,
        id: &str,
        raw_key: &[u8; 32],
        file_iv: &[u8; 16],
    ) -> Result<(), StoreError> {
        let wrapped = crypto::wrap_key(&self.master_key, raw_key);
        sqlx::query(
            "INSERT INTO meeting_keys (meeting_id, file_iv, wrapper_iv, ciphertext, tag) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(hex::encode(file_iv))
        .bind(hex::encode(wrapped.wrapper_iv))
        .bind(hex::encode(&wrapped.ciphertext))
        .bind(hex::encode(wrapped.tag))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_meeting_key(&self, id: &str) -> Result<([u8; 32], [u8; 16]), StoreError> {
        let row = sqlx::query(
            "SELECT file_iv, wrapper_iv, ciphertext, tag FROM meeting_keys WHERE meeting_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::KeyNotFound(id.to_string()))?;

        let file_iv_hex: String = row.get("file_iv");
        let wrapper_iv_hex: String = row.get("wrapper_iv");
        let ciphertext_hex: String = row.get("ciphertext");
        let tag_hex: String = row.get("tag");

        let file_iv: [u8; 16] = hex::decode(file_iv_hex)
            .map_err(meetvault_core::CryptoError::from)?
            .try_into()
            .map_err(|_| StoreError::KeyNotFound(id.to_string()))?;
        let wrapper_iv: [u8; 12] = hex::decode(wrapper_iv_hex)
            .map_err(meetvault_core::CryptoError::from)?
            .try_into()
            .map_err(|_| StoreError::KeyNotFound(id.to_string()))?;
        let tag: [u8; 16] = hex::decode(tag_hex)
            .map_err(meetvault_core::CryptoError::from)?
            .try_into()
            .map_err(|_| StoreError::KeyNotFound(id.to_string()))?;
        let ciphertext = hex::decode(ciphertext_hex).map_err(meetvault_core::CryptoError::from)?;

        let wrapped = WrappedKey {
            wrapper_iv,
            ciphertext,
            tag,
        };
        let raw_key = crypto::unwrap_key(&self.master_key, &wrapped)?;
        Ok((raw_key, file_iv))
    }

    pub async fn add_revision(
        &self,
        meeting_id: &str,
        version: i64,
        hash: &str,
        path: &str,
        kind: RevisionKind,
    ) -> Result<i64, StoreError> {
        let now = now_ms();
        let result = sqlx::query(
            "INSERT INTO revisions (meeting_id, version, kind, content_hash, vault_path, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(meeting_id)
        .bind(version)
        .bind(kind.as_str())
        .bind(hash)
        .bind(path)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn latest_version(
        &self,
        meeting_id: &str,
        kind: RevisionKind,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COALESCE(MAX(version), 0) as v FROM revisions WHERE meeting_id = ? AND kind = ?",
        )
        .bind(meeting_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("v"))
    }

    pub async fn find_revision_by_hash(&self, hash: &str) -> Result<Option<Revision>, StoreError> {
        let row = sqlx::query(
            "SELECT id, meeting_id, version, kind, content_hash, vault_path, created_at \
             FROM revisions WHERE content_hash = ? LIMIT 1",
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_revision).transpose()
    }

    pub async fn get_revision(&self, id: i64) -> Result<Option<Revision>, StoreError> {
        let row = sqlx::query(
            "SELECT id, meeting_id, version, kind, content_hash, vault_path, created_at \
             FROM revisions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_revision).transpose()
    }

    /// Newest first.
    pub async fn list_revisions(
        &self,
        meeting_id: &str,
        kind: RevisionKind,
    ) -> Result<Vec<Revision>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, meeting_id, version, kind, content_hash, vault_path, created_at \
             FROM revisions WHERE meeting_id = ? AND kind = ? ORDER BY version DESC",
        )
        .bind(meeting_id)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_revision).collect()
    }

    /// Rewrites the meeting's head pointers to the snapshot paths registered
    /// at `version`; paths for kinds not present at that version (audio) are
    /// preserved.
    pub async fn checkout_version(&self, meeting_id: &str, version: i64) -> Result<(), StoreError> {
        let meeting = self
            .get_meeting(meeting_id)
            .await?
            .ok_or_else(|| StoreError::KeyNotFound(meeting_id.to_string()))?;

        let mut file_paths = meeting.file_paths;
        for kind in [RevisionKind::Transcript, RevisionKind::Summary] {
            let row = sqlx::query(
                "SELECT vault_path FROM revisions WHERE meeting_id = ? AND kind = ? AND version = ?",
            )
            .bind(meeting_id)
            .bind(kind.as_str())
            .bind(version)
            .fetch_optional(&self.pool)
            .await?;
            if let Some(row) = row {
                let path: String = row.get("vault_path");
                file_paths.insert(kind.as_str().to_string(), path);
            }
        }

        let paths_json = serde_json::to_string(&file_paths).unwrap_or_else(|_| "{}".to_string());
        sqlx::query("UPDATE meetings SET file_paths = ?, active_version = ? WHERE id = ?")
            .bind(paths_json)
            .bind(version)
            .bind(meeting_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Cascading delete: key record, then revisions, then the meeting row.
    /// On-disk unlinking is the orchestrator's job — the key's absence is
    /// the authoritative shred.
    pub async fn delete_meeting(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM meeting_keys WHERE meeting_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM revisions WHERE meeting_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM meetings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_meeting(row: sqlx::sqlite::SqliteRow) -> Result<Option<Meeting>, StoreError> {
    let process_state_str: String = row.get("process_state");
    let Some(process_state) = ProcessState::from_str_loose(&process_state_str) else {
        return Ok(None);
    };
    let file_paths_json: String = row.get("file_paths");
    let file_paths: HashMap<String, String> =
        serde_json::from_str(&file_paths_json).unwrap_or_default();

    Ok(Some(Meeting {
        id: row.get("id"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        process_state,
        last_transition_at: row.get("last_transition_at"),
        duration_seconds: row
            .get::<Option<i64>, _>("duration_seconds")
            .map(|v| v as u32),
        file_paths,
        active_version: row.get("active_version"),
    }))
}

fn row_to_revision(row: sqlx::sqlite::SqliteRow) -> Result<Revision, StoreError> {
    let kind_str: String = row.get("kind");
    let kind = RevisionKind::from_str_loose(&kind_str)
        .ok_or_else(|| StoreError::RevisionNotFound(row.get("id")))?;
    Ok(Revision {
        id: row.get("id"),
        meeting_id: row.get("meeting_id"),
        version: row.get("version"),
        kind,
        content_hash: row.get("content_hash"),
        vault_path: row.get("vault_path"),
        created_at: row.get("created_at"),
    })
}
