//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Per-module error taxonomies, composed into the single `ApiError` exposed
//! at the HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use meetvault_core::CryptoError;
use meetvault_types::api::ErrorBody;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("meeting key record not found for {0}")]
    KeyNotFound(String),

    #[error("revision {0} not found")]
    RevisionNotFound(i64),

    #[error("stored artifact was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("bot provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("bot provider returned status {status}: {body}")]
    BadStatus { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum TranscriberError {
    #[error("transcriber process failed to start: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("transcriber produced no parseable JSON; stderr: {0}")]
    NoJson(String),
}

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("summarizer process failed to start: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("summarizer timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("summarizer produced no parseable JSON")]
    NoJson,
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("ffmpeg transcode failed: {0}")]
    Transcode(String),

    #[error(transparent)]
    Vault(#[from] meetvault_core::VaultError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Vault(#[from] meetvault_core::VaultError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Transcriber(#[from] TranscriberError),

    #[error(transparent)]
    Summarizer(#[from] SummarizerError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("meeting {0} not found")]
    MeetingNotFound(String),

    #[error("revision {0} is not a transcript revision")]
    NotATranscriptRevision(i64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// The single error surface exposed to HTTP handlers. Every variant maps to
/// a status code per the error-handling design: auth first, ownership
/// second, state-machine checks third.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing or invalid bearer token")]
    Auth,

    #[error("{0}")]
    NotFound(String),

    #[error("you do not own this meeting")]
    Ownership,

    #[error(transparent)]
    PubKeyFormat(#[from] CryptoError),

    #[error("failed to unwrap key: authentication tag mismatch")]
    KeyUnwrap,

    #[error("missing required field: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Vault(#[from] meetvault_core::VaultError),

    #[error("meeting {0} was discarded")]
    Discarded(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Ownership => StatusCode::FORBIDDEN,
            ApiError::PubKeyFormat(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::KeyUnwrap => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(StoreError::KeyNotFound(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(PipelineError::MeetingNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Vault(meetvault_core::VaultError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Vault(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Discarded(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
            detail: None,
        };
        (status, Json(body)).into_response()
    }
}
