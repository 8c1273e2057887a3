//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Axum router composition for the meeting-artifact pipeline service.
//!
//! Routes, all under `/api` and all requiring `Authorization: Bearer <token>`:
//!   POST   /api/join
//!   POST   /api/leave
//!   GET    /api/status/:id
//!   GET    /api/meetings
//!   GET    /api/audio/:id
//!   GET    /api/data/:id/transcript
//!   GET    /api/data/:id/summary
//!   GET    /api/data/:id
//!   POST   /api/edit/:id
//!   POST   /api/verify
//!   GET    /api/history/:id
//!   GET    /api/revision/:rid/content
//!   POST   /api/revert/:id
//!   POST   /api/meeting/:id/checkout
//!   DELETE /api/meeting/:id
//!   POST   /api/retry/:id
//!   GET    /healthz

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, state::AppState};

/// Build the base router — both `create_router` and any future test harness
/// share this route set as the single source of truth.
pub fn build_base_router() -> Router<AppState> {
    Router::new()
        .route("/api/join", post(handlers::join_handler))
        .route("/api/leave", post(handlers::leave_handler))
        .route("/api/status/:id", get(handlers::status_handler))
        .route("/api/meetings", get(handlers::meetings_handler))
        .route("/api/audio/:id", get(handlers::get_audio_handler))
        .route("/api/data/:id/transcript", get(handlers::get_transcript_handler))
        .route("/api/data/:id/summary", get(handlers::get_summary_handler))
        .route("/api/data/:id", get(handlers::get_combined_data_handler))
        .route("/api/edit/:id", post(handlers::edit_handler))
        .route("/api/verify", post(handlers::verify_handler))
        .route("/api/history/:id", get(handlers::history_handler))
        .route("/api/revision/:rid/content", get(handlers::revision_content_handler))
        .route("/api/revert/:id", post(handlers::revert_handler))
        .route("/api/meeting/:id/checkout", post(handlers::checkout_handler))
        .route("/api/meeting/:id", delete(handlers::delete_meeting_handler))
        .route("/api/retry/:id", post(handlers::retry_handler))
        .route("/healthz", get(handlers::healthz))
}

/// Compose the full Axum router for the meeting-artifact pipeline service.
pub fn create_router(state: AppState) -> Router {
    build_base_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
