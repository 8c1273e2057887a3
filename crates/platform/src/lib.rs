//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Platform crate — the meeting-artifact pipeline service.
//!
//! - `store`: durable metadata (meetings, wrapped keys, the revision log) over SQLite.
//! - `bot`: adapter over the external meeting-bot provider.
//! - `processors`: transcription and summarization subprocess/HTTP adapters.
//! - `pipeline`: the orchestrator tying the above into the ingest → process → revise lifecycle.
//! - `http`: the public HTTP API.
//! - `error`: per-module error taxonomies composed into the HTTP-facing `ApiError`.

pub mod bot;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod processors;
pub mod store;

pub use error::ApiError;
pub use pipeline::Pipeline;
pub use store::Store;
