//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Shared wire types for the meeting-artifact pipeline.
//!
//! This crate holds the Meeting/Revision data model and the request/response
//! bodies for the HTTP API, kept separate from `meetvault-platform` so the
//! wire schema can be reasoned about without pulling in the crypto/runtime
//! dependency graph.

pub mod api;
pub mod meeting;
pub mod revision;

pub mod prelude {
    pub use crate::api::*;
    pub use crate::meeting::{Meeting, ProcessState};
    pub use crate::revision::{Revision, RevisionKind, Segment, SummaryContent, TranscriptContent};
}
