//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! AppState — shared state for the HTTP layer.

use crate::http::auth::IdentityVerifier;
use crate::pipeline::Pipeline;
use std::sync::Arc;

/// Shared application state, cheap to clone (everything inside is already
/// `Arc`/pool-backed).
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub identity: Arc<IdentityVerifier>,
}
