//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Processor Adapters — subprocess collaborators for transcription and
//! summarization. Neither adapter ever sees the data key or the vault; the
//! orchestrator stages a decrypted temp file and cleans it up.

pub mod summarizer;
pub mod transcriber;

pub use summarizer::Summarizer;
pub use transcriber::Transcriber;
