//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! # MeetVault Core
//!
//! Crypto primitives and storage vault for the meeting-artifact pipeline.
//!
//! This crate provides the two lowest layers of the system: [`crypto`], the
//! three cryptographic layers (at-rest AES-256-CBC, AES-256-GCM key-wrap,
//! RSA-OAEP transport envelope), and [`vault`], encrypted blob storage built
//! on top of them. Neither module knows what a meeting or a revision is —
//! that vocabulary belongs to the platform crate built on top of this one.
//!
//! ## Quick Start
//!
//! ```rust
//! use meetvault_core::crypto::{generate_data_key, encrypt_buffer, decrypt_buffer};
//!
//! let (key, iv) = generate_data_key();
//! let ciphertext = encrypt_buffer(b"transcript text", &key, &iv);
//! let plaintext = decrypt_buffer(&ciphertext, &key, &iv).unwrap();
//! assert_eq!(plaintext, b"transcript text");
//! ```

pub mod crypto;
pub mod error;
pub mod secret;
pub mod vault;

pub use error::{CryptoError, VaultError};
pub use secret::Secret;
pub use vault::{Vault, VaultReadStream};
