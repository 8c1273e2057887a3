//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Error types for the crypto and vault layers.

use thiserror::Error;

/// Errors from the three crypto layers (file-at-rest, key-wrap, transport envelope).
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("at-rest encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("at-rest decryption failed: {0}")]
    DecryptionFailed(String),

    /// GCM tag mismatch while unwrapping a meeting's data key. Fatal for that
    /// meeting's reads until investigated — there is no recovery path short
    /// of restoring the correct master key.
    #[error("failed to unwrap key: authentication tag mismatch")]
    KeyUnwrapError,

    /// The client-supplied public key PEM could not be reconstructed into a
    /// valid RSA public key after normalization.
    #[error("invalid public key format: {0}")]
    PubKeyFormatError(String),

    #[error("rsa operation failed: {0}")]
    RsaError(String),

    #[error("hex decoding failed: {0}")]
    HexError(#[from] hex::FromHexError),
}

/// Errors from streaming encrypted artifacts to/from the storage vault.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("vault path not found: {0}")]
    NotFound(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
