//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Storage Vault — encrypted blob storage on the local filesystem.
//!
//! The vault never stores or returns cleartext. Every write goes through the
//! caller-supplied data key/IV before hitting disk, and every read is
//! decrypted on the way out. The vault does not know what a "meeting" is; it
//! deals only in paths and key material, the same separation the teacher
//! keeps between `io` (transport) and `backends` (key management).

use crate::crypto::{CbcDecryptor, CbcEncryptor};
use crate::error::VaultError;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Root directory under which all vault blobs are stored.
#[derive(Clone, Debug)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Stream-encrypt an in-memory buffer (audio bytes, typically read from a
    /// temp file produced by the bot adapter) to a vault-relative path.
    pub async fn encrypt_stream_to_file(
        &self,
        relative_path: &str,
        mut plaintext: impl tokio::io::AsyncRead + Unpin,
        key: &[u8; 32],
        iv: &[u8; 16],
    ) -> Result<u64, VaultError> {
        let dest = self.resolve(relative_path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = File::create(&dest).await?;
        let mut cipher = CbcEncryptor::new(key, iv);
        let mut buf = [0u8; 64 * 1024];
        let mut total: u64 = 0;

        loop {
            let n = plaintext.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            total += n as u64;
            let ciphertext = cipher.update(&buf[..n]);
            if !ciphertext.is_empty() {
                file.write_all(&ciphertext).await?;
            }
        }
        file.write_all(&cipher.finalize()).await?;
        file.flush().await?;
        Ok(total)
    }

    /// Encrypt a small in-memory buffer (JSON artifacts) in one shot.
    pub async fn encrypt_buffer_to_file(
        &self,
        relative_path: &str,
        plaintext: &[u8],
        key: &[u8; 32],
        iv: &[u8; 16],
    ) -> Result<(), VaultError> {
        let dest = self.resolve(relative_path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let ciphertext = crate::crypto::encrypt_buffer(plaintext, key, iv);
        tokio::fs::write(&dest, ciphertext).await?;
        Ok(())
    }

    /// Read and decrypt a whole blob into memory (used for JSON artifacts —
    /// transcripts, summaries — which are small enough to buffer fully).
    pub async fn decrypt_buffer(
        &self,
        relative_path: &str,
        key: &[u8; 32],
        iv: &[u8; 16],
    ) -> Result<Vec<u8>, VaultError> {
        let path = self.resolve(relative_path);
        let ciphertext = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VaultError::NotFound(relative_path.to_string())
            } else {
                VaultError::Io(e)
            }
        })?;
        let plaintext = crate::crypto::decrypt_buffer(&ciphertext, key, iv)?;
        Ok(plaintext)
    }

    /// Open a vault-relative path for streaming decryption, returning a
    /// reader over the decrypted bytes without ever materializing the whole
    /// file in memory. Used to serve audio downloads.
    pub async fn decrypt_stream(
        &self,
        relative_path: &str,
        key: &[u8; 32],
        iv: &[u8; 16],
    ) -> Result<VaultReadStream, VaultError> {
        let path = self.resolve(relative_path);
        let file = File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VaultError::NotFound(relative_path.to_string())
            } else {
                VaultError::Io(e)
            }
        })?;
        Ok(VaultReadStream {
            file,
            cipher: Some(CbcDecryptor::new(key, iv)),
            buf: [0u8; 64 * 1024],
            done: false,
        })
    }

    pub fn path_exists(&self, relative_path: &str) -> bool {
        self.resolve(relative_path).exists()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// A lazily-decrypting stream over a vault blob. Each [`Self::next_chunk`]
/// call reads one buffer's worth of ciphertext off disk and returns the
/// plaintext it unlocks; the final PKCS#7-unpadded block is only released
/// once the underlying file is exhausted.
pub struct VaultReadStream {
    file: File,
    cipher: Option<CbcDecryptor>,
    buf: [u8; 64 * 1024],
    done: bool,
}

impl VaultReadStream {
    /// Returns `Ok(None)` once the stream is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, VaultError> {
        if self.done {
            return Ok(None);
        }
        let n = self.file.read(&mut self.buf).await?;
        let cipher = self.cipher.as_mut().expect("cipher taken after finalize");
        if n == 0 {
            self.done = true;
            let cipher = self.cipher.take().unwrap();
            let tail = cipher.finalize()?;
            return Ok(if tail.is_empty() { None } else { Some(tail) });
        }
        let plaintext = cipher.update(&self.buf[..n])?;
        Ok(Some(plaintext))
    }
}
