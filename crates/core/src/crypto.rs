//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Crypto Primitives — the three layers the rest of the workspace builds on.
//!
//! 1. **At-rest**: AES-256-CBC, one (key, iv) pair per meeting, used both as a
//!    streaming cipher (audio) and a buffered block cipher (JSON artifacts).
//! 2. **Key-wrap**: AES-256-GCM under a process-wide master key, protecting the
//!    at-rest data key while it sits in the metadata store.
//! 3. **Transport**: a fresh per-request RSA-OAEP-wrapped AES-256-CBC session
//!    cipher, so plaintext never crosses the wire.
//!
//! The three layers are never conflated — each has its own key material and
//! its own error surface, even though all three ultimately bottom out in
//! AES.

use crate::error::CryptoError;
use aes::Aes256;
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rsa::{
    pkcs8::{DecodePublicKey, EncodePublicKey},
    Oaep, RsaPublicKey,
};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// Length of an AES-256 data/master key, in bytes.
pub const KEY_LEN: usize = 32;
/// Length of an AES-CBC initialization vector, in bytes.
pub const IV_LEN: usize = 16;
/// Length of the AES-GCM nonce used for key-wrapping, in bytes.
pub const WRAP_NONCE_LEN: usize = 12;
/// Length of the AES-GCM authentication tag, in bytes.
pub const GCM_TAG_LEN: usize = 16;

const BLOCK_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Generate a fresh per-meeting data key and file IV.
///
/// Invariant 3 (§3): a key/IV pair is never reused across meetings, and a
/// meeting's key record is never updated in place — rotation implies a new
/// meeting identity.
pub fn generate_data_key() -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut key);
    rand::thread_rng().fill_bytes(&mut iv);
    (key, iv)
}

// ---------------------------------------------------------------------------
// Layer 1: at-rest AES-256-CBC, streaming
// ---------------------------------------------------------------------------

/// Incremental AES-256-CBC encryptor. Buffers input until a full 16-byte
/// block is available; `finalize` applies PKCS#7 padding to the tail.
pub struct CbcEncryptor {
    cipher: Aes256CbcEnc,
    carry: Vec<u8>,
}

impl CbcEncryptor {
    pub fn new(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN]) -> Self {
        Self {
            cipher: Aes256CbcEnc::new(key.into(), iv.into()),
            carry: Vec::with_capacity(BLOCK_LEN),
        }
    }

    /// Feed plaintext bytes in, get back as much ciphertext as can be
    /// produced without knowing whether more input is coming.
    pub fn update(&mut self, chunk: &[u8]) -> Vec<u8> {
        self.carry.extend_from_slice(chunk);

        let whole_blocks = self.carry.len() / BLOCK_LEN;
        let take = whole_blocks * BLOCK_LEN;
        if take == 0 {
            return Vec::new();
        }

        let mut out = self.carry[..take].to_vec();
        self.carry.drain(..take);

        for block in out.chunks_exact_mut(BLOCK_LEN) {
            self.cipher
                .encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        out
    }

    /// Pad the remaining tail (PKCS#7) and encrypt the final block(s).
    pub fn finalize(mut self) -> Vec<u8> {
        let pad_len = BLOCK_LEN - self.carry.len();
        self.carry.resize(BLOCK_LEN, pad_len as u8);
        for b in self.carry.iter_mut().skip(BLOCK_LEN - pad_len) {
            *b = pad_len as u8;
        }
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(&self.carry);
        self.cipher
            .encrypt_block_mut(GenericArray::from_mut_slice(&mut block));
        block.to_vec()
    }
}

/// Incremental AES-256-CBC decryptor. Always holds back the most recent full
/// block, since PKCS#7 unpadding can only happen once the last block is
/// known to be the last block.
pub struct CbcDecryptor {
    cipher: Aes256CbcDec,
    carry: Vec<u8>,
    held_block: Option<[u8; BLOCK_LEN]>,
}

impl CbcDecryptor {
    pub fn new(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN]) -> Self {
        Self {
            cipher: Aes256CbcDec::new(key.into(), iv.into()),
            carry: Vec::with_capacity(BLOCK_LEN),
            held_block: None,
        }
    }

    pub fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.carry.extend_from_slice(chunk);

        let whole_blocks = self.carry.len() / BLOCK_LEN;
        if whole_blocks == 0 {
            return Ok(Vec::new());
        }

        let take = whole_blocks * BLOCK_LEN;
        let incoming: Vec<[u8; BLOCK_LEN]> = self.carry[..take]
            .chunks_exact(BLOCK_LEN)
            .map(|c| c.try_into().unwrap())
            .collect();
        self.carry.drain(..take);

        let mut out = Vec::with_capacity(take);
        for block in incoming {
            if let Some(held) = self.held_block.take() {
                out.extend_from_slice(&self.decrypt_block(held));
            }
            self.held_block = Some(block);
        }
        Ok(out)
    }

    fn decrypt_block(&mut self, mut block: [u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
        self.cipher
            .decrypt_block_mut(GenericArray::from_mut_slice(&mut block));
        block
    }

    /// Decrypt and unpad the final held-back block.
    pub fn finalize(mut self) -> Result<Vec<u8>, CryptoError> {
        let held = self
            .held_block
            .take()
            .ok_or_else(|| CryptoError::DecryptionFailed("empty ciphertext".into()))?;
        let plain = self.decrypt_block(held);
        let pad_len = *plain.last().unwrap() as usize;
        if pad_len == 0 || pad_len > BLOCK_LEN {
            return Err(CryptoError::DecryptionFailed(
                "invalid PKCS#7 padding".into(),
            ));
        }
        Ok(plain[..BLOCK_LEN - pad_len].to_vec())
    }
}

/// Encrypt a small in-memory buffer in one shot (convenience over
/// [`CbcEncryptor`] for JSON artifacts).
pub fn encrypt_buffer(plaintext: &[u8], key: &[u8; KEY_LEN], iv: &[u8; IV_LEN]) -> Vec<u8> {
    let mut enc = CbcEncryptor::new(key, iv);
    let mut out = enc.update(plaintext);
    out.extend(enc.finalize());
    out
}

/// Decrypt a small in-memory buffer in one shot.
pub fn decrypt_buffer(
    ciphertext: &[u8],
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
) -> Result<Vec<u8>, CryptoError> {
    let mut dec = CbcDecryptor::new(key, iv);
    let mut out = dec.update(ciphertext)?;
    out.extend(dec.finalize()?);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Layer 2: key-wrap, AES-256-GCM
// ---------------------------------------------------------------------------

/// A meeting's data key, wrapped under the process master key.
#[derive(Debug, Clone)]
pub struct WrappedKey {
    pub wrapper_iv: [u8; WRAP_NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; GCM_TAG_LEN],
}

/// Wrap a meeting's 32-byte data key under the process-wide master key.
pub fn wrap_key(master_key: &[u8; KEY_LEN], data_key: &[u8; KEY_LEN]) -> WrappedKey {
    let mut wrapper_iv = [0u8; WRAP_NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut wrapper_iv);

    let cipher = Aes256Gcm::new(master_key.into());
    let nonce = Nonce::from_slice(&wrapper_iv);
    // aes-gcm appends the 16-byte tag to the end of the ciphertext.
    let mut combined = cipher
        .encrypt(nonce, data_key.as_slice())
        .expect("AES-256-GCM encryption of a 32-byte key cannot fail");

    let tag_bytes = combined.split_off(combined.len() - GCM_TAG_LEN);
    let mut tag = [0u8; GCM_TAG_LEN];
    tag.copy_from_slice(&tag_bytes);

    WrappedKey {
        wrapper_iv,
        ciphertext: combined,
        tag,
    }
}

/// Unwrap a meeting's data key. Fails with [`CryptoError::KeyUnwrapError`] on
/// tag mismatch (corrupted blob, wrong master key, or tampering).
pub fn unwrap_key(
    master_key: &[u8; KEY_LEN],
    wrapped: &WrappedKey,
) -> Result<[u8; KEY_LEN], CryptoError> {
    let cipher = Aes256Gcm::new(master_key.into());
    let nonce = Nonce::from_slice(&wrapped.wrapper_iv);

    let mut combined = wrapped.ciphertext.clone();
    combined.extend_from_slice(&wrapped.tag);

    let mut plaintext = cipher
        .decrypt(nonce, combined.as_slice())
        .map_err(|_| CryptoError::KeyUnwrapError)?;

    if plaintext.len() != KEY_LEN {
        plaintext.zeroize();
        return Err(CryptoError::KeyUnwrapError);
    }
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&plaintext);
    plaintext.zeroize();
    Ok(key)
}

// ---------------------------------------------------------------------------
// Layer 3: transport session envelope
// ---------------------------------------------------------------------------

/// Build a fresh per-request envelope: a random AES key + IV, RSA-OAEP
/// encrypted under the client's public key, plus the streaming cipher ready
/// to encrypt the response body.
///
/// Returns `(header_base64, stream_cipher)` per the §4.A contract.
pub fn build_session_envelope(
    client_public_key_pem: &str,
) -> Result<(String, CbcEncryptor), CryptoError> {
    let normalized = normalize_pem(client_public_key_pem)?;
    let public_key = RsaPublicKey::from_public_key_pem(&normalized)
        .map_err(|e| CryptoError::PubKeyFormatError(e.to_string()))?;

    let (session_key, session_iv) = generate_data_key();
    let mut blob = [0u8; KEY_LEN + IV_LEN];
    blob[..KEY_LEN].copy_from_slice(&session_key);
    blob[KEY_LEN..].copy_from_slice(&session_iv);

    let padding = Oaep::new::<Sha256>();
    let encrypted = public_key
        .encrypt(&mut rand::thread_rng(), padding, &blob)
        .map_err(|e| CryptoError::RsaError(e.to_string()))?;

    let header = base64_standard_encode(&encrypted);
    let cipher = CbcEncryptor::new(&session_key, &session_iv);
    Ok((header, cipher))
}

/// Normalize client-supplied PEM into a standard 64-character-line PEM block.
///
/// Clients transport PEM through HTTP headers, so tolerates:
/// - standard multiline PEM
/// - PEM with literal `\n` escapes instead of real newlines
/// - a header-less single-line base64 body
/// - the whole thing wrapped in a pair of double quotes
pub fn normalize_pem(raw: &str) -> Result<String, CryptoError> {
    let mut s = raw.trim().to_string();
    if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
        s = s[1..s.len() - 1].to_string();
    }
    s = s.replace("\\r\\n", "\n").replace("\\n", "\n");

    let (header, body) = if let Some(start) = s.find("-----BEGIN") {
        let header_end = s[start..]
            .find("-----\n")
            .or_else(|| s[start..].find("-----"))
            .map(|i| start + i + 5)
            .ok_or_else(|| CryptoError::PubKeyFormatError("unterminated PEM header".into()))?;
        let header_line = s[start..header_end].trim_end_matches("-----");
        let header_line = header_line.trim_start_matches("-----BEGIN ").trim();
        let tail = &s[header_end..];
        let body_end = tail
            .find("-----END")
            .ok_or_else(|| CryptoError::PubKeyFormatError("missing PEM footer".into()))?;
        (header_line.to_string(), tail[..body_end].to_string())
    } else {
        ("PUBLIC KEY".to_string(), s.clone())
    };

    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(CryptoError::PubKeyFormatError("empty key body".into()));
    }

    let mut wrapped = String::new();
    wrapped.push_str(&format!("-----BEGIN {header}-----\n"));
    for chunk in compact.as_bytes().chunks(64) {
        wrapped.push_str(std::str::from_utf8(chunk).unwrap());
        wrapped.push('\n');
    }
    wrapped.push_str(&format!("-----END {header}-----\n"));
    Ok(wrapped)
}

/// SHA-256 hex digest of the semantically meaningful text for a revision
/// (the `text` field for transcripts, the `summary` field for summaries).
/// The `actions` list is deliberately never hashed.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

fn base64_standard_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rsa::{traits::PublicKeyParts, RsaPrivateKey};

    #[test]
    fn cbc_roundtrip_empty() {
        let (key, iv) = generate_data_key();
        let ct = encrypt_buffer(b"", &key, &iv);
        let pt = decrypt_buffer(&ct, &key, &iv).unwrap();
        assert_eq!(pt, b"");
    }

    #[test]
    fn cbc_roundtrip_exact_block_multiple() {
        let (key, iv) = generate_data_key();
        let data = vec![7u8; 64]; // exactly 4 blocks
        let ct = encrypt_buffer(&data, &key, &iv);
        assert_eq!(ct.len(), 80); // one extra padding block
        let pt = decrypt_buffer(&ct, &key, &iv).unwrap();
        assert_eq!(pt, data);
    }

    #[test]
    fn cbc_roundtrip_streamed_chunks() {
        let (key, iv) = generate_data_key();
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();

        let mut enc = CbcEncryptor::new(&key, &iv);
        let mut ct = Vec::new();
        for chunk in data.chunks(37) {
            ct.extend(enc.update(chunk));
        }
        ct.extend(enc.finalize());

        let mut dec = CbcDecryptor::new(&key, &iv);
        let mut pt = Vec::new();
        for chunk in ct.chunks(53) {
            pt.extend(dec.update(chunk).unwrap());
        }
        pt.extend(dec.finalize().unwrap());

        assert_eq!(pt, data);
    }

    #[test]
    fn key_wrap_roundtrip() {
        let master = [1u8; KEY_LEN];
        let (data_key, _iv) = generate_data_key();
        let wrapped = wrap_key(&master, &data_key);
        let unwrapped = unwrap_key(&master, &wrapped).unwrap();
        assert_eq!(unwrapped, data_key);
    }

    #[test]
    fn key_wrap_tampered_tag_fails() {
        let master = [2u8; KEY_LEN];
        let (data_key, _iv) = generate_data_key();
        let mut wrapped = wrap_key(&master, &data_key);
        wrapped.tag[0] ^= 0xFF;
        assert!(matches!(
            unwrap_key(&master, &wrapped),
            Err(CryptoError::KeyUnwrapError)
        ));
    }

    #[test]
    fn key_wrap_tampered_ciphertext_fails() {
        let master = [3u8; KEY_LEN];
        let (data_key, _iv) = generate_data_key();
        let mut wrapped = wrap_key(&master, &data_key);
        wrapped.ciphertext[0] ^= 0xFF;
        assert!(unwrap_key(&master, &wrapped).is_err());
    }

    #[test]
    fn key_wrap_tampered_iv_fails() {
        let master = [4u8; KEY_LEN];
        let (data_key, _iv) = generate_data_key();
        let mut wrapped = wrap_key(&master, &data_key);
        wrapped.wrapper_iv[0] ^= 0xFF;
        assert!(unwrap_key(&master, &wrapped).is_err());
    }

    fn test_rsa_pem() -> (RsaPrivateKey, String) {
        let private = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let public = RsaPublicKey::from(&private);
        let pem = public
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();
        (private, pem)
    }

    #[test]
    fn session_envelope_roundtrip() {
        let (private, pem) = test_rsa_pem();
        let (header_b64, mut cipher) = build_session_envelope(&pem).unwrap();

        let plaintext = b"the quick brown fox jumps over the lazy dog";
        let mut ct = cipher.update(plaintext);
        ct.extend(cipher.finalize());

        use base64::Engine;
        let rsa_ct = base64::engine::general_purpose::STANDARD
            .decode(header_b64)
            .unwrap();
        let padding = Oaep::new::<Sha256>();
        let blob = private.decrypt(padding, &rsa_ct).unwrap();
        let key: [u8; KEY_LEN] = blob[..KEY_LEN].try_into().unwrap();
        let iv: [u8; IV_LEN] = blob[KEY_LEN..].try_into().unwrap();

        let pt = decrypt_buffer(&ct, &key, &iv).unwrap();
        assert_eq!(pt, plaintext);
    }

    #[test]
    fn pem_tolerates_escaped_newlines() {
        let (_priv, pem) = test_rsa_pem();
        let escaped = pem.replace('\n', "\\n");
        assert!(build_session_envelope(&escaped).is_ok());
    }

    #[test]
    fn pem_tolerates_headerless_base64() {
        let (_priv, pem) = test_rsa_pem();
        let body: String = pem
            .lines()
            .filter(|l| !l.starts_with("-----"))
            .collect::<Vec<_>>()
            .join("");
        assert!(build_session_envelope(&body).is_ok());
    }

    #[test]
    fn pem_tolerates_surrounding_quotes() {
        let (_priv, pem) = test_rsa_pem();
        let quoted = format!("\"{pem}\"");
        assert!(build_session_envelope(&quoted).is_ok());
    }

    #[test]
    fn content_hash_is_deterministic_and_excludes_actions() {
        let h1 = content_hash("hello world");
        let h2 = content_hash("hello world");
        assert_eq!(h1, h2);
        assert_ne!(h1, content_hash("hello world!"));
    }
}
