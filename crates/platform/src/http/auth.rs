//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Bearer token authentication.
//!
//! Two modes, selected by `Config::auth_mode`: a static-secret development
//! mode, and a JWKS-backed mode for production identity providers. Both
//! resolve to a stable user id string, which is all the rest of the
//! service needs to know about "who is asking."

use crate::error::ApiError;
use crate::http::config::AuthMode;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
    #[serde(default)]
    alg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Resolves a bearer token to a user id, per the configured auth mode.
pub struct IdentityVerifier {
    mode: AuthMode,
    client: reqwest::Client,
    jwks_cache: RwLock<Option<JwksDocument>>,
}

impl IdentityVerifier {
    pub fn new(mode: AuthMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            client: reqwest::Client::new(),
            jwks_cache: RwLock::new(None),
        })
    }

    pub async fn authenticate(&self, token: &str) -> Result<String, ApiError> {
        match &self.mode {
            AuthMode::StaticSecret(secret) => self.authenticate_static(token, secret),
            AuthMode::Jwks(url) => self.authenticate_jwks(token, url).await,
        }
    }

    fn authenticate_static(&self, token: &str, secret: &str) -> Result<String, ApiError> {
        let (got_secret, user_id) = token.split_once('.').ok_or(ApiError::Auth)?;
        if got_secret != secret || user_id.is_empty() {
            return Err(ApiError::Auth);
        }
        Ok(user_id.to_string())
    }

    async fn authenticate_jwks(&self, token: &str, url: &str) -> Result<String, ApiError> {
        let header = decode_header(token).map_err(|_| ApiError::Auth)?;
        let kid = header.kid.ok_or(ApiError::Auth)?;

        let decoding_key = self.find_key(url, &kid).await?;
        let mut validation = Validation::new(header.alg);
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|_| ApiError::Auth)?;
        Ok(data.claims.sub)
    }

    async fn find_key(&self, url: &str, kid: &str) -> Result<DecodingKey, ApiError> {
        {
            let cache = self.jwks_cache.read().await;
            if let Some(doc) = cache.as_ref() {
                if let Some(key) = doc.keys.iter().find(|k| k.kid == kid) {
                    return jwk_to_decoding_key(key);
                }
            }
        }

        let doc = self.fetch_jwks(url).await?;
        let key = doc
            .keys
            .iter()
            .find(|k| k.kid == kid)
            .ok_or(ApiError::Auth)
            .and_then(jwk_to_decoding_key)?;

        let mut cache = self.jwks_cache.write().await;
        *cache = Some(doc);
        Ok(key)
    }

    async fn fetch_jwks(&self, url: &str) -> Result<JwksDocument, ApiError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "failed to fetch JWKS document");
            ApiError::Auth
        })?;
        resp.json::<JwksDocument>().await.map_err(|e| {
            warn!(error = %e, "JWKS document was not valid JSON");
            ApiError::Auth
        })
    }
}

fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, ApiError> {
    let _alg: Algorithm = jwk
        .alg
        .as_deref()
        .map(|a| a.parse().unwrap_or(Algorithm::RS256))
        .unwrap_or(Algorithm::RS256);
    DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|_| ApiError::Auth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_secret_accepts_matching_prefix() {
        let verifier = IdentityVerifier::new(AuthMode::StaticSecret("dev-secret".to_string()));
        let user_id = verifier.authenticate("dev-secret.user-42").await.unwrap();
        assert_eq!(user_id, "user-42");
    }

    #[tokio::test]
    async fn static_secret_rejects_wrong_secret() {
        let verifier = IdentityVerifier::new(AuthMode::StaticSecret("dev-secret".to_string()));
        let result = verifier.authenticate("wrong.user-42").await;
        assert!(matches!(result, Err(ApiError::Auth)));
    }

    #[tokio::test]
    async fn static_secret_rejects_malformed_token() {
        let verifier = IdentityVerifier::new(AuthMode::StaticSecret("dev-secret".to_string()));
        let result = verifier.authenticate("no-dot-here").await;
        assert!(matches!(result, Err(ApiError::Auth)));
    }
}
