//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! Service configuration loaded from environment variables.

use anyhow::{anyhow, Result};
use std::env;

/// How incoming bearer tokens are authenticated.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Development default: `Authorization: Bearer <secret>.<user_id>`.
    StaticSecret(String),
    /// Production path: verify against a JWKS endpoint, `sub` claim is the user id.
    Jwks(String),
}

/// Runtime configuration for the meeting-artifact pipeline service.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub vault_dir: String,
    pub port: u16,
    pub server_master_key: [u8; 32],
    pub bot_provider_base_url: String,
    pub bot_provider_api_key: String,
    pub auth_mode: AuthMode,
    pub transcriber_bin: String,
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Clone)]
pub enum SummarizerConfig {
    Subprocess(String),
    Http(String),
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://meetvault.db".to_string());
        let vault_dir = env::var("VAULT_DIR").unwrap_or_else(|_| "./storage_vault".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3002".to_string())
            .parse()
            .unwrap_or(3002);

        let master_key_hex = env::var("SERVER_MASTER_KEY")
            .map_err(|_| anyhow!("SERVER_MASTER_KEY is required and must be 64 hex characters"))?;
        let server_master_key = parse_master_key(&master_key_hex)?;

        let bot_provider_base_url = env::var("BOT_PROVIDER_BASE_URL")
            .unwrap_or_else(|_| "https://api.meeting-bot.example".to_string());
        let bot_provider_api_key = env::var("BOT_PROVIDER_API_KEY").unwrap_or_default();

        let auth_mode = if let Ok(url) = env::var("IDENTITY_PROVIDER_JWKS_URL") {
            AuthMode::Jwks(url)
        } else {
            let secret = env::var("IDENTITY_PROVIDER_STATIC_SECRET")
                .unwrap_or_else(|_| "dev-secret".to_string());
            AuthMode::StaticSecret(secret)
        };

        let transcriber_bin = env::var("TRANSCRIBER_BIN").unwrap_or_else(|_| "whisper".to_string());
        let summarizer = if let Ok(url) = env::var("SUMMARIZER_URL") {
            SummarizerConfig::Http(url)
        } else {
            let bin = env::var("SUMMARIZER_BIN").unwrap_or_else(|_| "summarizer".to_string());
            SummarizerConfig::Subprocess(bin)
        };

        Ok(Config {
            database_url,
            vault_dir,
            port,
            server_master_key,
            bot_provider_base_url,
            bot_provider_api_key,
            auth_mode,
            transcriber_bin,
            summarizer,
        })
    }
}

fn parse_master_key(hex_str: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(hex_str.trim())
        .map_err(|_| anyhow!("SERVER_MASTER_KEY is not valid hex"))?;
    bytes
        .try_into()
        .map_err(|_| anyhow!("SERVER_MASTER_KEY must decode to exactly 32 bytes"))
}
