//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: trustedge — Privacy and trust at the edge.
//

//! End-to-end HTTP API tests over an in-memory SQLite store and a
//! temp-directory vault. Meeting fixtures are seeded directly through
//! `Store`/`Vault` rather than a live bot provider, since joining a real
//! meeting is out of reach for a test process; every meeting below starts
//! life already `Completed`, which is the state the handlers care about.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use meetvault_core::crypto::{content_hash, generate_data_key};
use meetvault_core::Vault;
use meetvault_platform::bot::BotAdapter;
use meetvault_platform::http::config::AuthMode;
use meetvault_platform::http::{create_router, AppState, IdentityVerifier};
use meetvault_platform::processors::{Summarizer, Transcriber};
use meetvault_platform::store::create_connection_pool;
use meetvault_platform::{Pipeline, Store};
use meetvault_types::revision::{RevisionKind, Segment, SummaryContent, TranscriptContent};
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::collections::HashMap;
use tower::ServiceExt;

const STATIC_SECRET: &str = "test-secret";

struct Fixture {
    app: axum::Router,
    meeting_id: String,
    transcript: TranscriptContent,
    summary: SummaryContent,
    rsa_private: RsaPrivateKey,
    rsa_pem: String,
}

async fn build_fixture() -> Fixture {
    let pool = create_connection_pool("sqlite::memory:")
        .await
        .expect("in-memory sqlite pool should open");
    meetvault_platform::store::run_migrations(&pool)
        .await
        .expect("migrations should apply");
    let store = Store::new(pool, [3u8; 32]);

    let dir = tempfile::tempdir().expect("tempdir");
    let vault = Vault::new(dir.path());

    let meeting_id = "bot-fixture-1".to_string();
    store
        .create_meeting("user-1", &meeting_id)
        .await
        .expect("create_meeting");

    let (key, iv) = generate_data_key();
    store
        .store_meeting_key(&meeting_id, &key, &iv)
        .await
        .expect("store_meeting_key");

    let transcript = TranscriptContent {
        text: "we discussed the Q3 roadmap".to_string(),
        segments: vec![Segment {
            start: 0.0,
            end: 4.2,
            text: "we discussed the Q3 roadmap".to_string(),
            speaker: Some("alice".to_string()),
        }],
    };
    let summary = SummaryContent {
        summary: "met to discuss Q3 roadmap".to_string(),
        actions: vec!["send follow-up notes".to_string()],
    };

    let transcript_path = format!("{meeting_id}/transcript_v1.json");
    let summary_path = format!("{meeting_id}/summary_v1.json");
    vault
        .encrypt_buffer_to_file(
            &transcript_path,
            &serde_json::to_vec(&transcript).unwrap(),
            &key,
            &iv,
        )
        .await
        .expect("encrypt transcript");
    vault
        .encrypt_buffer_to_file(
            &summary_path,
            &serde_json::to_vec(&summary).unwrap(),
            &key,
            &iv,
        )
        .await
        .expect("encrypt summary");

    let transcript_hash = content_hash(&transcript.text);
    store
        .add_revision(&meeting_id, 1, &transcript_hash, &transcript_path, RevisionKind::Transcript)
        .await
        .expect("add transcript revision");
    let summary_hash = content_hash(&summary.summary);
    store
        .add_revision(&meeting_id, 1, &summary_hash, &summary_path, RevisionKind::Summary)
        .await
        .expect("add summary revision");

    let mut paths = HashMap::new();
    paths.insert("transcript".to_string(), transcript_path);
    paths.insert("summary".to_string(), summary_path);
    store
        .update_process_state(
            &meeting_id,
            meetvault_types::meeting::ProcessState::Completed,
            Some(&paths),
            Some(95),
        )
        .await
        .expect("update_process_state");

    let bot = BotAdapter::new("https://bot.invalid".to_string(), "unused".to_string());
    let transcriber = Transcriber::new("whisper");
    let summarizer = Summarizer::subprocess("summarizer");
    let pipeline = Pipeline::new(store, vault, bot, transcriber, summarizer);
    let identity = IdentityVerifier::new(AuthMode::StaticSecret(STATIC_SECRET.to_string()));
    let app = create_router(AppState { pipeline, identity });

    let rsa_private = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("rsa keygen");
    let rsa_pem = RsaPublicKey::from(&rsa_private)
        .to_public_key_pem(LineEnding::LF)
        .expect("pem encode");

    Fixture {
        app,
        meeting_id,
        transcript,
        summary,
        rsa_private,
        rsa_pem,
    }
}

fn bearer(user_id: &str) -> String {
    format!("Bearer {STATIC_SECRET}.{user_id}")
}

fn unseal(rsa_private: &RsaPrivateKey, header_b64: &str, ciphertext: &[u8]) -> Vec<u8> {
    let rsa_ct = base64::engine::general_purpose::STANDARD
        .decode(header_b64)
        .expect("header is valid base64");
    let blob = rsa_private
        .decrypt(Oaep::new::<Sha256>(), &rsa_ct)
        .expect("rsa decrypt");
    let key: [u8; 32] = blob[..32].try_into().unwrap();
    let iv: [u8; 16] = blob[32..].try_into().unwrap();
    meetvault_core::crypto::decrypt_buffer(ciphertext, &key, &iv).expect("aes decrypt")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let fixture = build_fixture().await;
    let response = fixture
        .app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn meetings_list_is_scoped_to_the_authenticated_user() {
    let fixture = build_fixture().await;

    let response = fixture
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/meetings")
                .header("authorization", bearer("user-1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["meetings"].as_array().unwrap().len(), 1);

    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .uri("/api/meetings")
                .header("authorization", bearer("someone-else"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["meetings"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn status_endpoint_reports_complete_without_touching_the_bot_provider() {
    let fixture = build_fixture().await;
    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/api/status/{}", fixture.meeting_id))
                .header("authorization", bearer("user-1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "complete");
}

#[tokio::test]
async fn non_owner_is_forbidden_from_reading_the_transcript() {
    let fixture = build_fixture().await;
    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/api/data/{}/transcript", fixture.meeting_id))
                .header("authorization", bearer("someone-else"))
                .header("X-Public-Key", fixture.rsa_pem.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_bearer_token_is_unauthorized() {
    let fixture = build_fixture().await;
    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/api/status/{}", fixture.meeting_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn transcript_round_trips_through_the_session_envelope() {
    let fixture = build_fixture().await;
    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/api/data/{}/transcript", fixture.meeting_id))
                .header("authorization", bearer("user-1"))
                .header("X-Public-Key", fixture.rsa_pem.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let header_b64 = response
        .headers()
        .get("X-Encrypted-Key")
        .expect("X-Encrypted-Key header present")
        .to_str()
        .unwrap()
        .to_string();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let plaintext = unseal(&fixture.rsa_private, &header_b64, &body);
    let decoded: TranscriptContent = serde_json::from_slice(&plaintext).unwrap();
    assert_eq!(decoded.text, fixture.transcript.text);
    assert_eq!(decoded.segments.len(), fixture.transcript.segments.len());
}

#[tokio::test]
async fn history_lists_both_revision_kinds_newest_first() {
    let fixture = build_fixture().await;
    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/api/history/{}", fixture.meeting_id))
                .header("authorization", bearer("user-1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let revisions = json["revisions"].as_array().unwrap();
    assert_eq!(revisions.len(), 2);
}

#[tokio::test]
async fn history_type_query_filters_to_the_requested_kind() {
    let fixture = build_fixture().await;
    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/api/history/{}?type=transcript", fixture.meeting_id))
                .header("authorization", bearer("user-1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let revisions = json["revisions"].as_array().unwrap();
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0]["type"], "transcript");
}

#[tokio::test]
async fn verify_finds_an_exact_content_hash_match() {
    let fixture = build_fixture().await;
    let payload = serde_json::json!({ "content": fixture.summary.summary });
    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/verify")
                .header("authorization", bearer("user-1"))
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["verified"], true);
    assert_eq!(json["type"], "summary");
}

#[tokio::test]
async fn verify_falls_back_to_a_fuzzy_match_on_rehashed_whitespace() {
    let fixture = build_fixture().await;
    let reflowed = fixture.transcript.text.replace(' ', "   \n");
    let payload = serde_json::json!({
        "content": reflowed,
        "meeting_id": fixture.meeting_id,
    });
    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/verify")
                .header("authorization", bearer("user-1"))
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["verified"], true);
    assert_eq!(json["message"], "fuzzy match");
}

#[tokio::test]
async fn checkout_then_revert_round_trip_updates_the_active_version() {
    let fixture = build_fixture().await;

    let edit_payload = serde_json::json!({ "text": "corrected transcript text" });
    let response = fixture
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/edit/{}", fixture.meeting_id))
                .header("authorization", bearer("user-1"))
                .header("content-type", "application/json")
                .body(Body::from(edit_payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["version"], 2);

    let checkout_payload = serde_json::json!({ "version": 1 });
    let response = fixture
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/meeting/{}/checkout", fixture.meeting_id))
                .header("authorization", bearer("user-1"))
                .header("content-type", "application/json")
                .body(Body::from(checkout_payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
