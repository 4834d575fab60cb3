//! Shared helpers for CLI integration tests.

#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{Value, json};

pub const ALICE: &str = "11111111-1111-4111-8111-111111111111";
pub const BOB: &str = "22222222-2222-4222-8222-222222222222";
pub const ACCESS_TOKEN: &str = "access-token-for-tests-0123456789";

/// `connectify` isolated in `home` and pointed at `backend`.
pub fn connectify(home: &Path, backend: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("connectify");
    cmd.env("CONNECTIFY_HOME", home)
        .env("CONNECTIFY_BACKEND_URL", backend)
        .env("CONNECTIFY_ANON_KEY", "anon-key")
        .env("CONNECTIFY_NO_BROWSER", "1")
        .env_remove("CONNECTIFY_PASSWORD");
    cmd
}

pub fn user_json(id: &str, email: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "user_metadata": { "full_name": "Alice Liddell" }
    })
}

pub fn session_json(user_id: &str) -> Value {
    json!({
        "access_token": ACCESS_TOKEN,
        "refresh_token": "refresh-token",
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": far_future_epoch(),
        "user": user_json(user_id, "alice@example.com"),
    })
}

/// Writes a cached session for `user_id` so commands start signed in.
pub fn sign_in_as(home: &Path, user_id: &str) {
    std::fs::create_dir_all(home).unwrap();
    std::fs::write(
        home.join("session.json"),
        serde_json::to_string_pretty(&session_json(user_id)).unwrap(),
    )
    .unwrap();
}

pub fn post_row(id: &str, author: &str, content: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "user_id": author,
        "content": content,
        "media_url": null,
        "post_type": "post",
        "created_at": created_at,
    })
}

fn far_future_epoch() -> i64 {
    // 2100-01-01T00:00:00Z
    4_102_444_800
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}
