//! Integration tests for login/logout/whoami and follow commands.

mod fixtures;

use fixtures::{ALICE, BOB, connectify, session_json, sign_in_as, user_json};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_login_requires_a_method() {
    let home = TempDir::new().unwrap();
    connectify(home.path(), "http://127.0.0.1:9")
        .arg("login")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please specify --email"));
}

#[test]
fn test_logout_when_not_signed_in() {
    let home = TempDir::new().unwrap();
    connectify(home.path(), "http://127.0.0.1:9")
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));
}

#[test]
fn test_whoami_without_session_fails() {
    let home = TempDir::new().unwrap();
    connectify(home.path(), "http://127.0.0.1:9")
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not signed in"));
}

#[tokio::test]
async fn test_login_with_password_stores_session() {
    if !fixtures::can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_partial_json(json!({
            "email": "alice@example.com",
            "password": "hunter2",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json(ALICE)))
        .expect(1)
        .mount(&server)
        .await;

    connectify(home.path(), &server.uri())
        .env("CONNECTIFY_PASSWORD", "hunter2")
        .args(["login", "--email", "alice@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as Alice Liddell"));

    let saved = std::fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(saved.contains(ALICE));
}

#[tokio::test]
async fn test_login_reads_password_from_stdin() {
    if !fixtures::can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(body_partial_json(json!({ "password": "from-stdin" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json(ALICE)))
        .expect(1)
        .mount(&server)
        .await;

    connectify(home.path(), &server.uri())
        .args(["login", "--email", "alice@example.com"])
        .write_stdin("from-stdin\n")
        .assert()
        .success();
}

#[tokio::test]
async fn test_rejected_password_exits_with_error() {
    if !fixtures::can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    connectify(home.path(), &server.uri())
        .env("CONNECTIFY_PASSWORD", "wrong")
        .args(["login", "--email", "alice@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid login credentials"));
    assert!(!home.path().join("session.json").exists());
}

#[tokio::test]
async fn test_logout_clears_session_even_if_provider_fails() {
    if !fixtures::can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    sign_in_as(home.path(), ALICE);
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    connectify(home.path(), &server.uri())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));
    assert!(!home.path().join("session.json").exists());
}

#[tokio::test]
async fn test_whoami_prints_user() {
    if !fixtures::can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    sign_in_as(home.path(), ALICE);
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(user_json(ALICE, "alice@example.com")),
        )
        .mount(&server)
        .await;

    connectify(home.path(), &server.uri())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice Liddell"))
        .stdout(predicate::str::contains(ALICE));
}

#[tokio::test]
async fn test_follow_skips_insert_when_already_following() {
    if !fixtures::can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    sign_in_as(home.path(), ALICE);
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/follows"))
        .and(query_param("follower_id", format!("eq.{ALICE}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "following_id": BOB }])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/follows"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    connectify(home.path(), &server.uri())
        .args(["follow", BOB])
        .assert()
        .success()
        .stdout(predicate::str::contains("Already following"));
}

#[tokio::test]
async fn test_follow_inserts_edge() {
    if !fixtures::can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    sign_in_as(home.path(), ALICE);
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/follows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/follows"))
        .and(body_partial_json(json!({
            "follower_id": ALICE,
            "following_id": BOB,
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    connectify(home.path(), &server.uri())
        .args(["follow", BOB])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Following {BOB}")));
}

#[test]
fn test_follow_self_is_refused() {
    let home = TempDir::new().unwrap();
    sign_in_as(home.path(), ALICE);
    connectify(home.path(), "http://127.0.0.1:9")
        .args(["follow", ALICE])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot follow yourself"));
}
