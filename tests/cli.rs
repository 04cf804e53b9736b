//! End-to-end tests driving the star-follower binary

mod common;

use common::{star, starred_entry, TestEnvironment};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_cli_help() {
    let env = TestEnvironment::new();
    let output = env.command().arg("--help").output().expect("Failed to run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--dump", "--self", "--pages", "--export", "--orderby", "--nlen", "--dlen"] {
        assert!(stdout.contains(flag), "help is missing {}", flag);
    }
}

#[test]
fn test_cli_version() {
    let env = TestEnvironment::new();
    let output = env.command().arg("--version").output().expect("Failed to run binary");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("star-follower"));
}

#[test]
fn test_no_action_prints_usage_and_fails() {
    let env = TestEnvironment::new();
    let output = env.command().output().expect("Failed to run binary");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("examples:"));
    assert!(!env.db_path.exists());
}

#[cfg(target_os = "linux")]
#[test]
fn test_first_run_logs_created_config() {
    let env = TestEnvironment::new();
    let output = env
        .command_without_config()
        .arg("--db")
        .arg(&env.db_path)
        .arg("--export")
        .arg(env.path("stars.md"))
        .args(["-f", "markdown"])
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let created = env.path("star-follower/config.yml");
    assert!(created.exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Created default configuration"), "{}", stderr);
}

#[test]
fn test_invalid_orderby_rejected() {
    let env = TestEnvironment::new();
    let output = env
        .command()
        .args(["--export", "out.md", "--orderby", "popularity"])
        .output()
        .expect("Failed to run binary");

    assert!(!output.status.success());
}

#[test]
fn test_export_markdown_from_existing_database() {
    let env = TestEnvironment::new();
    env.seed(vec![
        star(10, "bob", 3, "small-tool"),
        star(20, "carol", 300, "big-framework-with-a-long-name"),
    ]);
    let out = env.path("stars.md");

    let output = env
        .command()
        .arg("--export")
        .arg(&out)
        .args(["-f", "markdown", "--nlen", "9"])
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let content = std::fs::read_to_string(&out).unwrap();
    let rows: Vec<&str> = content.lines().skip(2).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("| carol | 20 | 300 |"));
    assert!(rows[0].contains("| big-frame ... |"));
    assert!(rows[1].starts_with("| bob | 10 | 3 |"));
}

#[test]
fn test_export_json_ascending_by_stars() {
    let env = TestEnvironment::new();
    env.seed(vec![star(1, "bob", 50, "a"), star(2, "bob", 5, "b")]);
    let out = env.path("stars.json");

    let output = env
        .command()
        .arg("--export")
        .arg(&out)
        .args(["-f", "json", "--orderby", "stars", "--ascending"])
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed[0]["repo_id"], 2);
    assert_eq!(parsed[1]["repo_id"], 1);
}

#[test]
fn test_unsupported_database_url_fails() {
    let env = TestEnvironment::new();
    let output = env
        .command()
        .args(["--db", "postgres://localhost/stars", "--export"])
        .arg(env.path("stars.md"))
        .output()
        .expect("Failed to run binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("postgres://localhost/stars"));
}

async fn mount(server: &MockServer, route: &str, page: u32, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_dump_then_export() {
    let server = MockServer::start().await;
    mount(&server, "/users/alice/following", 1, json!([{"login": "bob"}])).await;
    mount(&server, "/users/alice/following", 2, json!([])).await;
    mount(
        &server,
        "/users/bob/starred",
        1,
        json!([starred_entry(7, 70, "seven"), starred_entry(8, 80, "eight")]),
    )
    .await;
    mount(&server, "/users/bob/starred", 2, json!([])).await;

    let env = TestEnvironment::with_api_url(&server.uri());
    let out = env.path("stars.json");

    let output = tokio::process::Command::from(env.command())
        .args(["--dump", "alice", "--export"])
        .arg(&out)
        .args(["-f", "json"])
        .output()
        .await
        .expect("Failed to run binary");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(env.open_store().count().unwrap(), 2);

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed[0]["repo_id"], 8);
    assert_eq!(parsed[0]["starred_by"], "bob");
}

#[tokio::test]
async fn test_dump_aborts_with_nonzero_exit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost/following"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let env = TestEnvironment::with_api_url(&server.uri());
    let output = tokio::process::Command::from(env.command())
        .args(["--dump", "ghost"])
        .output()
        .await
        .expect("Failed to run binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("aborted"), "{}", stderr);
    assert_eq!(env.open_store().count().unwrap(), 0);
}
