//! End-to-end runs of the relaychat binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const RELAY_VARS: &[&str] = &[
    "TOOLRELAY_MODEL_ENDPOINT",
    "TOOLRELAY_MODEL_TOKEN",
    "TOOLRELAY_TLS_INSECURE",
    "TOOLRELAY_MODEL_TIMEOUT_SECS",
    "TOOLRELAY_TOOL_COMMAND",
    "TOOLRELAY_TOOL_TIMEOUT_SECS",
    "TOOLRELAY_LOG_LEVEL",
    "RUST_LOG",
];

/// The binary with a clean environment and an empty home directory.
fn relaychat(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("relaychat").unwrap();
    for var in RELAY_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home).env_remove("XDG_CONFIG_HOME");
    cmd.current_dir(home);
    cmd
}

fn write_config(dir: &TempDir, endpoint: &str, command: &Path) -> PathBuf {
    let path = dir.path().join("relay.toml");
    std::fs::write(
        &path,
        format!(
            "[model]\nendpoint = \"{endpoint}\"\ntoken = \"sekrit\"\n\n[tools]\ncommand = \"{}\"\n",
            command.display()
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_config_shows_effective_settings() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, "https://example.test/generate", Path::new("/opt/tools/hello-mcp"));

    relaychat(home.path())
        .args(["--config"])
        .arg(&config)
        .args(["config", "--tool-command", "/usr/bin/other-tool"])
        .assert()
        .success()
        .stdout(predicate::str::contains("endpoint = \"https://example.test/generate\""))
        .stdout(predicate::str::contains("command = \"/usr/bin/other-tool\""))
        .stdout(predicate::str::contains("token = \"<redacted>\""))
        .stdout(predicate::str::contains("sekrit").not())
        .stdout(predicate::str::contains("# loaded:"));
}

#[test]
fn test_ask_without_endpoint_fails() {
    let home = TempDir::new().unwrap();

    relaychat(home.path())
        .args(["ask", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("model.endpoint"));
}

#[cfg(unix)]
mod with_tool_server {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// A tool server that advertises one tool and answers initialize.
    fn tool_server(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("tool-server.sh");
        let script = r#"#!/bin/sh
read -r line
case "$line" in
  *'"tools/list"'*)
    echo '{"jsonrpc":"2.0","id":1,"result":{"tools":[{"name":"hello_world","description":"Say hello to someone","inputSchema":{"type":"object"}}]}}' ;;
  *)
    echo '{"jsonrpc":"2.0","id":1,"result":{}}' ;;
esac
"#;
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_tools_lists_catalog() {
        let home = TempDir::new().unwrap();
        let server = tool_server(&home);

        relaychat(home.path())
            .args(["tools", "--endpoint", "https://example.test/generate", "--tool-command"])
            .arg(&server)
            .assert()
            .success()
            .stdout(predicate::str::contains("hello_world - Say hello to someone"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ask_prints_model_text() {
        let model = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "hi there" }] },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&model)
            .await;

        let home = TempDir::new().unwrap();
        let server = tool_server(&home);
        let config = write_config(&home, &model.uri(), &server);

        let assert = tokio::task::spawn_blocking(move || {
            relaychat(home.path())
                .arg("--config")
                .arg(&config)
                .args(["ask", "hello"])
                .assert()
        })
        .await
        .unwrap();

        assert.success().stdout("hi there\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ask_reports_model_error() {
        let model = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&model)
            .await;

        let home = TempDir::new().unwrap();
        let server = tool_server(&home);
        let config = write_config(&home, &model.uri(), &server);

        let assert = tokio::task::spawn_blocking(move || {
            relaychat(home.path())
                .arg("--config")
                .arg(&config)
                .args(["ask", "hello"])
                .assert()
        })
        .await
        .unwrap();

        assert
            .failure()
            .stderr(predicate::str::contains("model API error"));
    }
}
