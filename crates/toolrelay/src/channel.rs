//! Tool channel: one JSON-RPC request, one reply.
//!
//! [`SpawnChannel`] starts a fresh tool server process for every call,
//! writes the request line, closes stdin and reads stdout until the process
//! exits. Nothing is shared between calls, so a server that keeps per
//! session state (e.g. requiring `initialize` first) sees a new session
//! each time.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use relayconf::ToolsConfig;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use toolwire::{JsonRpcReply, JsonRpcRequest, RequestId};
use tracing::{debug, trace};

use crate::error::ChannelError;

/// Id carried by every request. Each call runs in its own process, so
/// there is never more than one request in flight per server.
pub const REQUEST_ID: i64 = 1;

/// Default bound on one spawn-write-wait cycle.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// How much raw output to keep in decode errors.
const OUTPUT_SNIPPET_LEN: usize = 512;

/// Sends a request to the tool server and returns the reply's `result`.
///
/// A JSON-RPC `error` reply surfaces as [`ChannelError::Rejected`].
#[async_trait]
pub trait ToolChannel: Send + Sync {
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, ChannelError>;
}

/// Spawns the configured executable once per call.
#[derive(Debug, Clone)]
pub struct SpawnChannel {
    command: PathBuf,
    timeout: Duration,
}

impl SpawnChannel {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(config.command.clone()).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    async fn run(&self, method: &str, request: &[u8]) -> Result<Output, ChannelError> {
        let mut child = Command::new(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ChannelError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let write = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            stdin.write_all(request).await?;
            // dropping stdin closes the pipe and the server sees EOF
            stdin.shutdown().await
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());

        if let Err(err) = written {
            // A server that exits without reading its input still gets to
            // report through its output and exit status.
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(ChannelError::Io {
                    method: method.to_string(),
                    source: err,
                });
            }
            debug!(%method, "tool server closed stdin before reading the request");
        }

        output.map_err(|source| ChannelError::Io {
            method: method.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ToolChannel for SpawnChannel {
    #[tracing::instrument(
        name = "tool.call",
        skip(self, params),
        fields(tool.command = %self.command.display())
    )]
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, ChannelError> {
        let request = match params {
            Some(params) => JsonRpcRequest::with_params(REQUEST_ID, method, params),
            None => JsonRpcRequest::new(REQUEST_ID, method),
        };
        let mut line = serde_json::to_vec(&request).map_err(|source| ChannelError::Encode {
            method: method.to_string(),
            source,
        })?;
        line.push(b'\n');

        let output = tokio::time::timeout(self.timeout, self.run(method, &line))
            .await
            .map_err(|_| ChannelError::TimedOut {
                method: method.to_string(),
                after: self.timeout,
            })??;

        debug!(
            %method,
            status = %output.status,
            output = %String::from_utf8_lossy(&output.stdout),
            "raw tool server output"
        );

        if !output.status.success() {
            return Err(ChannelError::Exited {
                method: method.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let reply = select_reply(method, &output.stdout)?;
        reply.into_result().map_err(|error| ChannelError::Rejected {
            method: method.to_string(),
            error,
        })
    }
}

/// Find the reply to our request in the server's stdout.
///
/// The output is read as a sequence of JSON values. Values without an `id`
/// (notifications, log lines the server chose to emit as JSON) are skipped,
/// as are replies to other ids. A `null`-id error reply is the server saying
/// it could not read our request and is taken as the answer.
fn select_reply(method: &str, stdout: &[u8]) -> Result<JsonRpcReply, ChannelError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(ChannelError::EmptyOutput {
            method: method.to_string(),
        });
    }

    let decode_error = |message: String| ChannelError::Decode {
        method: method.to_string(),
        message,
        output: snippet(stdout),
    };

    let expected = RequestId::Number(REQUEST_ID);
    let values = serde_json::Deserializer::from_slice(stdout).into_iter::<Value>();

    for value in values {
        let value = value.map_err(|err| decode_error(err.to_string()))?;

        let Some(id) = value.get("id") else {
            trace!(%method, "skipping message without id");
            continue;
        };
        let id_is_null = id.is_null();

        let reply: JsonRpcReply =
            serde_json::from_value(value).map_err(|err| decode_error(err.to_string()))?;

        match &reply.id {
            Some(id) if *id == expected => return Ok(reply),
            None if id_is_null && reply.error.is_some() => return Ok(reply),
            _ => trace!(%method, "skipping reply to another request"),
        }
    }

    Err(ChannelError::NoReply {
        method: method.to_string(),
        id: expected,
    })
}

fn snippet(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    match text.char_indices().nth(OUTPUT_SNIPPET_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
