//! hello-mcp - stdio tool server
//!
//! Reads JSON-RPC requests from stdin, one per line, and writes one reply
//! line per request to stdout. Exits cleanly at EOF. Logs go to stderr since
//! stdout is the protocol channel.

use anyhow::{Context, Result};
use hello_mcp::HelloServer;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let server = HelloServer::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let Some(reply) = server.handle_line(&line) else {
            continue;
        };

        let mut out = serde_json::to_vec(&reply).context("Failed to encode reply")?;
        out.push(b'\n');
        stdout.write_all(&out).await.context("Failed to write reply")?;
        stdout.flush().await.context("Failed to flush stdout")?;
        handled += 1;
    }

    info!(handled, "stdin closed, shutting down");
    Ok(())
}
