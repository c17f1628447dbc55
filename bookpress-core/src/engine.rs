//! Pandoc-backed [`DocumentEngine`]: spawns one conversion process per build
//! and forwards its output streams to the log while waiting for it to exit.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{error, info};

use crate::contract::{DocumentEngine, EngineError, Invocation};

/// The production engine. Stateless: the program to run comes in with each
/// [`Invocation`], so one engine value serves every format build.
#[derive(Debug, Default, Clone, Copy)]
pub struct PandocEngine;

impl PandocEngine {
    pub fn new() -> Self {
        PandocEngine
    }
}

#[async_trait]
impl DocumentEngine for PandocEngine {
    async fn run(&self, invocation: &Invocation) -> Result<(), EngineError> {
        info!(command = %invocation, "[ENGINE] Spawning conversion process");

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(EngineError::Spawn)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Io(std::io::Error::other("child stdout not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Io(std::io::Error::other("child stderr not captured")))?;

        // Drain both pipes to EOF before reaping the child, so no diagnostic
        // line is lost. Lines are forwarded in per-stream arrival order; there
        // is no ordering guarantee between the two streams.
        futures::future::try_join(
            forward_lines(stdout, StreamKind::Stdout),
            forward_lines(stderr, StreamKind::Stderr),
        )
        .await
        .map_err(EngineError::Io)?;

        let status = child.wait().await.map_err(EngineError::Io)?;
        match status.code() {
            Some(0) => {
                info!("[ENGINE] Conversion process exited successfully");
                Ok(())
            }
            Some(code) => {
                error!(code, "[ENGINE] Conversion process exited with failure");
                Err(EngineError::Exit(code))
            }
            None => {
                error!("[ENGINE] Conversion process terminated by signal");
                Err(EngineError::Interrupted)
            }
        }
    }
}

#[derive(Clone, Copy)]
enum StreamKind {
    Stdout,
    Stderr,
}

async fn forward_lines<R>(stream: R, kind: StreamKind) -> Result<(), std::io::Error>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines.next_line().await? {
        match kind {
            StreamKind::Stdout => info!(line = %line, "[ENGINE] tool output"),
            StreamKind::Stderr => error!(line = %line, "[ENGINE] tool error output"),
        }
    }
    Ok(())
}
