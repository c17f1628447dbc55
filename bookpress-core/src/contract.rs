#![allow(unused)]

//! # contract: the seam between the build coordinator and the conversion tool
//!
//! This module defines the [`DocumentEngine`] trait and the plain data types
//! crossing it. The coordinator composes an [`Invocation`] (program plus
//! argument list) and hands it to an engine; the engine runs exactly one child
//! process per call and resolves once with the child's outcome.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests; no conversion tool needs
//!   to be installed to test the coordinator.
//!
//! ## Adding New Engines
//! - Implement the trait for your engine (a different conversion tool, a
//!   containerized run, a recording fake).
//! - Keep the contract: one spawn per call, resolve exactly once, map the
//!   child's exit into [`EngineError`] rather than panicking.

use async_trait::async_trait;

use mockall::{automock, predicate::*};

/// A fully composed external-tool command line. Plain data: composing one has
/// no side effects and spawns nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path, resolved via the OS search path at spawn time.
    pub program: String,
    /// Arguments in the exact order handed to the process.
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How a single engine run failed.
#[derive(Debug)]
pub enum EngineError {
    /// The tool could not be started at all (missing executable, permission).
    Spawn(std::io::Error),
    /// The tool ran and exited with a non-zero status.
    Exit(i32),
    /// The tool was terminated by a signal; no exit code is available.
    Interrupted,
    /// Reading the tool's output streams, or reaping the child, failed.
    Io(std::io::Error),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Spawn(e) => write!(f, "failed to start conversion tool: {e}"),
            EngineError::Exit(code) => write!(f, "conversion tool exited with status {code}"),
            EngineError::Interrupted => write!(f, "conversion tool terminated by signal"),
            EngineError::Io(e) => write!(f, "i/o error while streaming tool output: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Spawn(e) | EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Runs one composed invocation as a child process and reports its outcome.
///
/// Implementations forward the child's stdout line-by-line to the log at info
/// level and its stderr at error level, in per-stream arrival order. The
/// returned future resolves exactly once, when the child has terminated (or
/// failed to start). There is no retry and no cancellation once spawned.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentEngine: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<(), EngineError>;
}
