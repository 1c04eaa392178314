//! Shell — the interactive read/execute/print loop.
//!
//! Generic over its input and output so the loop runs unchanged against
//! stdin/stdout or in-memory buffers.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::warn;

use crate::router::{Outcome, Router};

pub const PROMPT: &str = "Cli> ";

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to render reply: {0}")]
    Render(#[from] serde_json::Error),
}

pub struct Shell<R, W> {
    input: Lines<R>,
    output: W,
    router: Router,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(router: Router, input: R, output: W) -> Self {
        Self {
            input: input.lines(),
            output,
            router,
        }
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Execute one line and print its result.
    ///
    /// Returns `false` once the line asked the session to end.
    ///
    /// # Errors
    ///
    /// Only output failures are returned; command failures are printed.
    pub async fn run_line(&mut self, line: &str) -> Result<bool, ShellError> {
        match self.router.execute(line).await {
            Ok(Outcome::Reply(Value::String(text))) => self.print(&text).await?,
            Ok(Outcome::Reply(value)) => {
                let rendered = serde_json::to_string_pretty(&value)?;
                self.print(&rendered).await?;
            }
            Ok(Outcome::Done) => {}
            Ok(Outcome::Exit) => return Ok(false),
            Err(e) => {
                warn!(error = %e, code = e.error_code(), %line, "command failed");
                self.print(&format!("error: {e}")).await?;
            }
        }
        Ok(true)
    }

    /// Prompt, read and execute lines until `.exit` or end of input.
    ///
    /// End of input disconnects every connection, same as `.exit`.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Io`] if the input or output stream fails.
    pub async fn run(&mut self) -> Result<(), ShellError> {
        loop {
            self.output.write_all(PROMPT.as_bytes()).await?;
            self.output.flush().await?;

            let Some(line) = self.input.next_line().await? else {
                self.router.shutdown();
                self.output.write_all(b"\n").await?;
                break;
            };
            // the raw tail is sent as typed, trailing spaces included
            if line.trim().is_empty() {
                continue;
            }
            if !self.run_line(&line).await? {
                break;
            }
        }
        self.output.flush().await?;
        Ok(())
    }

    async fn print(&mut self, text: &str) -> Result<(), ShellError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;
