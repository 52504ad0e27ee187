//! stdio server loop.
//!
//! Reads request lines, hands each one to the [`Dispatcher`] on Tokio's
//! blocking pool and writes responses as they complete. Tool handlers may
//! block, so requests run side by side; responses can leave out of order
//! and are matched by their correlation id.
//!
//! A line that is not UTF-8 gets a parse error like any other unreadable
//! message. The loop ends on EOF, on a read failure, or on SIGINT/SIGTERM
//! (Ctrl+C on Windows). In the first two cases every request already read
//! is answered before the loop returns.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::protocol::{JsonRpcError, Response};
use crate::mcp::transport::{self, Frame, LineReader, LineWriter};

/// Serves a [`Dispatcher`] over line-delimited JSON.
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    /// Creates a server around `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// The shared dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Runs the server on stdin/stdout with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&self) -> io::Result<()> {
        let (reader, writer) = transport::stdio();
        self.run_with_shutdown(reader, writer).await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(
        &self,
        reader: LineReader<tokio::io::Stdin>,
        writer: LineWriter<tokio::io::Stdout>,
    ) -> io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(io::Error::other)?;

        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
                Ok(())
            }

            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
                Ok(())
            }

            result = self.serve_lines(reader, writer) => result,
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(
        &self,
        reader: LineReader<tokio::io::Stdin>,
        writer: LineWriter<tokio::io::Stdout>,
    ) -> io::Result<()> {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                Ok(())
            }

            result = self.serve_lines(reader, writer) => result,
        }
    }

    /// Serves requests from `input` until EOF, writing responses to `output`.
    ///
    /// Returns once every in-flight request has been answered.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub async fn serve<R, W>(&self, input: R, output: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.serve_lines(LineReader::new(input), LineWriter::new(output))
            .await
    }

    async fn serve_lines<R, W>(
        &self,
        mut reader: LineReader<R>,
        mut writer: LineWriter<W>,
    ) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Response>();

        let read_requests = async move {
            let result = loop {
                if tx.is_closed() {
                    break Ok(());
                }

                let line = match reader.read_line().await {
                    Ok(Some(Frame::Text(line))) => line,
                    Ok(Some(Frame::NotUtf8)) => {
                        tracing::warn!("Received a line that is not valid UTF-8");
                        let _ = tx.send(JsonRpcError::parse_error().into());
                        continue;
                    }
                    Ok(None) => {
                        tracing::info!("Input closed, finishing in-flight requests");
                        break Ok(());
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read input, finishing in-flight requests");
                        break Err(e);
                    }
                };

                if line.trim().is_empty() {
                    continue;
                }

                let dispatcher = Arc::clone(&self.dispatcher);
                let tx = tx.clone();
                tokio::task::spawn_blocking(move || {
                    let response = dispatcher.handle_line(&line);
                    if tx.send(response).is_err() {
                        tracing::warn!("Response dropped: writer has shut down");
                    }
                });
            };

            // Dropping the last sender lets the writer drain and stop.
            drop(tx);
            result
        };

        let write_responses = async move {
            while let Some(response) = rx.recv().await {
                writer.write_response(&response).await?;
            }
            Ok::<(), io::Error>(())
        };

        // The writer always finishes draining before a read error surfaces.
        let (read_result, write_result) = tokio::join!(read_requests, write_responses);
        read_result.and(write_result)
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use serde_json::Value;
    use tokio::io::ReadBuf;

    use super::*;
    use crate::mcp::dispatcher::ServerInfo;
    use crate::registry::{Prompt, Registry};

    fn server() -> McpServer {
        let mut registry = Registry::new();
        registry
            .register_prompt(Prompt::new("a", "A", "first", "template a"))
            .unwrap();
        McpServer::new(Dispatcher::new(ServerInfo::default(), registry))
    }

    #[tokio::test]
    async fn answers_every_request_line() {
        let input: &[u8] = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"prompts.list"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"prompts.get","params":{"id":"a"}}"#,
            "\n",
            "garbage\n",
        )
        .as_bytes();
        let mut output = Vec::new();

        server().serve(input, &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);

        let by_id = |id: Value| responses.iter().find(|r| r["id"] == id).unwrap();
        assert_eq!(by_id(Value::from(1))["result"][0]["id"], "a");
        assert_eq!(by_id(Value::from(2))["result"]["prompt"], "template a");
        assert_eq!(by_id(Value::Null)["error"]["code"], -32700);
    }

    /// Yields `data`, then fails every read.
    struct FailingInput {
        data: &'static [u8],
    }

    impl AsyncRead for FailingInput {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.data.is_empty() {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "input lost",
                )));
            }
            let n = self.data.len().min(buf.remaining());
            buf.put_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn read_failure_still_answers_earlier_requests() {
        let input = FailingInput {
            data: concat!(
                r#"{"jsonrpc":"2.0","id":7,"method":"prompts.get","params":{"id":"a"}}"#,
                "\n",
            )
            .as_bytes(),
        };
        let mut output = Vec::new();

        let err = server().serve(input, &mut output).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let response: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(response["id"], 7);
        assert_eq!(response["result"]["prompt"], "template a");
    }

    #[tokio::test]
    async fn empty_input_finishes_cleanly() {
        let input: &[u8] = b"";
        let mut output = Vec::new();
        server().serve(input, &mut output).await.unwrap();
        assert!(output.is_empty());
    }
}
