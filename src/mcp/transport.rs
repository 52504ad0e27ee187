//! Line-delimited JSON transport.
//!
//! This module implements the stdio transport:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not protocol messages)
//!
//! Reader and writer are separate halves so that requests can be read
//! while earlier responses are still being produced. Both are generic over
//! Tokio's async I/O traits; the server uses stdin/stdout and tests use
//! in-memory buffers.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::mcp::protocol::Response;

/// One newline-terminated unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A UTF-8 line with its terminator removed.
    Text(String),
    /// A line whose bytes are not valid UTF-8.
    NotUtf8,
}

/// Reads newline-terminated messages.
pub struct LineReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Wraps an async reader.
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    /// Reads the next message line.
    ///
    /// Returns `None` if the input is closed (EOF). A line that is not
    /// UTF-8 is consumed and reported as [`Frame::NotUtf8`] so the caller
    /// can answer it and keep reading.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn read_line(&mut self) -> io::Result<Option<Frame>> {
        let mut buf = Vec::new();
        let bytes_read = self.reader.read_until(b'\n', &mut buf).await?;

        if bytes_read == 0 {
            // EOF - input closed
            return Ok(None);
        }

        // Remove the trailing newline
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        Ok(Some(
            String::from_utf8(buf).map_or(Frame::NotUtf8, Frame::Text),
        ))
    }
}

/// Writes newline-terminated responses.
pub struct LineWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    /// Wraps an async writer.
    pub const fn new(inner: W) -> Self {
        Self { writer: inner }
    }

    /// Writes a response envelope.
    ///
    /// The response is serialised to JSON and terminated with a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_response(&mut self, response: &Response) -> io::Result<()> {
        let json = serde_json::to_string(response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.write_raw(&json).await
    }

    /// Writes a raw JSON string with newline termination.
    async fn write_raw(&mut self, json: &str) -> io::Result<()> {
        // Protocol: messages must not contain embedded newlines
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        Ok(())
    }
}

/// Reader and writer over the process's stdin and stdout.
#[must_use]
pub fn stdio() -> (LineReader<tokio::io::Stdin>, LineWriter<tokio::io::Stdout>) {
    (
        LineReader::new(tokio::io::stdin()),
        LineWriter::new(tokio::io::stdout()),
    )
}
