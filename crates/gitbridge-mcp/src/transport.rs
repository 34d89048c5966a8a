//! Stdio transport.
//!
//! Newline-delimited JSON-RPC over stdin/stdout for clients that spawn the
//! gateway as a subprocess. Every line goes through the same dispatcher as
//! `POST /mcp`.

use std::io::{self, BufRead, Write};

use crate::dispatcher::Dispatcher;
use crate::protocol::{decode_request_str, JsonRpcResponse, RequestId};

/// Transport for reading/writing JSON-RPC messages.
pub struct StdioTransport {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
}

impl StdioTransport {
    /// Create a transport using stdin/stdout.
    pub fn stdio() -> Self {
        Self {
            reader: Box::new(io::BufReader::new(io::stdin())),
            writer: Box::new(io::stdout()),
        }
    }

    /// Create a transport with custom reader/writer.
    pub fn new(reader: Box<dyn BufRead + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self { reader, writer }
    }

    /// Read the next non-blank line, `None` on EOF.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            let line = line.trim();
            if !line.is_empty() {
                tracing::debug!("Received: {}", line);
                return Ok(Some(line.to_string()));
            }
        }
    }

    /// Write a JSON-RPC response to the transport.
    pub fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Serialization error: {}", e))
        })?;

        tracing::debug!("Sending: {}", json);

        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }

    /// Serve requests until EOF.
    pub async fn run(&mut self, dispatcher: &Dispatcher) -> io::Result<()> {
        tracing::info!("Serving MCP over stdio");

        while let Some(line) = self.read_line()? {
            if let Some(response) = handle_line(dispatcher, &line).await {
                self.write_response(&response)?;
            }
        }

        tracing::info!("EOF received, shutting down");
        Ok(())
    }
}

/// Dispatch one line. Notifications sent without an id get no reply.
async fn handle_line(dispatcher: &Dispatcher, line: &str) -> Option<JsonRpcResponse> {
    let decoded = decode_request_str(line);
    if let Err(rejection) = &decoded {
        tracing::warn!("Failed to decode message: {}", rejection.error);
    }

    let is_notification = matches!(
        &decoded,
        Ok(req) if req.id == RequestId::Null && req.method.starts_with("notifications/")
    );

    let response = dispatcher.dispatch_decoded(decoded).await;
    (!is_notification).then_some(response)
}
