//! Content-Length framed JSON-RPC message I/O over stdio, the same framing
//! shape as the pack's MCP stdio server, adapted from a single-reader loop
//! to one whose writer is shared across the worker pool (hence the mutex).

use std::io::{self, BufRead, Read, Write};
use std::sync::Mutex;

use serde_json::Value;

/// Reads one framed message body from `reader` and parses it as JSON.
/// Returns `Ok(None)` at clean EOF (stdin closed, e.g. the client process
/// exited without sending `exit`).
pub fn read_message(reader: &mut impl BufRead) -> io::Result<Option<Value>> {
    let mut content_length = None;
    loop {
        let mut header_line = String::new();
        let read = reader.read_line(&mut header_line)?;
        if read == 0 {
            return Ok(None);
        }
        let trimmed = header_line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("Content-Length:") {
            let length = value
                .trim()
                .parse::<usize>()
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, format!("invalid Content-Length: {err}")))?;
            content_length = Some(length);
        }
    }

    let Some(content_length) = content_length else {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "missing Content-Length header"));
    };

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;
    let value = serde_json::from_slice(&body).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, format!("parse error: {err}")))?;
    Ok(Some(value))
}

/// Serializes `payload` and writes it framed, behind a mutex so request
/// handlers on different worker threads can't interleave writes.
pub struct FramedWriter<W: Write> {
    inner: Mutex<W>,
}

impl<W: Write> FramedWriter<W> {
    pub fn new(writer: W) -> Self {
        FramedWriter { inner: Mutex::new(writer) }
    }

    pub fn write_message(&self, payload: &Value) -> io::Result<()> {
        let body = serde_json::to_vec(payload).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, format!("serialize error: {err}")))?;
        let mut writer = self.inner.lock().unwrap();
        write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
        writer.write_all(&body)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_framed_message() {
        let writer = FramedWriter::new(Vec::new());
        writer.write_message(&serde_json::json!({"jsonrpc": "2.0", "method": "ping"})).unwrap();
        let bytes = writer.inner.into_inner().unwrap();
        let mut cursor = Cursor::new(bytes);
        let read_back = read_message(&mut cursor).unwrap().unwrap();
        assert_eq!(read_back["method"], "ping");
    }

    #[test]
    fn clean_eof_returns_none() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(read_message(&mut cursor).unwrap().is_none());
    }
}
