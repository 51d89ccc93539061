//! Token masking for log output.
//!
//! Every formatted log line passes through [`RedactingWriter`], which masks
//! `Authorization` credentials and raw Discord bot tokens before the line
//! reaches its destination.

use std::io::{self, Write};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing_subscriber::fmt::MakeWriter;

pub const REDACTED: &str = "[REDACTED]";

/// JSON keys whose string values are always masked.
const SECRET_KEY_NAMES: &[&str] = &["token", "secret", "password", "authorization"];

static RE_AUTH_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Bearer|Bot) [A-Za-z0-9._\-]+").expect("failed to compile regex: auth_scheme")
});

// Discord bot tokens: base64 user id, timestamp, HMAC
static RE_DISCORD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[MNO][A-Za-z0-9_\-]{23,27}\.[A-Za-z0-9_\-]{6}\.[A-Za-z0-9_\-]{27,40}\b")
        .expect("failed to compile regex: discord_token")
});

/// Mask credentials inside free text.
pub fn redact_string(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    let masked = RE_AUTH_SCHEME.replace_all(input, format!("$1 {REDACTED}").as_str());
    RE_DISCORD_TOKEN
        .replace_all(&masked, REDACTED)
        .into_owned()
}

/// Mask secret-named string fields anywhere in a JSON document.
pub fn redact_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                let lower = key.to_lowercase();
                if SECRET_KEY_NAMES.iter().any(|s| lower.contains(s)) && child.is_string() {
                    *child = Value::String(REDACTED.to_string());
                } else {
                    redact_json_value(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json_value),
        Value::String(s) => *s = redact_string(s),
        _ => {}
    }
}

const MAX_BUFFER_BYTES: usize = 8192;

/// Line-buffering writer that redacts each complete line.
pub struct RedactingWriter<W: Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_redacted(&mut self, line: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(line);
        self.inner.write_all(redact_string(&text).as_bytes())
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.buffer);
        self.write_redacted(&pending)
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.buffer.extend_from_slice(buf);

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_redacted(&line[..line.len() - 1])?;
            self.inner.write_all(b"\n")?;
        }
        if self.buffer.len() > MAX_BUFFER_BYTES {
            self.flush_buffer()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer()?;
        self.inner.flush()
    }
}

impl<W: Write> Drop for RedactingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush_buffer();
        let _ = self.inner.flush();
    }
}

/// Wraps any [`MakeWriter`] so its writers redact.
pub struct RedactingMakeWriter<M> {
    inner: M,
}

impl<M> RedactingMakeWriter<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new(self.inner.make_writer())
    }
}
