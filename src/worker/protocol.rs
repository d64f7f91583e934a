//! # Master ↔ worker control messages.
//!
//! One JSON object per line. The master writes [`Directive`]s to the
//! worker's stdin; the worker writes [`Signal`]s to its stdout. Worker logs
//! go to stderr so they never mix with the control stream.
//!
//! ```text
//! master ──stdin──►  {"type":"terminate"}
//! master ◄─stdout──  {"type":"online","pid":4242}
//!                    {"type":"listening"}
//!                    {"type":"exit","code":0}
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProtocolError;

/// Master → worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Directive {
    /// Run the backward phases and exit.
    Terminate,
}

/// Worker → master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// The process is up; units are about to be brought up.
    Online { pid: u32 },
    /// Every unit is started.
    Listening,
    /// Teardown finished (or bring-up failed); the process is about to exit.
    Exit { code: i32 },
}

/// Writes one message followed by a newline and flushes.
pub async fn write_message<W, M>(writer: &mut W, message: &M) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    M: Serialize,
{
    let mut line = serde_json::to_vec(message).map_err(|e| ProtocolError::Io(e.into()))?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the next message. Blank lines are skipped; `None` means end of stream.
pub async fn read_message<R, M>(reader: &mut R) -> Result<Option<M>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
    M: DeserializeOwned,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        return serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|source| ProtocolError::Malformed {
                line: trimmed.to_string(),
                source,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn wire_shape_is_tagged_json() {
        let online = serde_json::to_string(&Signal::Online { pid: 7 }).unwrap();
        assert_eq!(online, r#"{"type":"online","pid":7}"#);
        let terminate = serde_json::to_string(&Directive::Terminate).unwrap();
        assert_eq!(terminate, r#"{"type":"terminate"}"#);
    }

    #[tokio::test]
    async fn reads_lines_skipping_blanks_until_eof() {
        let input = b"{\"type\":\"listening\"}\n\n{\"type\":\"exit\",\"code\":3}\n".to_vec();
        let mut reader = BufReader::new(&input[..]);

        let first: Option<Signal> = read_message(&mut reader).await.unwrap();
        let second: Option<Signal> = read_message(&mut reader).await.unwrap();
        let end: Option<Signal> = read_message(&mut reader).await.unwrap();

        assert_eq!(first, Some(Signal::Listening));
        assert_eq!(second, Some(Signal::Exit { code: 3 }));
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn garbage_is_reported_with_the_line() {
        let mut reader = BufReader::new(&b"hello\n"[..]);
        let err = read_message::<_, Directive>(&mut reader).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed { ref line, .. } if line == "hello"));
    }
}
