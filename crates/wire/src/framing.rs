// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed framing for the stdio JSON-RPC child transport.
//!
//! Wire format: 4-byte big-endian length prefix + JSON payload. Used by
//! `conduit-adapters`' `McpClient` stdio binding (spec §4.4) to delimit
//! JSON-RPC messages on a child's stdin/stdout pipe, where there is no
//! other message boundary to rely on.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum single-message size accepted on read, guarding against a
/// misbehaving child sending a bogus length prefix that would otherwise
/// try to allocate gigabytes.
pub const MAX_MESSAGE_BYTES: u32 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("message of {0} bytes exceeds the {MAX_MESSAGE_BYTES} byte limit")]
    TooLarge(u32),
    #[error("json encode/decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a value to raw JSON bytes (no length prefix) — the payload
/// half of the frame; pair with `write_message` to add the prefix.
pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, FramingError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize a value from raw JSON bytes (already stripped of any
/// length prefix by `read_message`).
pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, FramingError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write a 4-byte big-endian length prefix followed by `payload`.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), FramingError> {
    let len = u32::try_from(payload.len()).map_err(|_| FramingError::TooLarge(u32::MAX))?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame, returning its raw payload bytes.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, FramingError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_BYTES {
        return Err(FramingError::TooLarge(len));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::{Id, Request};

    #[tokio::test]
    async fn write_then_read_round_trips_a_frame() {
        let request = Request::new(Id::Number(1), "tools/list", None);
        let payload = encode(&request).expect("encode");

        let mut buffer = Vec::new();
        write_message(&mut buffer, &payload).await.expect("write");
        assert_eq!(buffer.len(), 4 + payload.len());

        let mut cursor = std::io::Cursor::new(buffer);
        let read_back = read_message(&mut cursor).await.expect("read");
        let decoded: Request = decode(&read_back).expect("decode");
        assert_eq!(decoded.method, "tools/list");
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected_before_allocating() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(MAX_MESSAGE_BYTES + 1).to_be_bytes());
        let mut cursor = std::io::Cursor::new(buffer);
        let err = read_message(&mut cursor).await.unwrap_err();
        assert!(matches!(err, FramingError::TooLarge(_)));
    }

    #[tokio::test]
    async fn truncated_stream_is_an_io_error() {
        let mut cursor = std::io::Cursor::new(vec![0u8, 0, 0]);
        let err = read_message(&mut cursor).await.unwrap_err();
        assert!(matches!(err, FramingError::Io(_)));
    }
}
