//! One-line handshake framing
//!
//! After a worker binds its listener it writes exactly one newline-delimited
//! JSON envelope to stdout and nothing else, ever, on that stream. Logging
//! goes to stderr, so verbosity can never corrupt the protocol. The
//! supervisor reads exactly one line to complete the handshake.

use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::IpcError;
use crate::protocol::{Envelope, WorkerSnapshot, PROTOCOL_VERSION};

/// Emit the handshake line (worker side)
pub async fn write_snapshot_line<W>(writer: &mut W, snapshot: &WorkerSnapshot) -> Result<(), IpcError>
where
    W: AsyncWrite + Unpin,
{
    let envelope = Envelope::new(snapshot.clone());
    let json =
        serde_json::to_string(&envelope).map_err(|e| IpcError::Serialization(e.to_string()))?;

    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Read exactly one handshake line (supervisor side).
///
/// Fails with `ConnectionClosed` when the stream ends first (the worker
/// exited before emitting its snapshot), `Malformed` on unparsable text,
/// and `HandshakeTimeout` when no line arrives within `timeout`.
pub async fn read_snapshot_line<R>(
    reader: &mut R,
    timeout: Duration,
) -> Result<WorkerSnapshot, IpcError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = tokio::time::timeout(timeout, reader.read_line(&mut line))
        .await
        .map_err(|_| IpcError::HandshakeTimeout(timeout))?;

    if read? == 0 {
        return Err(IpcError::ConnectionClosed);
    }

    let envelope: Envelope<WorkerSnapshot> = serde_json::from_str(line.trim_end())
        .map_err(|e| IpcError::Malformed(e.to_string()))?;

    if !envelope.is_compatible() {
        return Err(IpcError::VersionMismatch {
            expected: PROTOCOL_VERSION,
            actual: envelope.protocol_version,
        });
    }

    Ok(envelope.message)
}
