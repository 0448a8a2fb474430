//! Length-prefixed frames over a byte stream.
//!
//! ```text
//! +-------------------+--------------------+
//! | length (4 bytes)  |   payload          |
//! | u32 little-endian |   (length bytes)   |
//! +-------------------+--------------------+
//! ```
//!
//! The length counts payload bytes only. Empty frames are legal.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Default payload ceiling: 64 KiB. An update record is a few hundred bytes.
pub const DEFAULT_MAX_PAYLOAD: u32 = 64 * 1024;

/// Size limits for the framing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    /// Largest payload accepted in either direction.
    pub max_payload_size: u32,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Framing failures.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Declared or actual payload exceeds the limit.
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge {
        /// Offending size.
        size: usize,
        /// Configured maximum.
        max: u32,
    },

    /// Peer closed the stream mid-frame or between frames.
    #[error("connection closed")]
    Closed,

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn closed_or_io(err: std::io::Error) -> FrameError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        FrameError::Closed
    } else {
        FrameError::Io(err)
    }
}

/// Reads one frame and returns its payload.
pub async fn read_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    limits: &FrameLimits,
) -> Result<Vec<u8>, FrameError> {
    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix).await.map_err(closed_or_io)?;

    let len = u32::from_le_bytes(prefix);
    if len > limits.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: len as usize,
            max: limits.max_payload_size,
        });
    }

    let mut payload = vec![0u8; len as usize];
    if len > 0 {
        reader.read_exact(&mut payload).await.map_err(closed_or_io)?;
    }
    Ok(payload)
}

/// Writes one frame and flushes.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    payload: &[u8],
    limits: &FrameLimits,
) -> Result<(), FrameError> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= limits.max_payload_size)
        .ok_or(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: limits.max_payload_size,
        })?;

    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}
