//! Minimal FLV container reader for liveness probing.
//!
//! The probe only needs two things from the decode tool's output: proof
//! that a valid container header arrived (the stream carries media) and a
//! way to keep consuming tags so the pipe never fills up. Tag payloads are
//! read and discarded; nothing is demuxed.

use bytes::Buf;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Errors from the container reader.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FlvError {
    /// The stream does not start with the `FLV` signature.
    #[error("bad container signature: {found:02x?}")]
    BadSignature {
        /// The three bytes found instead of `FLV`.
        found: [u8; 3],
    },

    /// Underlying read failure, including unexpected end of stream.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl FlvError {
    /// True if the error is a plain end-of-stream.
    pub fn is_eof(&self) -> bool {
        matches!(self, FlvError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

/// Decoded FLV file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlvHeader {
    /// Container version (1 for every stream in the wild).
    pub version: u8,
    /// Header flag: audio tags present.
    pub has_audio: bool,
    /// Header flag: video tags present.
    pub has_video: bool,
}

/// Decoded FLV tag header; the payload is consumed and discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlvTag {
    /// Tag type (8 = audio, 9 = video, 18 = script data).
    pub tag_type: u8,
    /// Payload size in bytes.
    pub data_size: u32,
    /// Tag timestamp in milliseconds.
    pub timestamp_ms: u32,
}

/// Reads and validates the 9-byte container header, positioning the reader
/// at the first previous-tag-size field.
pub async fn read_header<R: AsyncRead + Unpin>(reader: &mut R) -> Result<FlvHeader, FlvError> {
    let mut raw = [0u8; 9];
    reader.read_exact(&mut raw).await?;

    let mut buf = &raw[..];
    let mut signature = [0u8; 3];
    buf.copy_to_slice(&mut signature);
    if &signature != b"FLV" {
        return Err(FlvError::BadSignature { found: signature });
    }

    let version = buf.get_u8();
    let flags = buf.get_u8();
    let data_offset = buf.get_u32();

    // Versions may extend the header; skip whatever lies beyond 9 bytes.
    let mut remaining = u64::from(data_offset.saturating_sub(9));
    discard(reader, &mut remaining).await?;

    Ok(FlvHeader {
        version,
        has_audio: flags & 0x04 != 0,
        has_video: flags & 0x01 != 0,
    })
}

/// Reads one previous-tag-size field plus the following tag, consuming and
/// discarding the payload.
pub async fn read_tag<R: AsyncRead + Unpin>(reader: &mut R) -> Result<FlvTag, FlvError> {
    // 4-byte previous tag size, then the 11-byte tag header.
    let mut raw = [0u8; 15];
    reader.read_exact(&mut raw).await?;

    let mut buf = &raw[4..];
    let tag_type = buf.get_u8();
    let data_size = get_u24(&mut buf);
    let timestamp_low = get_u24(&mut buf);
    let timestamp_ext = buf.get_u8();
    let _stream_id = get_u24(&mut buf);

    let mut remaining = u64::from(data_size);
    discard(reader, &mut remaining).await?;

    Ok(FlvTag {
        tag_type,
        data_size,
        timestamp_ms: (u32::from(timestamp_ext) << 24) | timestamp_low,
    })
}

fn get_u24(buf: &mut &[u8]) -> u32 {
    (u32::from(buf.get_u8()) << 16) | (u32::from(buf.get_u8()) << 8) | u32::from(buf.get_u8())
}

async fn discard<R: AsyncRead + Unpin>(reader: &mut R, remaining: &mut u64) -> Result<(), FlvError> {
    let mut scratch = [0u8; 4096];
    while *remaining > 0 {
        let want = (*remaining).min(scratch.len() as u64) as usize;
        reader.read_exact(&mut scratch[..want]).await?;
        *remaining -= want as u64;
    }
    Ok(())
}
