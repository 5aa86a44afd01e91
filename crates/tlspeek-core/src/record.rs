//! TLS record-layer reassembly of a single handshake message.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::error::DecodeError;

pub const CONTENT_TYPE_HANDSHAKE: u8 = 22;
pub const RECORD_HEADER_LEN: usize = 5;
/// Largest plaintext fragment a record may carry (2^14).
pub const MAX_RECORD_LEN: usize = 1 << 14;
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 64 * 1024;

const HANDSHAKE_HEADER_LEN: usize = 4;

/// Reads records off a stream until they hold one complete handshake message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordReader {
    max_message_len: usize,
}

impl Default for RecordReader {
    fn default() -> Self {
        Self {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl RecordReader {
    /// `max_message_len` bounds the handshake message, header included.
    pub fn new(max_message_len: usize) -> Self {
        Self { max_message_len }
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// Read the first handshake message (`type(1) || length(3) || body`)
    /// from `stream`, stripping record framing.
    ///
    /// Reads exactly the records needed and nothing more. Bytes in the last
    /// record beyond the end of the message are consumed from the stream but
    /// not returned.
    pub async fn read_message<R>(&self, stream: &mut R) -> Result<Vec<u8>, DecodeError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut message = Vec::new();
        let mut records = 0usize;

        loop {
            let mut header = [0u8; RECORD_HEADER_LEN];
            read_full(stream, &mut header).await?;

            let content_type = header[0];
            if content_type != CONTENT_TYPE_HANDSHAKE {
                return Err(DecodeError::UnexpectedContentType(content_type));
            }

            let record_len = u16::from_be_bytes([header[3], header[4]]) as usize;
            if record_len > MAX_RECORD_LEN {
                return Err(DecodeError::MalformedMessage("record length exceeds 2^14"));
            }

            let start = message.len();
            message.resize(start + record_len, 0);
            read_full(stream, &mut message[start..]).await?;
            records += 1;

            if message.len() < HANDSHAKE_HEADER_LEN {
                continue;
            }

            let body_len = u32::from_be_bytes([0, message[1], message[2], message[3]]) as usize;
            let total = HANDSHAKE_HEADER_LEN + body_len;
            if total > self.max_message_len {
                return Err(DecodeError::MessageTooLarge {
                    len: total,
                    max: self.max_message_len,
                });
            }

            if message.len() >= total {
                message.truncate(total);
                debug!(
                    "Reassembled handshake message: {} bytes from {} record(s)",
                    total, records
                );
                return Ok(message);
            }

            debug!("Buffering handshake message: {}/{} bytes", message.len(), total);
        }
    }
}

/// [`RecordReader::read_message`] with the default limits.
pub async fn read_message<R>(stream: &mut R) -> Result<Vec<u8>, DecodeError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    RecordReader::default().read_message(stream).await
}

async fn read_full<R>(stream: &mut R, buf: &mut [u8]) -> Result<(), DecodeError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]).await {
            Ok(0) => return Err(DecodeError::truncated(buf.len(), filled)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DecodeError::RecordReadFailed(e)),
        }
    }
    Ok(())
}
