use std::io;

/// Every way reading or decoding a handshake message can fail.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated: field needs {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("unexpected handshake message type: want {expected}, got {actual}")]
    UnexpectedMessageType { expected: u8, actual: u8 },
    #[error("unexpected record content type {0} while assembling a handshake message")]
    UnexpectedContentType(u8),
    #[error("extension {ext_type} parse failed: {reason}")]
    ExtensionParseFailed { ext_type: u16, reason: String },
    #[error("malformed message: {0}")]
    MalformedMessage(&'static str),
    #[error("handshake message too large: {len} bytes (max {max})")]
    MessageTooLarge { len: usize, max: usize },
    #[error("record read failed: {0}")]
    RecordReadFailed(#[source] io::Error),
}

impl DecodeError {
    pub(crate) fn truncated(needed: usize, remaining: usize) -> Self {
        Self::Truncated { needed, remaining }
    }

    /// True for failures caused by the peer's bytes rather than the transport.
    pub fn is_parse_error(&self) -> bool {
        !matches!(self, Self::RecordReadFailed(_))
    }
}
