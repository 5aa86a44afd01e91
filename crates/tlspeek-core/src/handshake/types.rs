use std::fmt;

use serde::{Serialize, Serializer};

use crate::extension::Extension;
use crate::handshake::cipher_suite::CipherSuite;

/// Wire-format `(major, minor)` protocol version, e.g. `0x0303` for TLS 1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(pub u16);

impl ProtocolVersion {
    pub const SSL_3_0: Self = Self(0x0300);
    pub const TLS_1_0: Self = Self(0x0301);
    pub const TLS_1_1: Self = Self(0x0302);
    pub const TLS_1_2: Self = Self(0x0303);
    pub const TLS_1_3: Self = Self(0x0304);

    pub fn hi(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn lo(self) -> u8 {
        self.0 as u8
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            0x0200 => "SSL 2.0",
            0x0300 => "SSL 3.0",
            0x0301 => "TLS 1.0",
            0x0302 => "TLS 1.1",
            0x0303 => "TLS 1.2",
            0x0304 => "TLS 1.3",
            _ => "unknown",
        }
    }
}

impl From<u16> for ProtocolVersion {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Serialized as the `[high, low]` byte pair.
impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.hi(), self.lo()].serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CompressionMethod(pub u8);

impl CompressionMethod {
    pub const NULL: Self = Self(0);
}

/// Which hello message is being decoded. Some extensions have a different
/// wire shape in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeKind {
    ClientHello,
    ServerHello,
}

impl HandshakeKind {
    /// The handshake message type byte.
    pub fn message_type(self) -> u8 {
        match self {
            HandshakeKind::ClientHello => 1,
            HandshakeKind::ServerHello => 2,
        }
    }
}

/// Convenience facts pulled out of specific extensions during decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedInfo {
    /// Host name from `server_name`
    pub server_name: Option<String>,
    /// Whether `signed_certificate_timestamp` was present
    pub scts: bool,
    /// Offered (ClientHello) or selected (ServerHello) ALPN protocols
    pub protocols: Vec<String>,
    pub ja3_string: String,
    /// 32-character lowercase MD5 hex of `ja3_string`
    pub ja3_fingerprint: String,
}

/// A decoded ClientHello.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientHelloInfo {
    /// The complete handshake message as received, header included.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub raw: Vec<u8>,
    pub version: ProtocolVersion,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub random: [u8; 32],
    #[serde(serialize_with = "hex::serde::serialize")]
    pub session_id: Vec<u8>,
    /// Offered suites in wire order, GREASE included.
    pub cipher_suites: Vec<CipherSuite>,
    pub compression_methods: Vec<CompressionMethod>,
    /// Extensions in wire order; empty when the message has no extensions block.
    pub extensions: Vec<Extension>,
    pub info: DerivedInfo,
}

impl ClientHelloInfo {
    pub fn server_name(&self) -> Option<&str> {
        self.info.server_name.as_deref()
    }

    pub fn ja3_string(&self) -> &str {
        &self.info.ja3_string
    }

    pub fn ja3_fingerprint(&self) -> &str {
        &self.info.ja3_fingerprint
    }
}

/// A decoded ServerHello.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerHelloInfo {
    #[serde(serialize_with = "hex::serde::serialize")]
    pub raw: Vec<u8>,
    pub version: ProtocolVersion,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub random: [u8; 32],
    #[serde(serialize_with = "hex::serde::serialize")]
    pub session_id: Vec<u8>,
    pub cipher_suite: CipherSuite,
    pub compression_method: CompressionMethod,
    pub extensions: Vec<Extension>,
    pub info: DerivedInfo,
}

impl ServerHelloInfo {
    pub fn ja3_string(&self) -> &str {
        &self.info.ja3_string
    }

    pub fn ja3_fingerprint(&self) -> &str {
        &self.info.ja3_fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_bytes() {
        let v = ProtocolVersion::TLS_1_2;
        assert_eq!((v.hi(), v.lo()), (3, 3));
        assert_eq!(v.name(), "TLS 1.2");
        assert_eq!(v.to_string(), "0x0303");
    }

    #[test]
    fn version_serializes_as_byte_pair() {
        let json = serde_json::to_string(&ProtocolVersion::TLS_1_3).unwrap();
        assert_eq!(json, "[3,4]");
        let json = serde_json::to_string(&CompressionMethod::NULL).unwrap();
        assert_eq!(json, "0");
    }
}
