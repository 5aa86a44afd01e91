pub(crate) mod decoders;
pub mod registry;

use std::fmt;

use serde::{Serialize, Serializer};

use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::handshake::{HandshakeKind, ProtocolVersion};

/// A 16-bit extension type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ExtensionType(pub u16);

impl ExtensionType {
    pub const SERVER_NAME: Self = Self(0);
    pub const SUPPORTED_GROUPS: Self = Self(10);
    pub const EC_POINT_FORMATS: Self = Self(11);
    pub const SIGNATURE_ALGORITHMS: Self = Self(13);
    pub const ALPN: Self = Self(16);
    pub const SIGNED_CERTIFICATE_TIMESTAMP: Self = Self(18);
    pub const PADDING: Self = Self(21);
    pub const SESSION_TICKET: Self = Self(35);
    pub const SUPPORTED_VERSIONS: Self = Self(43);
    pub const PSK_KEY_EXCHANGE_MODES: Self = Self(45);
    pub const KEY_SHARE: Self = Self(51);
    pub const RENEGOTIATION_INFO: Self = Self(65281);

    pub fn name(self) -> &'static str {
        registry::lookup(self.0).name
    }

    pub fn is_grease(self) -> bool {
        registry::lookup(self.0).is_grease
    }

    pub fn is_private(self) -> bool {
        registry::lookup(self.0).is_private
    }
}

impl fmt::Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// One key_share entry. `key_exchange` is empty for a HelloRetryRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyShareEntry {
    pub group: u16,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub key_exchange: Vec<u8>,
}

/// Decoded extension payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtensionData {
    ServerName {
        host_name: Option<String>,
    },
    SupportedGroups {
        groups: Vec<u16>,
    },
    EcPointFormats {
        formats: Vec<u8>,
    },
    SignatureAlgorithms {
        schemes: Vec<u16>,
    },
    Alpn {
        #[serde(serialize_with = "serialize_protocols")]
        protocols: Vec<Vec<u8>>,
    },
    SignedCertificateTimestamp,
    Padding {
        len: usize,
    },
    SessionTicket {
        #[serde(serialize_with = "hex::serde::serialize")]
        ticket: Vec<u8>,
    },
    SupportedVersions {
        versions: Vec<ProtocolVersion>,
    },
    PskKeyExchangeModes {
        modes: Vec<u8>,
    },
    KeyShare {
        entries: Vec<KeyShareEntry>,
    },
    RenegotiationInfo {
        #[serde(serialize_with = "hex::serde::serialize")]
        data: Vec<u8>,
    },
    /// Payload of a type with no registered decoder, kept verbatim.
    Unknown {
        #[serde(serialize_with = "hex::serde::serialize")]
        data: Vec<u8>,
    },
}

/// A decoded extension together with its registry facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    #[serde(rename = "type")]
    pub ext_type: ExtensionType,
    pub name: &'static str,
    #[serde(rename = "grease")]
    pub is_grease: bool,
    #[serde(rename = "private")]
    pub is_private: bool,
    pub data: ExtensionData,
}

impl Extension {
    pub fn new(ext_type: ExtensionType, data: ExtensionData) -> Self {
        let info = registry::lookup(ext_type.0);
        Self {
            ext_type,
            name: info.name,
            is_grease: info.is_grease,
            is_private: info.is_private,
            data,
        }
    }
}

/// Decodes one extension payload with the decoder registered for its type.
///
/// The decoder must consume `payload` exactly. Running out of bytes or
/// leaving any behind fails with [`DecodeError::ExtensionParseFailed`].
pub fn decode(
    ext_type: ExtensionType,
    kind: HandshakeKind,
    mut payload: Cursor<'_>,
) -> Result<ExtensionData, DecodeError> {
    let decoder = registry::decoder_for(ext_type.0);
    let data = decoder(&mut payload, kind).map_err(|e| DecodeError::ExtensionParseFailed {
        ext_type: ext_type.0,
        reason: e.to_string(),
    })?;
    if !payload.is_empty() {
        return Err(DecodeError::ExtensionParseFailed {
            ext_type: ext_type.0,
            reason: format!("{} trailing bytes", payload.remaining()),
        });
    }
    Ok(data)
}

#[allow(clippy::ptr_arg)]
fn serialize_protocols<S: Serializer>(protocols: &Vec<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(protocols.iter().map(|p| String::from_utf8_lossy(p)))
}
