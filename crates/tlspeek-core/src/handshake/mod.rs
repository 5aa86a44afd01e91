//! ClientHello / ServerHello decoding.
//!
//! Both messages share the same outer shape: type byte, 24-bit body length,
//! version, random, session id, then message-specific suite and compression
//! fields, then an optional extensions block. The shared parts live here.

pub mod cipher_suite;
pub mod client_hello;
pub mod server_hello;
pub mod types;

pub use cipher_suite::{cipher_suite_name, CipherSuite};
pub use client_hello::decode_client_hello;
pub use server_hello::decode_server_hello;
pub use types::{
    ClientHelloInfo, CompressionMethod, DerivedInfo, HandshakeKind, ProtocolVersion, ServerHelloInfo,
};

use crate::cursor::{Cursor, LengthPrefix};
use crate::error::DecodeError;
use crate::extension::{self, Extension, ExtensionData, ExtensionType};
use crate::fingerprint::compute_ja3;

/// A hello message type that can be decoded from a complete handshake
/// message.
pub trait Hello: Sized {
    const KIND: HandshakeKind;

    fn decode(message: &[u8]) -> Result<Self, DecodeError>;
}

impl Hello for ClientHelloInfo {
    const KIND: HandshakeKind = HandshakeKind::ClientHello;

    fn decode(message: &[u8]) -> Result<Self, DecodeError> {
        decode_client_hello(message)
    }
}

impl Hello for ServerHelloInfo {
    const KIND: HandshakeKind = HandshakeKind::ServerHello;

    fn decode(message: &[u8]) -> Result<Self, DecodeError> {
        decode_server_hello(message)
    }
}

/// Fields common to both hellos, plus a cursor over the rest of the body.
pub(crate) struct HelloHeader<'a> {
    pub body: Cursor<'a>,
    pub version: ProtocolVersion,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
}

pub(crate) fn read_header(message: &[u8], kind: HandshakeKind) -> Result<HelloHeader<'_>, DecodeError> {
    let mut msg = Cursor::new(message);

    let msg_type = msg.read_u8()?;
    if msg_type != kind.message_type() {
        return Err(DecodeError::UnexpectedMessageType {
            expected: kind.message_type(),
            actual: msg_type,
        });
    }

    let mut body = msg.read_length_prefixed(LengthPrefix::U24)?;
    if !msg.is_empty() {
        return Err(DecodeError::MalformedMessage("trailing bytes after handshake message"));
    }

    let version = ProtocolVersion(body.read_u16()?);
    let random = body.read_array::<32>()?;
    let session_id = body.read_length_prefixed(LengthPrefix::U8)?.read_rest().to_vec();

    Ok(HelloHeader {
        body,
        version,
        random,
        session_id,
    })
}

/// Reads the optional extensions block, which must end the body.
///
/// An already-empty body means the message carries no extensions.
pub(crate) fn read_extensions(body: &mut Cursor<'_>, kind: HandshakeKind) -> Result<Vec<Extension>, DecodeError> {
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut block = body.read_length_prefixed(LengthPrefix::U16)?;
    let mut extensions = Vec::new();
    while !block.is_empty() {
        let ext_type = ExtensionType(block.read_u16()?);
        let payload = block.read_length_prefixed(LengthPrefix::U16)?;
        let data = extension::decode(ext_type, kind, payload)?;
        extensions.push(Extension::new(ext_type, data));
    }

    if !body.is_empty() {
        return Err(DecodeError::MalformedMessage("trailing bytes after extensions block"));
    }
    Ok(extensions)
}

/// Pulls server name, ALPN and SCT facts out of the extensions and attaches
/// the JA3 fingerprint. Later duplicates of an extension overwrite earlier ones.
pub(crate) fn derive_info(
    version: ProtocolVersion,
    cipher_suites: &[CipherSuite],
    extensions: &[Extension],
) -> DerivedInfo {
    let mut info = DerivedInfo::default();
    for ext in extensions {
        match &ext.data {
            ExtensionData::ServerName { host_name } => info.server_name = host_name.clone(),
            ExtensionData::Alpn { protocols } => {
                info.protocols = protocols
                    .iter()
                    .map(|p| String::from_utf8_lossy(p).into_owned())
                    .collect();
            }
            ExtensionData::SignedCertificateTimestamp => info.scts = true,
            _ => {}
        }
    }

    let ja3 = compute_ja3(version, cipher_suites, extensions);
    info.ja3_string = ja3.raw_string;
    info.ja3_fingerprint = ja3.hash;
    info
}
