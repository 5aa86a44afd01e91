use crate::cursor::LengthPrefix;
use crate::error::DecodeError;
use crate::handshake::{
    derive_info, read_extensions, read_header, CipherSuite, ClientHelloInfo, CompressionMethod, HandshakeKind,
    HelloHeader,
};

/// Decode a complete ClientHello handshake message.
///
/// The input starts at the handshake type byte (`0x01`); record-layer
/// framing must already be stripped, see [`crate::record`]. The whole input
/// must be consumed: trailing bytes after the declared body, or after the
/// extensions block, reject the message.
pub fn decode_client_hello(message: &[u8]) -> Result<ClientHelloInfo, DecodeError> {
    let HelloHeader {
        mut body,
        version,
        random,
        session_id,
    } = read_header(message, HandshakeKind::ClientHello)?;

    let mut suites = body.read_length_prefixed(LengthPrefix::U16)?;
    if suites.remaining() % 2 != 0 {
        return Err(DecodeError::MalformedMessage("odd-length cipher suite list"));
    }
    let mut cipher_suites = Vec::with_capacity(suites.remaining() / 2);
    while !suites.is_empty() {
        cipher_suites.push(CipherSuite::new(suites.read_u16()?));
    }

    let compression_methods = body
        .read_length_prefixed(LengthPrefix::U8)?
        .read_rest()
        .iter()
        .map(|m| CompressionMethod(*m))
        .collect();

    let extensions = read_extensions(&mut body, HandshakeKind::ClientHello)?;
    let info = derive_info(version, &cipher_suites, &extensions);

    Ok(ClientHelloInfo {
        raw: message.to_vec(),
        version,
        random,
        session_id,
        cipher_suites,
        compression_methods,
        extensions,
        info,
    })
}
