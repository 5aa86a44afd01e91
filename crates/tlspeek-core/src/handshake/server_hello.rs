use crate::error::DecodeError;
use crate::handshake::{
    derive_info, read_extensions, read_header, CipherSuite, CompressionMethod, HandshakeKind, HelloHeader,
    ServerHelloInfo,
};

/// Decode a complete ServerHello handshake message.
///
/// Same framing rules as [`crate::handshake::decode_client_hello`], with a
/// single selected cipher suite and compression method. The JA3 string is
/// built with the same five fields; its cipher field holds the one suite.
pub fn decode_server_hello(message: &[u8]) -> Result<ServerHelloInfo, DecodeError> {
    let HelloHeader {
        mut body,
        version,
        random,
        session_id,
    } = read_header(message, HandshakeKind::ServerHello)?;

    let cipher_suite = CipherSuite::new(body.read_u16()?);
    let compression_method = CompressionMethod(body.read_u8()?);

    let extensions = read_extensions(&mut body, HandshakeKind::ServerHello)?;
    let info = derive_info(version, std::slice::from_ref(&cipher_suite), &extensions);

    Ok(ServerHelloInfo {
        raw: message.to_vec(),
        version,
        random,
        session_id,
        cipher_suite,
        compression_method,
        extensions,
        info,
    })
}
