//! Non-consuming TLS hello inspection.
//!
//! Reads the first handshake message off a connection, decodes it into a
//! [`ClientHelloInfo`] or [`ServerHelloInfo`] with a JA3 fingerprint, and
//! hands the connection on with every byte intact.
//!
//! ```no_run
//! # async fn run() -> std::io::Result<()> {
//! use tlspeek_core::PeekListener;
//!
//! let listener = PeekListener::bind("0.0.0.0:8443").await?;
//! let (stream, peer) = listener.accept().await?;
//! if let Some(hello) = stream.hello() {
//!     println!("{} {:?} {}", peer, hello.server_name(), hello.ja3_fingerprint());
//! }
//! // `stream` still yields the ClientHello bytes; hand it to a TLS acceptor.
//! # Ok(())
//! # }
//! ```

pub mod cursor;
pub mod error;
pub mod extension;
pub mod fingerprint;
pub mod handshake;
pub mod peek;
pub mod record;

#[cfg(test)]
mod testutil;

pub use error::DecodeError;
pub use extension::{Extension, ExtensionData, ExtensionType};
pub use fingerprint::{compute_ja3, Ja3Result};
pub use handshake::{
    decode_client_hello, decode_server_hello, CipherSuite, ClientHelloInfo, CompressionMethod, DerivedInfo,
    HandshakeKind, Hello, ProtocolVersion, ServerHelloInfo,
};
pub use peek::{PeekListener, PeekedStream};
pub use record::{read_message, RecordReader};
