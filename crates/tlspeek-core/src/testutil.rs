//! Byte-level builders for hand-crafted hello messages and records.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

use crate::handshake::HandshakeKind;

pub(crate) struct HelloBuilder {
    kind: HandshakeKind,
    version: u16,
    random: [u8; 32],
    session_id: Vec<u8>,
    cipher_suites: Vec<u16>,
    compression_methods: Vec<u8>,
    extensions: Vec<(u16, Vec<u8>)>,
    extensions_block: bool,
}

impl HelloBuilder {
    pub fn client() -> Self {
        Self::new(HandshakeKind::ClientHello)
    }

    pub fn server() -> Self {
        Self::new(HandshakeKind::ServerHello)
    }

    fn new(kind: HandshakeKind) -> Self {
        Self {
            kind,
            version: 0x0303,
            random: [0x42; 32],
            session_id: Vec::new(),
            cipher_suites: vec![0xC02F],
            compression_methods: vec![0x00],
            extensions: Vec::new(),
            extensions_block: false,
        }
    }

    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    pub fn random(mut self, random: [u8; 32]) -> Self {
        self.random = random;
        self
    }

    pub fn session_id(mut self, id: &[u8]) -> Self {
        self.session_id = id.to_vec();
        self
    }

    pub fn cipher_suites(mut self, suites: &[u16]) -> Self {
        self.cipher_suites = suites.to_vec();
        self
    }

    pub fn compression_methods(mut self, methods: &[u8]) -> Self {
        self.compression_methods = methods.to_vec();
        self
    }

    pub fn extension(mut self, ext_type: u16, payload: Vec<u8>) -> Self {
        self.extensions.push((ext_type, payload));
        self.extensions_block = true;
        self
    }

    pub fn empty_extensions_block(mut self) -> Self {
        self.extensions_block = true;
        self
    }

    pub fn extensions(&self) -> &[(u16, Vec<u8>)] {
        &self.extensions
    }

    /// The message body, without the 4-byte handshake header.
    pub fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        push_u16(&mut body, self.version);
        body.extend_from_slice(&self.random);
        body.push(self.session_id.len() as u8);
        body.extend_from_slice(&self.session_id);

        match self.kind {
            HandshakeKind::ClientHello => {
                push_u16(&mut body, (self.cipher_suites.len() * 2) as u16);
                for suite in &self.cipher_suites {
                    push_u16(&mut body, *suite);
                }
                body.push(self.compression_methods.len() as u8);
                body.extend_from_slice(&self.compression_methods);
            }
            HandshakeKind::ServerHello => {
                push_u16(&mut body, self.cipher_suites[0]);
                body.push(self.compression_methods[0]);
            }
        }

        if self.extensions_block {
            let mut block = Vec::new();
            for (ext_type, payload) in &self.extensions {
                push_u16(&mut block, *ext_type);
                push_u16(&mut block, payload.len() as u16);
                block.extend_from_slice(payload);
            }
            push_u16(&mut body, block.len() as u16);
            body.extend_from_slice(&block);
        }
        body
    }

    /// The complete handshake message.
    pub fn build(&self) -> Vec<u8> {
        handshake(self.kind.message_type(), &self.body())
    }
}

pub(crate) fn handshake(msg_type: u8, body: &[u8]) -> Vec<u8> {
    let len = body.len() as u32;
    let mut out = vec![msg_type, (len >> 16) as u8, (len >> 8) as u8, len as u8];
    out.extend_from_slice(body);
    out
}

pub(crate) fn record(content_type: u8, fragment: &[u8]) -> Vec<u8> {
    let mut out = vec![content_type, 0x03, 0x01];
    push_u16(&mut out, fragment.len() as u16);
    out.extend_from_slice(fragment);
    out
}

/// Splits `message` into handshake records with the given fragment sizes;
/// whatever is left over goes into one final record.
pub(crate) fn records(message: &[u8], sizes: &[usize]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = message;
    for &size in sizes {
        let (head, tail) = rest.split_at(size.min(rest.len()));
        out.extend_from_slice(&record(0x16, head));
        rest = tail;
    }
    if !rest.is_empty() {
        out.extend_from_slice(&record(0x16, rest));
    }
    out
}

pub(crate) fn sni_payload(host: &str) -> Vec<u8> {
    let mut out = Vec::new();
    push_u16(&mut out, (host.len() + 3) as u16);
    out.push(0x00);
    push_u16(&mut out, host.len() as u16);
    out.extend_from_slice(host.as_bytes());
    out
}

pub(crate) fn alpn_payload(protocols: &[&str]) -> Vec<u8> {
    let mut list = Vec::new();
    for p in protocols {
        list.push(p.len() as u8);
        list.extend_from_slice(p.as_bytes());
    }
    let mut out = Vec::new();
    push_u16(&mut out, list.len() as u16);
    out.extend_from_slice(&list);
    out
}

pub(crate) fn groups_payload(groups: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    push_u16(&mut out, (groups.len() * 2) as u16);
    for g in groups {
        push_u16(&mut out, *g);
    }
    out
}

pub(crate) fn point_formats_payload(formats: &[u8]) -> Vec<u8> {
    let mut out = vec![formats.len() as u8];
    out.extend_from_slice(formats);
    out
}

fn push_u16(buf: &mut Vec<u8>, val: u16) {
    buf.extend_from_slice(&val.to_be_bytes());
}

/// Hands out at most one byte per read.
pub(crate) struct Trickle {
    data: Vec<u8>,
    pos: usize,
}

impl Trickle {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl AsyncRead for Trickle {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        if self.pos < self.data.len() && buf.remaining() > 0 {
            let byte = self.data[self.pos];
            buf.put_slice(&[byte]);
            self.pos += 1;
        }
        Poll::Ready(Ok(()))
    }
}

/// Fails every read.
pub(crate) struct Broken;

impl AsyncRead for Broken {
    fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")))
    }
}
