//! Peek at the first handshake message of a connection without consuming it.
//!
//! [`PeekedStream`] reads the hello through a tee that keeps a copy of every
//! byte taken off the wire. Reads then serve that copy first and continue on
//! the live stream once it is exhausted, so whatever reads the stream next
//! (usually a TLS acceptor) sees the exact bytes the peer sent.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::debug;

use crate::error::DecodeError;
use crate::handshake::{ClientHelloInfo, Hello};
use crate::record::RecordReader;

/// Reader that copies everything it hands out into `copy`.
struct Tee<'a, S> {
    inner: &'a mut S,
    copy: &'a mut Vec<u8>,
}

impl<S: AsyncRead + Unpin> AsyncRead for Tee<'_, S> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        ready!(Pin::new(&mut *self.inner).poll_read(cx, buf))?;
        let fresh = &buf.filled()[before..];
        self.copy.extend_from_slice(fresh);
        Poll::Ready(Ok(()))
    }
}

/// A stream whose first handshake message has been decoded into `H`.
///
/// Reading yields the original byte sequence: peeked bytes first, then the
/// inner stream. Writes go straight to the inner stream.
#[derive(Debug)]
pub struct PeekedStream<S, H = ClientHelloInfo> {
    inner: S,
    replay: Vec<u8>,
    replay_pos: usize,
    hello: Result<H, DecodeError>,
}

impl<S, H> PeekedStream<S, H>
where
    S: AsyncRead + Unpin,
    H: Hello,
{
    /// Peek with the default [`RecordReader`] limits.
    pub async fn peek(inner: S) -> Self {
        Self::peek_with(inner, &RecordReader::default()).await
    }

    /// Read and decode the first handshake message of `inner`.
    ///
    /// Never fails: a read or decode error is kept and available from
    /// [`peek_error`](Self::peek_error), and every byte read up to that point
    /// is still replayed.
    pub async fn peek_with(mut inner: S, reader: &RecordReader) -> Self {
        let mut replay = Vec::new();
        let hello = {
            let mut tee = Tee {
                inner: &mut inner,
                copy: &mut replay,
            };
            reader
                .read_message(&mut tee)
                .await
                .and_then(|message| H::decode(&message))
        };

        match &hello {
            Ok(_) => debug!("Peeked {:?}: {} bytes buffered", H::KIND, replay.len()),
            Err(e) => debug!("Peek of {:?} failed after {} bytes: {}", H::KIND, replay.len(), e),
        }

        Self {
            inner,
            replay,
            replay_pos: 0,
            hello,
        }
    }
}

impl<S, H> PeekedStream<S, H> {
    /// The decoded hello, if the peek succeeded.
    pub fn hello(&self) -> Option<&H> {
        self.hello.as_ref().ok()
    }

    pub fn peek_error(&self) -> Option<&DecodeError> {
        self.hello.as_ref().err()
    }

    /// Peeked bytes not yet handed out by a read.
    pub fn buffered(&self) -> &[u8] {
        &self.replay[self.replay_pos..]
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns the inner stream and the peeked bytes not yet read. The caller
    /// must put those bytes in front of the stream to keep it intact.
    pub fn into_inner(self) -> (S, Vec<u8>) {
        let mut rest = self.replay;
        rest.drain(..self.replay_pos);
        (self.inner, rest)
    }
}

impl<S, H> AsyncRead for PeekedStream<S, H>
where
    S: AsyncRead + Unpin,
    H: Unpin,
{
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if this.replay_pos < this.replay.len() {
            let n = buf.remaining().min(this.replay.len() - this.replay_pos);
            buf.put_slice(&this.replay[this.replay_pos..this.replay_pos + n]);
            this.replay_pos += n;
            if this.replay_pos == this.replay.len() {
                this.replay = Vec::new();
                this.replay_pos = 0;
            }
            return Poll::Ready(Ok(()));
        }

        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S, H> AsyncWrite for PeekedStream<S, H>
where
    S: AsyncWrite + Unpin,
    H: Unpin,
{
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }
}

/// A TCP listener that peeks the ClientHello of every accepted connection.
#[derive(Debug)]
pub struct PeekListener {
    inner: TcpListener,
    reader: RecordReader,
}

impl PeekListener {
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        Ok(Self::new(TcpListener::bind(addr).await?))
    }

    pub fn new(inner: TcpListener) -> Self {
        Self {
            inner,
            reader: RecordReader::default(),
        }
    }

    pub fn with_reader(mut self, reader: RecordReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept the next connection and peek its ClientHello.
    ///
    /// Only accept errors are returned. The peek waits until the peer has
    /// sent its hello (or failed to), so callers that must not stall on one
    /// slow peer should accept on the inner listener and call
    /// [`PeekedStream::peek_with`] from a spawned task instead.
    pub async fn accept(&self) -> io::Result<(PeekedStream<TcpStream>, SocketAddr)> {
        let (stream, addr) = self.inner.accept().await?;
        debug!("Accepted connection from {}", addr);
        let stream = PeekedStream::peek_with(stream, &self.reader).await;
        Ok((stream, addr))
    }

    pub fn into_inner(self) -> TcpListener {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::ServerHelloInfo;
    use crate::testutil::{self, HelloBuilder, Trickle};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn client_hello_wire(sizes: &[usize]) -> Vec<u8> {
        let message = HelloBuilder::client()
            .cipher_suites(&[0x1301, 0xC02F, 0x0A0A])
            .extension(0, testutil::sni_payload("example.com"))
            .extension(16, testutil::alpn_payload(&["h2", "http/1.1"]))
            .build();
        testutil::records(&message, sizes)
    }

    #[tokio::test]
    async fn replay_is_byte_identical_across_record_splits() {
        for sizes in [&[][..], &[5, 40][..], &[1, 1, 1, 1, 1][..], &[3, 7, 50][..]] {
            let mut wire = client_hello_wire(sizes);
            wire.extend_from_slice(&testutil::record(23, b"early data follows"));

            let mut stream: PeekedStream<_> = PeekedStream::peek(Trickle::new(wire.clone())).await;
            assert_eq!(stream.hello().unwrap().server_name(), Some("example.com"));

            let mut out = Vec::new();
            stream.read_to_end(&mut out).await.unwrap();
            assert_eq!(out, wire, "record sizes {:?}", sizes);
        }
    }

    #[tokio::test]
    async fn peek_consumes_only_the_hello_records() {
        let hello = client_hello_wire(&[10]);
        let tail = testutil::record(23, b"application data");
        let mut wire = hello.clone();
        wire.extend_from_slice(&tail);

        let stream: PeekedStream<&[u8]> = PeekedStream::peek(&wire[..]).await;
        assert!(stream.hello().is_some());
        assert_eq!(stream.buffered(), &hello[..]);

        let (inner, rest) = stream.into_inner();
        assert_eq!(inner, &tail[..]);
        assert_eq!(rest, hello);
    }

    #[tokio::test]
    async fn small_reads_drain_the_replay_buffer_in_order() {
        let wire = client_hello_wire(&[20]);
        let mut stream: PeekedStream<&[u8]> = PeekedStream::peek(&wire[..]).await;

        let mut out = Vec::new();
        let mut chunk = [0u8; 3];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(out, wire);
        assert!(stream.buffered().is_empty());
    }

    #[tokio::test]
    async fn into_inner_after_partial_read() {
        let wire = client_hello_wire(&[]);
        let mut stream: PeekedStream<&[u8]> = PeekedStream::peek(&wire[..]).await;
        let mut head = [0u8; 5];
        stream.read_exact(&mut head).await.unwrap();
        assert_eq!(head, wire[..5]);

        let (_, rest) = stream.into_inner();
        assert_eq!(rest, &wire[5..]);
    }

    #[tokio::test]
    async fn plaintext_http_is_passed_through() {
        let wire = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec();
        let mut stream: PeekedStream<_> = PeekedStream::peek(&wire[..]).await;

        assert!(stream.hello().is_none());
        assert!(matches!(stream.peek_error(), Some(DecodeError::UnexpectedContentType(b'G'))));

        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, wire);
    }

    #[tokio::test]
    async fn undecodable_hello_is_still_replayed() {
        let mut message = HelloBuilder::client().build();
        message[0] = 2;
        let wire = testutil::records(&message, &[9]);

        let mut stream: PeekedStream<_> = PeekedStream::peek(Trickle::new(wire.clone())).await;
        assert!(matches!(
            stream.peek_error(),
            Some(DecodeError::UnexpectedMessageType { expected: 1, actual: 2 })
        ));

        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, wire);
    }

    #[tokio::test]
    async fn connection_closed_mid_hello() {
        let wire = client_hello_wire(&[]);
        let cut = &wire[..wire.len() / 2];
        let mut stream: PeekedStream<_> = PeekedStream::peek(cut).await;
        assert!(matches!(stream.peek_error(), Some(DecodeError::Truncated { .. })));

        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, cut);
    }

    #[tokio::test]
    async fn empty_stream() {
        let mut stream: PeekedStream<&[u8]> = PeekedStream::peek(&[][..]).await;
        assert!(matches!(
            stream.peek_error(),
            Some(DecodeError::Truncated { needed: 5, remaining: 0 })
        ));
        let mut out = Vec::new();
        assert_eq!(stream.read_to_end(&mut out).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn server_hello_peek() {
        let message = HelloBuilder::server()
            .cipher_suites(&[0x1301])
            .extension(43, vec![0x03, 0x04])
            .build();
        let wire = testutil::records(&message, &[]);

        let stream: PeekedStream<_, ServerHelloInfo> = PeekedStream::peek(&wire[..]).await;
        let hello = stream.hello().unwrap();
        assert_eq!(hello.cipher_suite.code, 0x1301);
        assert_eq!(hello.ja3_string(), "771,4865,43,,");
    }

    #[tokio::test]
    async fn writes_pass_through() {
        let (mut client, server) = tokio::io::duplex(4096);
        let wire = client_hello_wire(&[30]);
        client.write_all(&wire).await.unwrap();

        let mut stream: PeekedStream<_> = PeekedStream::peek(server).await;
        assert!(stream.hello().is_some());

        stream.write_all(b"server flight").await.unwrap();
        stream.flush().await.unwrap();
        let mut reply = [0u8; 13];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"server flight");

        client.write_all(b"more").await.unwrap();
        drop(client);
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        let mut expected = wire;
        expected.extend_from_slice(b"more");
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn listener_peeks_accepted_connections() {
        let listener = PeekListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut wire = client_hello_wire(&[5, 40]);
        wire.extend_from_slice(b"trailing bytes");
        let sent = wire.clone();
        let client = tokio::spawn(async move {
            let mut conn = TcpStream::connect(addr).await.unwrap();
            conn.write_all(&sent).await.unwrap();
            conn.shutdown().await.unwrap();
        });

        let (mut stream, peer) = listener.accept().await.unwrap();
        assert!(peer.ip().is_loopback());
        let hello = stream.hello().unwrap();
        assert_eq!(hello.server_name(), Some("example.com"));
        assert_eq!(hello.info.protocols, vec!["h2".to_string(), "http/1.1".to_string()]);

        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, wire);
        client.await.unwrap();
    }

    #[tokio::test]
    async fn listener_returns_undecodable_connections() {
        let listener = PeekListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .with_reader(RecordReader::new(16));
        let addr = listener.local_addr().unwrap();

        let wire = client_hello_wire(&[]);
        let sent = wire.clone();
        let client = tokio::spawn(async move {
            let mut conn = TcpStream::connect(addr).await.unwrap();
            conn.write_all(&sent).await.unwrap();
            conn.shutdown().await.unwrap();
        });

        let (mut stream, _) = listener.accept().await.unwrap();
        assert!(matches!(
            stream.peek_error(),
            Some(DecodeError::MessageTooLarge { max: 16, .. })
        ));

        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, wire);
        client.await.unwrap();
    }
}
