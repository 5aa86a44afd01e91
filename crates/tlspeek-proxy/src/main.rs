use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use tlspeek_core::record::DEFAULT_MAX_MESSAGE_LEN;
use tlspeek_core::{PeekedStream, RecordReader, ServerHelloInfo};

mod output;

use output::{HelloRef, OutputFormat};

#[derive(Parser)]
#[command(name = "tlspeek-proxy")]
#[command(about = "TLS passthrough proxy that fingerprints ClientHello and ServerHello messages")]
struct Cli {
    /// Address to accept TLS connections on
    #[arg(short, long, default_value = "0.0.0.0:8443")]
    listen: SocketAddr,

    /// Upstream TLS server (host:port) to forward connections to.
    /// Without it, connections are closed once the ClientHello is printed.
    #[arg(short, long)]
    upstream: Option<String>,

    /// Output format: "text" (human-readable) or "json" (NDJSON, one object per line)
    #[arg(short, long, default_value = "text")]
    output: String,

    /// Print verbose output (raw JA3 strings; full decoded hello in JSON mode)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Largest handshake message to buffer, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_LEN)]
    max_message_len: usize,
}

struct Settings {
    upstream: Option<String>,
    format: OutputFormat,
    verbose: bool,
    reader: RecordReader,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let settings = Arc::new(Settings {
        upstream: cli.upstream,
        format: OutputFormat::parse(&cli.output)?,
        verbose: cli.verbose,
        reader: RecordReader::new(cli.max_message_len),
    });

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;

    info!("tlspeek proxy listening on {}", cli.listen);
    match &settings.upstream {
        Some(upstream) => info!("Forwarding connections to {}", upstream),
        None => info!("No upstream configured; connections close after the ClientHello"),
    }

    loop {
        let (stream, peer) = listener.accept().await.context("accept failed")?;
        let settings = Arc::clone(&settings);
        tokio::spawn(async move { handle(stream, peer, &settings).await });
    }
}

async fn handle(stream: TcpStream, peer: SocketAddr, settings: &Settings) {
    let client: PeekedStream<TcpStream> = PeekedStream::peek_with(stream, &settings.reader).await;

    match (client.hello(), client.peek_error()) {
        (Some(hello), _) => {
            output::print_hello(peer, None, HelloRef::Client(hello), settings.format, settings.verbose)
        }
        (None, Some(e)) => warn!("[{}] no ClientHello ({} bytes read): {}", peer, client.buffered().len(), e),
        (None, None) => {}
    }

    let Some(upstream) = settings.upstream.as_deref() else {
        return;
    };

    if let Err(e) = forward(client, peer, upstream, settings).await {
        error!("[{}] forwarding to {} failed: {:#}", peer, upstream, e);
    }
}

/// Pipe both directions between the client and `upstream`, printing the
/// upstream's ServerHello on the way back.
async fn forward(
    client: PeekedStream<TcpStream>,
    peer: SocketAddr,
    upstream: &str,
    settings: &Settings,
) -> Result<()> {
    let server = TcpStream::connect(upstream)
        .await
        .with_context(|| format!("failed to connect to {}", upstream))?;
    debug!("[{}] connected to {}", peer, upstream);

    let (mut client_rd, mut client_wr) = tokio::io::split(client);
    let (server_rd, mut server_wr) = server.into_split();

    let client_to_server = tokio::spawn(async move {
        let n = tokio::io::copy(&mut client_rd, &mut server_wr).await?;
        server_wr.shutdown().await?;
        Ok::<u64, io::Error>(n)
    });

    let mut server_rd: PeekedStream<_, ServerHelloInfo> = PeekedStream::peek_with(server_rd, &settings.reader).await;
    match (server_rd.hello(), server_rd.peek_error()) {
        (Some(hello), _) => output::print_hello(
            peer,
            Some(upstream),
            HelloRef::Server(hello),
            settings.format,
            settings.verbose,
        ),
        (None, Some(e)) => warn!("[{}] no ServerHello from {}: {}", peer, upstream, e),
        (None, None) => {}
    }

    let down = tokio::io::copy(&mut server_rd, &mut client_wr)
        .await
        .context("copy upstream -> client")?;
    client_wr.shutdown().await.context("shutdown client")?;

    let up = client_to_server
        .await
        .context("client -> upstream task panicked")?
        .context("copy client -> upstream")?;

    info!("[{}] closed: {} bytes up, {} bytes down", peer, up, down);
    Ok(())
}
