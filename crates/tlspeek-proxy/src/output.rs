use std::net::SocketAddr;

use serde::Serialize;

use tlspeek_core::fingerprint::grease::is_grease_u16;
use tlspeek_core::{ClientHelloInfo, DerivedInfo, Extension, ExtensionData, ProtocolVersion, ServerHelloInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid output format '{}'. Expected 'text' or 'json'.", s),
        }
    }
}

/// Either side's hello, borrowed for printing.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum HelloRef<'a> {
    Client(&'a ClientHelloInfo),
    Server(&'a ServerHelloInfo),
}

impl<'a> HelloRef<'a> {
    fn label(self) -> &'static str {
        match self {
            Self::Client(_) => "ClientHello",
            Self::Server(_) => "ServerHello",
        }
    }

    fn version(self) -> ProtocolVersion {
        match self {
            Self::Client(h) => h.version,
            Self::Server(h) => h.version,
        }
    }

    fn extensions(self) -> &'a [Extension] {
        match self {
            Self::Client(h) => &h.extensions,
            Self::Server(h) => &h.extensions,
        }
    }

    fn info(self) -> &'a DerivedInfo {
        match self {
            Self::Client(h) => &h.info,
            Self::Server(h) => &h.info,
        }
    }

    fn cipher_suites(self) -> Vec<&'static str> {
        match self {
            Self::Client(h) => h.cipher_suites.iter().map(|c| c.name).collect(),
            Self::Server(h) => vec![h.cipher_suite.name],
        }
    }
}

/// Versions offered (or selected) through supported_versions, GREASE removed.
fn supported_versions(extensions: &[Extension]) -> Vec<ProtocolVersion> {
    extensions
        .iter()
        .rev()
        .find_map(|e| match &e.data {
            ExtensionData::SupportedVersions { versions } => Some(versions),
            _ => None,
        })
        .map(|versions| versions.iter().copied().filter(|v| !is_grease_u16(v.0)).collect())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    message: &'static str,
    peer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream: Option<&'a str>,
    sni: Option<&'a str>,
    tls_version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    supported_versions: Vec<String>,
    cipher_suites: Vec<&'static str>,
    extensions: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    alpn: &'a Vec<String>,
    scts: bool,
    ja3_hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ja3_raw: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hello: Option<HelloRef<'a>>,
}

pub fn print_hello(peer: SocketAddr, upstream: Option<&str>, hello: HelloRef<'_>, format: OutputFormat, verbose: bool) {
    match format {
        OutputFormat::Text => print_text(peer, upstream, hello, verbose),
        OutputFormat::Json => match json_line(peer, upstream, hello, verbose) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!("[{}] failed to serialize {}: {}", peer, hello.label(), e),
        },
    }
}

fn print_text(peer: SocketAddr, upstream: Option<&str>, hello: HelloRef<'_>, verbose: bool) {
    let info = hello.info();
    let version = hello.version();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  {}", hello.label());
    println!("  Client:     {}", peer);
    if let Some(upstream) = upstream {
        println!("  Upstream:   {}", upstream);
    }
    println!("  SNI:        {}", info.server_name.as_deref().unwrap_or("(none)"));
    println!("  TLS ver:    {} ({})", version, version.name());
    let versions = supported_versions(hello.extensions());
    if !versions.is_empty() {
        let vers: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        println!("  Sup. vers:  {}", vers.join(", "));
    }
    match hello {
        HelloRef::Client(h) => println!("  Ciphers:    {} suites", h.cipher_suites.len()),
        HelloRef::Server(h) => println!("  Cipher:     {}", h.cipher_suite.name),
    }
    println!("  Extensions: {} types", hello.extensions().len());
    if !info.protocols.is_empty() {
        println!("  ALPN:       {}", info.protocols.join(", "));
    }
    if info.scts {
        println!("  SCT:        requested");
    }
    println!("  ──────────────────────────────────────────────────");
    println!("  JA3:        {}", info.ja3_fingerprint);
    if verbose {
        println!("  JA3 raw:    {}", info.ja3_string);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn json_line(
    peer: SocketAddr,
    upstream: Option<&str>,
    hello: HelloRef<'_>,
    verbose: bool,
) -> serde_json::Result<String> {
    let info = hello.info();
    let record = JsonRecord {
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        message: hello.label(),
        peer: peer.to_string(),
        upstream,
        sni: info.server_name.as_deref(),
        tls_version: hello.version().to_string(),
        supported_versions: supported_versions(hello.extensions())
            .iter()
            .map(|v| v.to_string())
            .collect(),
        cipher_suites: hello.cipher_suites(),
        extensions: hello.extensions().len(),
        alpn: &info.protocols,
        scts: info.scts,
        ja3_hash: &info.ja3_fingerprint,
        ja3_raw: if verbose { Some(&info.ja3_string) } else { None },
        hello: if verbose { Some(hello) } else { None },
    };
    serde_json::to_string(&record)
}
