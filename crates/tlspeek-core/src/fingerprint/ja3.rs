use md5::{Digest, Md5};

use crate::extension::{Extension, ExtensionData};
use crate::fingerprint::grease::filter_grease_u16;
use crate::fingerprint::types::Ja3Result;
use crate::handshake::{CipherSuite, ProtocolVersion};

/// Compute the JA3 fingerprint of a decoded hello message.
///
/// JA3 format: MD5(SSLVersion,Ciphers,Extensions,EllipticCurves,EcPointFormats)
///
/// - Fields separated by commas, always exactly five
/// - Values within each field separated by dashes, in wire order
/// - GREASE values filtered from ciphers, extensions and curves
/// - All values in decimal
///
/// Curves and point formats come from the supported_groups and
/// ec_point_formats extensions; a missing extension leaves its field empty.
pub fn compute_ja3(
    version: ProtocolVersion,
    cipher_suites: &[CipherSuite],
    extensions: &[Extension],
) -> Ja3Result {
    let ciphers = join(filter_grease_u16(cipher_suites.iter().map(|c| c.code)));

    let extension_types = join(
        extensions
            .iter()
            .filter(|e| !e.is_grease)
            .map(|e| e.ext_type.0),
    );

    let mut curves = Vec::new();
    let mut point_formats = Vec::new();
    for ext in extensions {
        match &ext.data {
            ExtensionData::SupportedGroups { groups } => {
                curves = filter_grease_u16(groups.iter().copied());
            }
            ExtensionData::EcPointFormats { formats } => {
                point_formats = formats.clone();
            }
            _ => {}
        }
    }

    let raw_string = format!(
        "{},{},{},{},{}",
        version.0,
        ciphers,
        extension_types,
        join(curves),
        join(point_formats)
    );

    Ja3Result {
        hash: ja3_hash(&raw_string),
        raw_string,
    }
}

/// Lowercase hex MD5 of a JA3 string.
pub fn ja3_hash(raw_string: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(raw_string.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn join<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("-")
}
