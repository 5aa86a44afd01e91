//! Per-type extension payload decoders.
//!
//! A decoder reads from a cursor bounded to the extension's declared
//! payload. It does not need to check for leftover bytes itself; the caller
//! rejects any payload the decoder did not fully consume.

use crate::cursor::{Cursor, LengthPrefix};
use crate::error::DecodeError;
use crate::extension::{ExtensionData, KeyShareEntry};
use crate::handshake::{HandshakeKind, ProtocolVersion};

pub(crate) type Decoder = fn(&mut Cursor<'_>, HandshakeKind) -> Result<ExtensionData, DecodeError>;

const NAME_TYPE_HOST_NAME: u8 = 0;

pub(crate) fn server_name(c: &mut Cursor<'_>, kind: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    // A server acknowledges SNI with an empty payload.
    if kind == HandshakeKind::ServerHello && c.is_empty() {
        return Ok(ExtensionData::ServerName { host_name: None });
    }

    let mut list = c.read_length_prefixed(LengthPrefix::U16)?;
    if list.is_empty() {
        return Err(DecodeError::MalformedMessage("empty server name list"));
    }

    let mut host_name = None;
    while !list.is_empty() {
        let name_type = list.read_u8()?;
        let name = list.read_length_prefixed(LengthPrefix::U16)?.read_rest();
        if name_type == NAME_TYPE_HOST_NAME && host_name.is_none() {
            host_name = Some(String::from_utf8_lossy(name).into_owned());
        }
    }
    Ok(ExtensionData::ServerName { host_name })
}

pub(crate) fn supported_groups(c: &mut Cursor<'_>, _: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    Ok(ExtensionData::SupportedGroups {
        groups: read_u16_list(c, LengthPrefix::U16)?,
    })
}

pub(crate) fn ec_point_formats(c: &mut Cursor<'_>, _: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    let formats = c.read_length_prefixed(LengthPrefix::U8)?.read_rest().to_vec();
    Ok(ExtensionData::EcPointFormats { formats })
}

pub(crate) fn signature_algorithms(c: &mut Cursor<'_>, _: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    Ok(ExtensionData::SignatureAlgorithms {
        schemes: read_u16_list(c, LengthPrefix::U16)?,
    })
}

pub(crate) fn alpn(c: &mut Cursor<'_>, _: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    let mut list = c.read_length_prefixed(LengthPrefix::U16)?;
    let mut protocols = Vec::new();
    while !list.is_empty() {
        protocols.push(list.read_length_prefixed(LengthPrefix::U8)?.read_rest().to_vec());
    }
    Ok(ExtensionData::Alpn { protocols })
}

/// Only presence matters; the SCT list a server sends is not parsed.
pub(crate) fn signed_certificate_timestamp(
    c: &mut Cursor<'_>,
    _: HandshakeKind,
) -> Result<ExtensionData, DecodeError> {
    c.read_rest();
    Ok(ExtensionData::SignedCertificateTimestamp)
}

pub(crate) fn padding(c: &mut Cursor<'_>, _: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    Ok(ExtensionData::Padding {
        len: c.read_rest().len(),
    })
}

pub(crate) fn session_ticket(c: &mut Cursor<'_>, _: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    Ok(ExtensionData::SessionTicket {
        ticket: c.read_rest().to_vec(),
    })
}

pub(crate) fn supported_versions(c: &mut Cursor<'_>, kind: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    let versions = match kind {
        HandshakeKind::ClientHello => read_u16_list(c, LengthPrefix::U8)?
            .into_iter()
            .map(ProtocolVersion)
            .collect(),
        HandshakeKind::ServerHello => vec![ProtocolVersion(c.read_u16()?)],
    };
    Ok(ExtensionData::SupportedVersions { versions })
}

pub(crate) fn psk_key_exchange_modes(c: &mut Cursor<'_>, _: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    let modes = c.read_length_prefixed(LengthPrefix::U8)?.read_rest().to_vec();
    Ok(ExtensionData::PskKeyExchangeModes { modes })
}

pub(crate) fn key_share(c: &mut Cursor<'_>, kind: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    let entries = match kind {
        HandshakeKind::ClientHello => {
            let mut list = c.read_length_prefixed(LengthPrefix::U16)?;
            let mut entries = Vec::new();
            while !list.is_empty() {
                entries.push(read_key_share_entry(&mut list)?);
            }
            entries
        }
        HandshakeKind::ServerHello => {
            let group = c.read_u16()?;
            if c.is_empty() {
                // HelloRetryRequest names the selected group only.
                vec![KeyShareEntry {
                    group,
                    key_exchange: Vec::new(),
                }]
            } else {
                let key_exchange = c.read_length_prefixed(LengthPrefix::U16)?.read_rest().to_vec();
                vec![KeyShareEntry { group, key_exchange }]
            }
        }
    };
    Ok(ExtensionData::KeyShare { entries })
}

pub(crate) fn renegotiation_info(c: &mut Cursor<'_>, _: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    let data = c.read_length_prefixed(LengthPrefix::U8)?.read_rest().to_vec();
    Ok(ExtensionData::RenegotiationInfo { data })
}

pub(crate) fn unknown(c: &mut Cursor<'_>, _: HandshakeKind) -> Result<ExtensionData, DecodeError> {
    Ok(ExtensionData::Unknown {
        data: c.read_rest().to_vec(),
    })
}

fn read_key_share_entry(c: &mut Cursor<'_>) -> Result<KeyShareEntry, DecodeError> {
    let group = c.read_u16()?;
    let key_exchange = c.read_length_prefixed(LengthPrefix::U16)?.read_rest().to_vec();
    Ok(KeyShareEntry { group, key_exchange })
}

fn read_u16_list(c: &mut Cursor<'_>, prefix: LengthPrefix) -> Result<Vec<u16>, DecodeError> {
    let mut list = c.read_length_prefixed(prefix)?;
    if list.remaining() % 2 != 0 {
        return Err(DecodeError::MalformedMessage("odd-length u16 list"));
    }
    let mut out = Vec::with_capacity(list.remaining() / 2);
    while !list.is_empty() {
        out.push(list.read_u16()?);
    }
    Ok(out)
}
