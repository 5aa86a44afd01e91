use std::collections::HashMap;
use std::sync::LazyLock;

use crate::extension::decoders::{self, Decoder};
use crate::fingerprint::grease::GREASE_VALUES;

/// Static facts about an extension type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub name: &'static str,
    pub is_grease: bool,
    pub is_private: bool,
}

impl ExtensionInfo {
    const fn named(name: &'static str) -> Self {
        Self {
            name,
            is_grease: false,
            is_private: false,
        }
    }
}

/// Returned for any code absent from the table.
pub static UNASSIGNED: ExtensionInfo = ExtensionInfo::named("unassigned");

pub const PRIVATE_USE_START: u16 = 0xFF00;

/// IANA "TLS ExtensionType Values".
const ASSIGNED: &[(u16, &str)] = &[
    (0, "server_name"),
    (1, "max_fragment_length"),
    (2, "client_certificate_url"),
    (3, "trusted_ca_keys"),
    (4, "truncated_hmac"),
    (5, "status_request"),
    (6, "user_mapping"),
    (7, "client_authz"),
    (8, "server_authz"),
    (9, "cert_type"),
    (10, "supported_groups"),
    (11, "ec_point_formats"),
    (12, "srp"),
    (13, "signature_algorithms"),
    (14, "use_srtp"),
    (15, "heartbeat"),
    (16, "application_layer_protocol_negotiation"),
    (17, "status_request_v2"),
    (18, "signed_certificate_timestamp"),
    (19, "client_certificate_type"),
    (20, "server_certificate_type"),
    (21, "padding"),
    (22, "encrypt_then_mac"),
    (23, "extended_master_secret"),
    (24, "token_binding"),
    (25, "cached_info"),
    (26, "tls_lts"),
    (27, "compress_certificate"),
    (28, "record_size_limit"),
    (29, "pwd_protect"),
    (30, "pwd_clear"),
    (31, "password_salt"),
    (32, "ticket_pinning"),
    (33, "tls_cert_with_extern_psk"),
    (34, "delegated_credential"),
    (35, "session_ticket"),
    (36, "TLMSP"),
    (37, "TLMSP_proxying"),
    (38, "TLMSP_delegate"),
    (39, "supported_ekt_ciphers"),
    (41, "pre_shared_key"),
    (42, "early_data"),
    (43, "supported_versions"),
    (44, "cookie"),
    (45, "psk_key_exchange_modes"),
    (47, "certificate_authorities"),
    (48, "oid_filters"),
    (49, "post_handshake_auth"),
    (50, "signature_algorithms_cert"),
    (51, "key_share"),
    (52, "transparency_info"),
    (53, "connection_id_deprecated"),
    (54, "connection_id"),
    (55, "external_id_hash"),
    (56, "external_session_id"),
    (57, "quic_transport_parameters"),
    (58, "ticket_request"),
    (59, "dnssec_chain"),
    (60, "sequence_number_encryption_algorithms"),
    (61, "rrc"),
    (13172, "next_protocol_negotiation"),
    (17513, "application_settings"),
    (65037, "encrypted_client_hello"),
    (65281, "renegotiation_info"),
];

static TABLE: LazyLock<HashMap<u16, ExtensionInfo>> = LazyLock::new(|| {
    let mut table = HashMap::with_capacity(ASSIGNED.len() + GREASE_VALUES.len() + 256);
    for code in PRIVATE_USE_START..=u16::MAX {
        table.insert(
            code,
            ExtensionInfo {
                name: "private_use",
                is_grease: false,
                is_private: true,
            },
        );
    }
    for &code in GREASE_VALUES.iter() {
        table.insert(
            code,
            ExtensionInfo {
                name: "GREASE",
                is_grease: true,
                is_private: false,
            },
        );
    }
    // Assigned entries last so renegotiation_info overrides the private range.
    for &(code, name) in ASSIGNED {
        table.insert(code, ExtensionInfo::named(name));
    }
    table
});

/// Static facts for an extension type code.
pub fn lookup(code: u16) -> &'static ExtensionInfo {
    TABLE.get(&code).unwrap_or(&UNASSIGNED)
}

/// The payload decoder registered for a type code; unknown codes capture
/// their payload verbatim.
pub(crate) fn decoder_for(code: u16) -> Decoder {
    match code {
        0 => decoders::server_name,
        10 => decoders::supported_groups,
        11 => decoders::ec_point_formats,
        13 => decoders::signature_algorithms,
        16 => decoders::alpn,
        18 => decoders::signed_certificate_timestamp,
        21 => decoders::padding,
        35 => decoders::session_ticket,
        43 => decoders::supported_versions,
        45 => decoders::psk_key_exchange_modes,
        51 => decoders::key_share,
        65281 => decoders::renegotiation_info,
        _ => decoders::unknown,
    }
}
