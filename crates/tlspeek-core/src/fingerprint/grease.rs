/// The sixteen reserved GREASE code points (RFC 8701), `0x0A0A` through `0xFAFA`.
pub const GREASE_VALUES: [u16; 16] = [
    0x0A0A, 0x1A1A, 0x2A2A, 0x3A3A, 0x4A4A, 0x5A5A, 0x6A6A, 0x7A7A, 0x8A8A, 0x9A9A, 0xAAAA, 0xBABA,
    0xCACA, 0xDADA, 0xEAEA, 0xFAFA,
];

/// Check if a u16 value is a GREASE value.
///
/// GREASE values follow the pattern 0x?A?A where both bytes are identical.
pub fn is_grease_u16(val: u16) -> bool {
    let hi = (val >> 8) as u8;
    let lo = val as u8;
    hi == lo && (hi & 0x0F) == 0x0A
}

/// Filter GREASE values out of a sequence, keeping wire order.
pub fn filter_grease_u16<I>(values: I) -> Vec<u16>
where
    I: IntoIterator<Item = u16>,
{
    values.into_iter().filter(|v| !is_grease_u16(*v)).collect()
}
