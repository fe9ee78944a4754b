//! Source identifier arithmetic.
//!
//! Every id that enters or leaves the crate passes through [`to_signed_64`]:
//! ids synthesised by [`fallback_id`], ids parsed from registry payloads, and
//! ids seeded from static tables. Keeping a single conversion point is what
//! makes fallback ids and registry ids comparable.

/// Reinterprets the low 64 bits of `value` as a two's-complement signed integer.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn to_signed_64(value: u64) -> i64 {
    value as i64
}

/// Java-compatible `String.hashCode` over UTF-16 code units, accumulated with
/// 64-bit wrapping arithmetic instead of Java's 32-bit `int`.
#[must_use]
pub fn java_hash(seed: &str) -> u64 {
    seed.encode_utf16()
        .fold(0u64, |h, unit| h.wrapping_mul(31).wrapping_add(u64::from(unit)))
}

/// Deterministic identifier for a source nothing is known about.
///
/// The same seed always yields the same id, so an unknown source migrated
/// twice lands under the same id both times.
#[must_use]
pub fn fallback_id(seed: &str) -> i64 {
    to_signed_64(java_hash(seed))
}

/// Parses a registry-supplied id.
///
/// Registries publish ids as decimal strings or JSON numbers of arbitrary
/// width. Unsigned values are reduced modulo 2^64 and then reinterpreted as
/// signed; an explicit leading `-` is accepted for sources that already publish
/// the signed form. Returns `None` for anything that is not a decimal integer.
#[must_use]
pub fn parse_registry_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let magnitude = digits
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(10).wrapping_add(u64::from(b - b'0')));

    let unsigned = if negative { magnitude.wrapping_neg() } else { magnitude };
    Some(to_signed_64(unsigned))
}
