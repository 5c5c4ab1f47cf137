//! Checkers for the string formats Kubernetes accepts
//!
//! `date-time`, `date`, `email`, `hostname`, `ipv4`, `ipv6` and `uri` are
//! checked by the validator's own draft 7 vocabulary. Everything else in the
//! Kubernetes set is registered from here, under its normalized name.

use base64::Engine as _;
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

/// A format checker, called with string instances only
pub type FormatCheck = fn(&str) -> bool;

/// Formats the draft 7 vocabulary does not cover
pub const CUSTOM_FORMATS: &[(&str, FormatCheck)] = &[
    ("bsonobjectid", is_bson_object_id),
    ("cidr", is_cidr),
    ("mac", is_mac),
    ("uuid", is_uuid),
    ("uuid3", is_uuid3),
    ("uuid4", is_uuid4),
    ("uuid5", is_uuid5),
    ("isbn", is_isbn),
    ("isbn10", is_isbn10),
    ("isbn13", is_isbn13),
    ("creditcard", is_credit_card),
    ("ssn", is_ssn),
    ("hexcolor", is_hex_color),
    ("rgbcolor", is_rgb_color),
    ("byte", is_byte),
    ("password", is_password),
    ("duration", is_duration),
];

static SSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}[- ]?\d{2}[- ]?\d{4}$").expect("valid regex"));

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#?(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex")
});

static RGB_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    let channel = r"\s*(?:0|[1-9]\d?|1\d\d|2[0-4]\d|25[0-5])\s*";
    Regex::new(&format!(r"^rgb\({channel},{channel},{channel}\)$")).expect("valid regex")
});

/// Go duration syntax, e.g. `1h30m` or `-1.5s`
static GO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:0|(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|ms|s|m|h))+)$")
        .expect("valid regex")
});

/// Spelled-out durations, e.g. `3 days` or `1 hour 20 min`
static UNIT_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:\d+\s*(?:ns|nanos?|us|µs|micros?|ms|millis?|s|secs?|m|mins?|h|hrs?|hours?|d|days?|w|wks?|weeks?)\s*)+$",
    )
    .expect("valid regex")
});

fn is_bson_object_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_cidr(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let Ok(addr) = addr.parse::<IpAddr>() else {
        return false;
    };
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let bits = if addr.is_ipv4() { 32 } else { 128 };
    prefix.parse::<u8>().is_ok_and(|p| p <= bits)
}

/// IEEE 802 MAC-48, EUI-48, EUI-64 or 20-octet InfiniBand addresses
fn is_mac(s: &str) -> bool {
    let groups = |sep: char, width: usize, counts: &[usize]| {
        let parts: Vec<&str> = s.split(sep).collect();
        counts.contains(&parts.len())
            && parts
                .iter()
                .all(|p| p.len() == width && p.bytes().all(|b| b.is_ascii_hexdigit()))
    };
    groups(':', 2, &[6, 8, 20]) || groups('-', 2, &[6, 8, 20]) || groups('.', 4, &[3, 4, 10])
}

/// The 32 hex digits of a hyphenated or compact UUID
fn uuid_nibbles(s: &str) -> Option<Vec<u8>> {
    let compact = if s.len() == 36 {
        let bytes = s.as_bytes();
        if [8, 13, 18, 23].iter().any(|&i| bytes[i] != b'-') {
            return None;
        }
        s.replace('-', "")
    } else {
        s.to_string()
    };
    if compact.len() != 32 {
        return None;
    }
    compact
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect()
}

fn is_uuid(s: &str) -> bool {
    uuid_nibbles(s).is_some()
}

fn is_uuid_version(s: &str, version: u8, rfc_variant: bool) -> bool {
    uuid_nibbles(s).is_some_and(|n| n[12] == version && (!rfc_variant || (8..=0xb).contains(&n[16])))
}

fn is_uuid3(s: &str) -> bool {
    is_uuid_version(s, 3, false)
}

fn is_uuid4(s: &str) -> bool {
    is_uuid_version(s, 4, true)
}

fn is_uuid5(s: &str) -> bool {
    is_uuid_version(s, 5, true)
}

/// Strip the separators ISBNs are usually printed with
fn isbn_digits(s: &str) -> String {
    s.chars().filter(|c| *c != '-' && *c != ' ').collect()
}

fn is_isbn10(s: &str) -> bool {
    let digits = isbn_digits(s);
    let bytes = digits.as_bytes();
    if bytes.len() != 10 || !bytes[..9].iter().all(u8::is_ascii_digit) {
        return false;
    }
    let check = match bytes[9] {
        b'X' => 10,
        b if b.is_ascii_digit() => u32::from(b - b'0'),
        _ => return false,
    };
    let sum: u32 = bytes[..9]
        .iter()
        .enumerate()
        .map(|(i, b)| (i as u32 + 1) * u32::from(b - b'0'))
        .sum::<u32>()
        + 10 * check;
    sum % 11 == 0
}

fn is_isbn13(s: &str) -> bool {
    let digits = isbn_digits(s);
    if digits.len() != 13 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let values: Vec<u32> = digits.bytes().map(|b| u32::from(b - b'0')).collect();
    let sum: u32 = values[..12]
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    (10 - sum % 10) % 10 == values[12]
}

fn is_isbn(s: &str) -> bool {
    is_isbn10(s) || is_isbn13(s)
}

/// Card-number length plus the Luhn checksum
fn is_credit_card(s: &str) -> bool {
    let digits: Vec<u32> = s
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .map(|c| c.to_digit(10))
        .collect::<Option<_>>()
        .unwrap_or_default();
    if !(12..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| match (i % 2, d * 2) {
            (0, _) => *d,
            (_, doubled) if doubled > 9 => doubled - 9,
            (_, doubled) => doubled,
        })
        .sum();
    sum % 10 == 0
}

fn is_ssn(s: &str) -> bool {
    SSN.is_match(s)
}

fn is_hex_color(s: &str) -> bool {
    HEX_COLOR.is_match(s)
}

fn is_rgb_color(s: &str) -> bool {
    RGB_COLOR.is_match(s)
}

/// Standard, padded base64
fn is_byte(s: &str) -> bool {
    base64::engine::general_purpose::STANDARD.decode(s).is_ok()
}

fn is_password(_: &str) -> bool {
    true
}

fn is_duration(s: &str) -> bool {
    GO_DURATION.is_match(s) || UNIT_DURATION.is_match(s)
}
