//! Query-string handling and value validation for the control endpoint.

use crate::error::{ControlError, Result};
use speaker_engine::ParamId;

/// Split a URL into its path and decoded `key=value` pairs.
pub fn split_url(url: &str) -> (&str, Vec<(String, String)>) {
    match url.split_once('?') {
        Some((path, query)) => (path, parse_query(query)),
        None => (url, Vec::new()),
    }
}

pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(k), percent_decode(v))
        })
        .collect()
}

/// First value for `key`, like most HTTP frameworks.
pub fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// `application/x-www-form-urlencoded` decoding: `+` is a space, `%XX` a byte.
/// Malformed escapes are kept literally; invalid UTF-8 is replaced.
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = bytes.get(i + 1).copied().and_then(hex);
                let lo = bytes.get(i + 2).copied().and_then(hex);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decimal float; non-finite values count as malformed.
pub fn parse_value(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Clamp to the parameter's control range.
pub fn clamp_to_range(id: ParamId, v: f32) -> f32 {
    let (lo, hi) = id.control_range();
    v.clamp(lo, hi)
}

/// Validate every recognised parameter in `pairs`. Nothing is stored here, so
/// one bad value rejects the whole update.
pub fn collect_updates(pairs: &[(String, String)]) -> Result<Vec<(ParamId, f32)>> {
    let mut updates = Vec::new();
    for id in ParamId::ALL {
        let Some(raw) = param(pairs, id.name()) else {
            continue;
        };
        let v = parse_value(raw).ok_or_else(|| ControlError::InvalidParam {
            name: id.name().to_string(),
            value: raw.to_string(),
        })?;
        updates.push((id, clamp_to_range(id, v)));
    }
    if updates.is_empty() {
        return Err(ControlError::NoParams);
    }
    Ok(updates)
}
