//! Échappements des chaînes source : `\n \t \r \\ \" \xHH`.
//!
//! `\xHH` désigne l’octet HH : il est remplacé par le glyphe CP 852 de cet
//! octet, que la table ramène ensuite à HH. `\x82` vaut donc `é` (0x82) et
//! non U+0082.

use crate::charset::CP852_SYMBOLS;
use crate::{CoreError, CoreResult};

/// Décode les échappements d’un texte.
///
/// # Errors
/// - `TrailingBackslash` si le texte finit par `\` ;
/// - `InvalidEscape` pour une séquence inconnue ou un `\x` incomplet.
pub fn unescape(s: &str) -> CoreResult<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let esc = chars.next().ok_or(CoreError::TrailingBackslash)?;
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'x' => {
                let hi = chars.next();
                let lo = chars.next();
                let v = match (hi.and_then(hex_val), lo.and_then(hex_val)) {
                    (Some(h), Some(l)) => (h << 4) | l,
                    _ => {
                        let mut seq = String::from("x");
                        seq.extend(hi);
                        seq.extend(lo);
                        return Err(CoreError::InvalidEscape { escape: seq });
                    }
                };
                out.push(CP852_SYMBOLS[usize::from(v)]);
            }
            other => return Err(CoreError::InvalidEscape { escape: other.to_string() }),
        }
    }
    Ok(out)
}

/// Ajoute `c` à `out`, échappé si nécessaire (`"`, `\`, `\n`, `\t`, `\r`).
pub fn push_escaped(out: &mut String, c: char) {
    match c {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        other => out.push(other),
    }
}

/// Version `String` de [`push_escaped`] sur tout un texte.
#[must_use]
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_escaped(&mut out, c);
    }
    out
}

#[inline]
const fn hex_val(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some((c as u8) - b'0'),
        'a'..='f' => Some((c as u8) - b'a' + 10),
        'A'..='F' => Some((c as u8) - b'A' + 10),
        _ => None,
    }
}
