//! Entiers non signés 24 bits, little-endian (octet bas, milieu, haut).
//!
//! Les offsets du répertoire d’archive sont stockés sur 3 octets ; toute valeur
//! au-delà de `U24_MAX` est refusée plutôt que tronquée.

use byteorder::{ByteOrder, LittleEndian};

use crate::{CoreError, CoreResult};

/// Plus grande valeur représentable (`0xFF_FFFF`).
pub const U24_MAX: u32 = 0x00FF_FFFF;

/// Encode `value` sur 3 octets LE.
///
/// # Errors
/// `CoreError::U24Overflow` si `value > U24_MAX`.
pub fn pack_u24(value: usize) -> CoreResult<[u8; 3]> {
    let v = u32::try_from(value)
        .ok()
        .filter(|v| *v <= U24_MAX)
        .ok_or(CoreError::U24Overflow { value: value as u64 })?;
    let mut buf = [0u8; 3];
    LittleEndian::write_u24(&mut buf, v);
    Ok(buf)
}

/// Décode 3 octets LE.
#[must_use]
pub fn unpack_u24(bytes: [u8; 3]) -> u32 { LittleEndian::read_u24(&bytes) }
