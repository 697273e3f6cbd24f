//! qadam-core — primitives partagées par le compilateur et le décompilateur d’archives
//!
//! Fournit :
//! - `CharsetTable` : glyphes CP 852 ↔ octets, alias, `encode_text` / `decode_text`
//! - `obfuscate` / `deobfuscate` : transformation additive des octets de chaînes
//! - `escape` : échappements `\n \t \r \\ \" \xHH`
//! - `u24` : entiers 24 bits LE bornés
//! - IO mémoire (little-endian) : `ByteWriter`, `ByteReader`
//! - Erreurs `CoreError` + alias `CoreResult<T>`
//!
//! Features :
//! - `serde` : derive (dé)sérialisation de `CoreError`

#![deny(missing_docs)]

/* ─────────────────────────── Imports ─────────────────────────── */

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Table de caractères et obfuscation.
pub mod charset;
/// Échappements des chaînes source.
pub mod escape;
/// Entiers 24 bits little-endian.
pub mod u24;

pub use charset::{deobfuscate, obfuscate, CharsetTable, OBFUSCATION_KEY};
pub use u24::{pack_u24, unpack_u24, U24_MAX};

/* ─────────────────────────── Résultat commun ─────────────────────────── */

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/* ─────────────────────────── Byte Writer (LE) ─────────────────────────── */

/// Buffer d’écriture (croît automatiquement).
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Crée un writer vide.
    #[must_use]
    pub const fn new() -> Self { Self { buf: Vec::new() } }
    /// Crée un writer avec une capacité réservée.
    #[must_use]
    pub fn with_capacity(cap: usize) -> Self { Self { buf: Vec::with_capacity(cap) } }
    /// Accès en lecture au contenu.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] { &self.buf }
    /// Nombre d’octets écrits.
    #[must_use]
    pub fn len(&self) -> usize { self.buf.len() }
    /// Vrai si rien n’a été écrit.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }
    /// Récupère le buffer (consomme).
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> { self.buf }
    /// Écrit un octet.
    pub fn write_u8(&mut self, v: u8) { self.buf.push(v); }
    /// Ajoute des octets bruts.
    pub fn write_bytes(&mut self, bytes: &[u8]) { self.buf.extend_from_slice(bytes); }
    /// Écrit un entier 24 bits little-endian.
    ///
    /// # Errors
    /// `CoreError::U24Overflow` si la valeur dépasse `U24_MAX`.
    pub fn write_u24_le(&mut self, v: usize) -> CoreResult<()> {
        let b = pack_u24(v)?;
        self.write_bytes(&b);
        Ok(())
    }
}

/* ─────────────────────────── Byte Reader (LE) ─────────────────────────── */

/// Lecteur séquentiel sur un slice d’octets (helpers LE).
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    /// Construit un lecteur.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self { Self { data, off: 0 } }
    /// Offset courant.
    #[must_use]
    pub const fn offset(&self) -> usize { self.off }
    /// Taille restante.
    #[must_use]
    pub const fn remaining(&self) -> usize { self.data.len().saturating_sub(self.off) }

    /// Lit `n` octets (ou erreur si EOF).
    ///
    /// # Errors
    /// `CoreError::UnexpectedEof` si le buffer est trop court.
    pub fn read_bytes(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CoreError::UnexpectedEof { needed: n, at: self.off });
        }
        let start = self.off;
        self.off += n;
        Ok(&self.data[start..self.off])
    }

    /// Lit un octet.
    ///
    /// # Errors
    /// `CoreError::UnexpectedEof` en fin de buffer.
    pub fn read_u8(&mut self) -> CoreResult<u8> {
        let b = self.read_bytes(1)?;
        Ok(b[0])
    }

    /// Lit un entier 24 bits LE.
    ///
    /// # Errors
    /// `CoreError::UnexpectedEof` s’il reste moins de 3 octets.
    pub fn read_u24_le(&mut self) -> CoreResult<u32> {
        let b = self.read_bytes(3)?;
        Ok(unpack_u24([b[0], b[1], b[2]]))
    }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreurs de bas niveau communes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoreError {
    /// Fin de buffer inattendue.
    #[error("unexpected EOF: need {needed} bytes at {at}")]
    UnexpectedEof {
        /// Nombre d’octets demandés.
        needed: usize,
        /// Offset où l’erreur s’est produite.
        at: usize,
    },
    /// Valeur trop grande pour 3 octets.
    #[error("value {value} does not fit in 24 bits (max {max})", max = U24_MAX)]
    U24Overflow {
        /// Valeur fautive.
        value: u64,
    },
    /// Caractère absent de la table.
    #[error("character {symbol:?} is not in the charset")]
    UnknownSymbol {
        /// Caractère fautif.
        symbol: char,
    },
    /// Séquence d’échappement inconnue ou incomplète.
    #[error("invalid escape sequence: \\{escape}")]
    InvalidEscape {
        /// Séquence fautive, sans le `\` initial.
        escape: String,
    },
    /// `\` en fin de texte.
    #[error("trailing backslash in string")]
    TrailingBackslash,
}

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        deobfuscate, obfuscate, pack_u24, unpack_u24, ByteReader, ByteWriter, CharsetTable,
        CoreError, CoreResult, U24_MAX,
    };
}

/* ─────────────────────────── Tests ─────────────────────────── */
