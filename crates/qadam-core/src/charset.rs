//! Table de caractères du jeu (CP 852 + glyphes de contrôle) et obfuscation des chaînes.
//!
//! Chaque octet 0..=255 a un glyphe affichable :
//! - `0x00` est rendu `␀` (U+2400) et `0xFF` (espace insécable) `␣` (U+2423) ;
//! - `0x01..=0x1F` reprennent les glyphes de contrôle historiques de la console DOS ;
//! - le paragraphe `0x15` est rendu `¥` et le tiret conditionnel `0xF0` `¯`, pour
//!   qu’aucun glyphe n’apparaisse deux fois.
//!
//! Le sens inverse (glyphe → octet) accepte quelques alias typographiques
//! (`‘ ’ – —`) et les contrôles `\r \n \t`.

use std::collections::HashMap;

use crate::escape;
use crate::{CoreError, CoreResult};

/* ─────────────────────────── Obfuscation ─────────────────────────── */

/// Clé additive appliquée aux octets de chaînes dans les archives.
pub const OBFUSCATION_KEY: u8 = 0x31;

/// `(b + 0x31) mod 256`.
#[inline]
#[must_use]
pub const fn obfuscate(b: u8) -> u8 { b.wrapping_add(OBFUSCATION_KEY) }

/// `(b - 0x31) mod 256`.
#[inline]
#[must_use]
pub const fn deobfuscate(b: u8) -> u8 { b.wrapping_sub(OBFUSCATION_KEY) }

/* ─────────────────────────── Glyphes ─────────────────────────── */

/// Glyphes CP 852, indexés par valeur d’octet.
pub const CP852_SYMBOLS: [char; 256] = [
    /* 0x00 */ '␀', '☺', '☻', '♥', '♦', '♣', '♠', '•', '◘', '○', '◙', '♂', '♀', '♪', '♫', '☼',
    /* 0x10 */ '►', '◄', '↕', '‼', '¶', '¥', '▬', '↨', '↑', '↓', '→', '←', '∟', '↔', '▲', '▼',
    /* 0x20 */ ' ', '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    /* 0x30 */ '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    /* 0x40 */ '@', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    /* 0x50 */ 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '[', '\\', ']', '^', '_',
    /* 0x60 */ '`', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    /* 0x70 */ 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '{', '|', '}', '~', '⌂',
    /* 0x80 */ 'Ç', 'ü', 'é', 'â', 'ä', 'ů', 'ć', 'ç', 'ł', 'ë', 'Ő', 'ő', 'î', 'Ź', 'Ä', 'Ć',
    /* 0x90 */ 'É', 'Ĺ', 'ĺ', 'ô', 'ö', 'Ľ', 'ľ', 'Ś', 'ś', 'Ö', 'Ü', 'Ť', 'ť', 'Ł', '×', 'č',
    /* 0xA0 */ 'á', 'í', 'ó', 'ú', 'Ą', 'ą', 'Ž', 'ž', 'Ę', 'ę', '¬', 'ź', 'Č', 'ş', '«', '»',
    /* 0xB0 */ '░', '▒', '▓', '│', '┤', 'Á', 'Â', 'Ě', 'Ş', '╣', '║', '╗', '╝', 'Ż', 'ż', '┐',
    /* 0xC0 */ '└', '┴', '┬', '├', '─', '┼', 'Ă', 'ă', '╚', '╔', '╩', '╦', '╠', '═', '╬', '¤',
    /* 0xD0 */ 'đ', 'Đ', 'Ď', 'Ë', 'ď', 'Ň', 'Í', 'Î', 'ě', '┘', '┌', '█', '▄', 'Ţ', 'Ů', '▀',
    /* 0xE0 */ 'Ó', 'ß', 'Ô', 'Ń', 'ń', 'ň', 'Š', 'š', 'Ŕ', 'Ú', 'ŕ', 'Ű', 'ý', 'Ý', 'ţ', '´',
    /* 0xF0 */ '¯', '˝', '˛', 'ˇ', '˘', '§', '÷', '¸', '°', '¨', '˙', 'ű', 'Ř', 'ř', '■', '␣',
];

/// Alias acceptés en plus des glyphes : `(alias, glyphe cible)`.
const TYPOGRAPHIC_ALIASES: [(char, char); 4] = [('–', '-'), ('—', '-'), ('‘', '\''), ('’', '\'')];

/// Caractères de contrôle encodés tels quels.
const CONTROL_ALIASES: [(char, u8); 3] = [('\r', b'\r'), ('\n', b'\n'), ('\t', b'\t')];

/* ─────────────────────────── CharsetTable ─────────────────────────── */

/// Correspondance bidirectionnelle octet ↔ glyphe.
///
/// Construite une fois au démarrage puis partagée par référence ; la table
/// est immuable et `Sync`.
#[derive(Debug, Clone)]
pub struct CharsetTable {
    symbols: [char; 256],
    reverse: HashMap<char, u8>,
}

impl CharsetTable {
    /// Table du jeu : CP 852 + alias.
    #[must_use]
    pub fn cp852() -> Self { Self::from_symbols(CP852_SYMBOLS) }

    /// Construit une table depuis 256 glyphes. En cas de doublon, le premier
    /// octet enregistré garde le glyphe.
    #[must_use]
    pub fn from_symbols(symbols: [char; 256]) -> Self {
        let mut reverse = HashMap::with_capacity(256 + CONTROL_ALIASES.len() + TYPOGRAPHIC_ALIASES.len());
        for (byte, &sym) in (0..=u8::MAX).zip(symbols.iter()) {
            reverse.entry(sym).or_insert(byte);
        }
        for (ctrl, byte) in CONTROL_ALIASES {
            reverse.entry(ctrl).or_insert(byte);
        }
        for (alias, target) in TYPOGRAPHIC_ALIASES {
            if let Some(&byte) = reverse.get(&target) {
                reverse.entry(alias).or_insert(byte);
            }
        }
        Self { symbols, reverse }
    }

    /// Glyphe affichable d’un octet (fonction totale).
    #[inline]
    #[must_use]
    pub const fn byte_to_display(&self, b: u8) -> char { self.symbols[b as usize] }

    /// Octet d’un glyphe (ou d’un alias).
    ///
    /// # Errors
    /// `CoreError::UnknownSymbol` si le caractère n’est pas dans la table.
    pub fn display_to_byte(&self, symbol: char) -> CoreResult<u8> {
        self.reverse.get(&symbol).copied().ok_or(CoreError::UnknownSymbol { symbol })
    }

    /// Vrai si `symbol` a un octet.
    #[must_use]
    pub fn contains(&self, symbol: char) -> bool { self.reverse.contains_key(&symbol) }

    /// Ajoute le glyphe de `b` à `out`, en échappant `"`, `\n`, `\t` et `\`.
    pub fn push_escaped(&self, out: &mut String, b: u8) {
        match b {
            b'"' | b'\n' | b'\t' | b'\\' => escape::push_escaped(out, char::from(b)),
            _ => out.push(self.byte_to_display(b)),
        }
    }

    /// Texte échappé → octets bruts (sans obfuscation ni terminateur).
    ///
    /// # Errors
    /// Échappement invalide, ou caractère absent de la table.
    pub fn encode_text(&self, escaped: &str) -> CoreResult<Vec<u8>> {
        let text = escape::unescape(escaped)?;
        text.chars().map(|c| self.display_to_byte(c)).collect()
    }

    /// Octets bruts → texte échappé, inverse de [`CharsetTable::encode_text`].
    #[must_use]
    pub fn decode_text(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        for &b in bytes {
            self.push_escaped(&mut out, b);
        }
        out
    }
}

impl Default for CharsetTable {
    fn default() -> Self { Self::cp852() }
}

/* ─────────────────────────── Tests ─────────────────────────── */
