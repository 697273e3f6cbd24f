//! Archive binaire → texte source.
//!
//! Le listing est reconstruit par heuristique : les octets sortent en hex
//! jusqu’à ce que [`DecompileOptions::hex_run_limit`] d’entre eux s’accumulent
//! sans frontière de section ; on suppose alors une chaîne terminée par NUL
//! et on passe en texte entre guillemets jusqu’au prochain `0x00`. Quelle que
//! soit la supposition, recompiler le listing redonne les octets d’entrée.

use core::fmt::Write as _;
use core::num::NonZeroUsize;
use std::io::Write;

use qadam_core::{deobfuscate, CharsetTable};
use tracing::{debug, warn};

use crate::archive::Directory;
use crate::error::{DecompileError, FormatError};

/// Octets hex affichés avant de passer en mode chaîne.
pub const DEFAULT_HEX_RUN_LIMIT: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(n) => n,
    None => panic!("hex run limit must be non-zero"),
};

/// Réglages du listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompileOptions {
    /// Octets hex consécutifs tolérés avant de supposer une chaîne.
    pub hex_run_limit: NonZeroUsize,
}

impl Default for DecompileOptions {
    fn default() -> Self { Self { hex_run_limit: DEFAULT_HEX_RUN_LIMIT } }
}

/// Décompile avec les réglages par défaut.
///
/// # Errors
/// Toute [`FormatError`] levée à la lecture du répertoire.
pub fn decompile(data: &[u8], charset: &CharsetTable) -> Result<String, FormatError> {
    decompile_with(data, charset, DecompileOptions::default())
}

/// Décompile avec des réglages explicites.
///
/// # Errors
/// Toute [`FormatError`] levée à la lecture du répertoire.
pub fn decompile_with(data: &[u8], charset: &CharsetTable, options: DecompileOptions) -> Result<String, FormatError> {
    let dir = Directory::read(data)?;
    let mut listing = Listing::new(charset, options, data.len());

    let mut section_end = dir.directory_end();
    for (at, &b) in data.iter().enumerate().skip(dir.directory_end()) {
        if at == section_end {
            listing.boundary(&dir, at);
            section_end = dir.next_boundary(at);
        }
        listing.push_byte(b);
    }
    listing.boundary(&dir, data.len());
    listing.out.push('\n');

    debug!(
        sections = dir.section_count(),
        bytes = data.len(),
        unterminated = listing.unterminated,
        "decompiled archive"
    );
    Ok(listing.out)
}

/// Décompile vers `out`. Rien n’est écrit tant que le listing entier n’a pas
/// été produit.
///
/// # Errors
/// `DecompileError::Format` pour une archive malformée, `DecompileError::Io`
/// si l’écriture échoue.
pub fn decompile_to<W: Write>(data: &[u8], charset: &CharsetTable, mut out: W) -> Result<(), DecompileError> {
    let text = decompile(data, charset)?;
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/* ─────────────────────────── Listing ─────────────────────────── */

struct Listing<'t> {
    charset: &'t CharsetTable,
    limit: usize,
    out: String,
    hex_run: usize,
    string_run: usize,
    unterminated: usize,
}

impl<'t> Listing<'t> {
    fn new(charset: &'t CharsetTable, options: DecompileOptions, len: usize) -> Self {
        Self {
            charset,
            limit: options.hex_run_limit.get(),
            // environ trois caractères par octet hex
            out: String::with_capacity(len * 3),
            hex_run: 0,
            string_run: 0,
            unterminated: 0,
        }
    }

    /// Ferme la série ouverte et émet les lignes `SECTION` qui commencent à `at`.
    fn boundary(&mut self, dir: &Directory, at: usize) {
        if self.string_run > 0 {
            // texte qui bute sur une frontière de section sans son NUL
            warn!(offset = at, "string reaches a section boundary without terminator");
            self.unterminated += 1;
            self.out.push_str("\" NO_NUL\n");
        } else if self.hex_run > 0 {
            self.out.push_str("]\n");
        }
        for index in dir.sections_at(at) {
            self.out.push_str("SECTION ");
            self.out.push_str(&index.to_string());
            self.out.push('\n');
        }
        self.hex_run = 0;
        self.string_run = 0;
    }

    fn push_byte(&mut self, b: u8) {
        if self.string_run > 0 || self.hex_run == self.limit {
            if self.string_run == 0 {
                self.out.push_str("] \"");
                self.hex_run = 0;
            }
            if b == 0 {
                self.out.push_str("\"\n");
                self.string_run = 0;
            } else {
                self.charset.push_escaped(&mut self.out, deobfuscate(b));
                self.string_run += 1;
            }
        } else {
            self.out.push(if self.hex_run == 0 { '[' } else { ' ' });
            // écrire dans une String ne peut pas échouer
            let _ = write!(self.out, "{b:02X}");
            self.hex_run += 1;
        }
    }
}
